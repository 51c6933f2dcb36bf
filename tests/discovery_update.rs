// tests/discovery_update.rs
use mockito::Matcher;
use serde_json::json;

use oss_heartbeat::config::DiscoveryConfig;
use oss_heartbeat::discovery::update_users;
use oss_heartbeat::github::GithubClient;

fn config(dir: &std::path::Path, api_base: String) -> DiscoveryConfig {
    DiscoveryConfig {
        users_file: dir.join("users.txt"),
        exclude_users_file: dir.join("exclude-users.txt"),
        orgs_file: dir.join("orgs.txt"),
        query: "location:stanford".into(),
        token: None,
        api_base,
    }
}

#[tokio::test]
async fn discovery_appends_new_users_and_respects_excludes() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("users.txt"), "alice\nbob\n").unwrap();
    std::fs::write(tmp.path().join("exclude-users.txt"), "mallory\n").unwrap();
    std::fs::write(tmp.path().join("orgs.txt"), "acme\nbroken\n").unwrap();

    let mut server = mockito::Server::new_async().await;
    let _search = server
        .mock("GET", "/search/users")
        .match_query(Matcher::UrlEncoded("q".into(), "location:stanford".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"items": [{"login": "mallory"}, {"login": "carol"}]}).to_string())
        .create_async()
        .await;
    let _members = server
        .mock("GET", "/orgs/acme/members")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"login": "alice"}, {"login": "dave"}]).to_string())
        .create_async()
        .await;
    // membership lookups are best-effort; a failing org is skipped
    let _broken = server
        .mock("GET", "/orgs/broken/members")
        .with_status(500)
        .create_async()
        .await;

    let cfg = config(tmp.path(), server.url());
    let client = GithubClient::with_base_url(server.url(), None);
    let added = update_users(&client, &cfg).await.unwrap();

    assert_eq!(added, 2);
    let content = std::fs::read_to_string(tmp.path().join("users.txt")).unwrap();
    assert_eq!(content, "alice\nbob\ncarol\ndave");
}

#[tokio::test]
async fn discovery_starts_from_an_absent_users_file() {
    let tmp = tempfile::tempdir().unwrap();

    let mut server = mockito::Server::new_async().await;
    let _search = server
        .mock("GET", "/search/users")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"items": [{"login": "carol"}]}).to_string())
        .create_async()
        .await;

    let cfg = config(tmp.path(), server.url());
    let client = GithubClient::with_base_url(server.url(), None);
    let added = update_users(&client, &cfg).await.unwrap();

    assert_eq!(added, 1);
    let content = std::fs::read_to_string(tmp.path().join("users.txt")).unwrap();
    assert_eq!(content, "carol");
}

#[tokio::test]
async fn failing_search_fails_the_discovery_run() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("users.txt"), "alice\n").unwrap();

    let mut server = mockito::Server::new_async().await;
    let _search = server
        .mock("GET", "/search/users")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"message": "rate limited"}"#)
        .create_async()
        .await;

    let cfg = config(tmp.path(), server.url());
    let client = GithubClient::with_base_url(server.url(), None);
    assert!(update_users(&client, &cfg).await.is_err());

    // the tracked list is untouched on failure
    let content = std::fs::read_to_string(tmp.path().join("users.txt")).unwrap();
    assert_eq!(content, "alice\n");
}
