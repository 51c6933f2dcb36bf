//! Discovery binary: finds new GitHub usernames via search and org
//! membership and appends them to the tracked users file.

use anyhow::Result;

use oss_heartbeat::config::DiscoveryConfig;
use oss_heartbeat::discovery::update_users;
use oss_heartbeat::github::GithubClient;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = DiscoveryConfig::from_env()?;
    let client = GithubClient::with_base_url(cfg.api_base.clone(), cfg.token.clone());

    let added = update_users(&client, &cfg).await?;
    println!("Found {added} new users!");
    Ok(())
}
