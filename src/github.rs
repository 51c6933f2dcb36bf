// src/github.rs
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::events::types::{EventSource, RawEvent};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

// GitHub rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("oss-heartbeat/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over one `reqwest::Client` for the handful of REST calls
/// this crate makes. Unauthenticated use is allowed (reduced rate limits).
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, token)
    }

    /// Base URL override, used by tests against a local server.
    pub fn with_base_url<S: Into<String>>(base_url: S, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .get(&url)
            .query(query)
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            req = req.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }

        let resp = req.send().await.with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            bail!("GET {url} returned {status}: {}", snippet(&body));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("decoding response from {url}"))
    }

    /// `GET /search/users?q=<query>`: logins matching a search query.
    pub async fn search_users(&self, query: &str) -> Result<Vec<String>> {
        let found: SearchUsers = self.get_json("/search/users", &[("q", query)]).await?;
        Ok(found.items.into_iter().map(|i| i.login).collect())
    }

    /// `GET /orgs/{org}/members`: public member logins of an organization.
    pub async fn org_members(&self, org: &str) -> Result<Vec<String>> {
        let members: Vec<Login> = self.get_json(&format!("/orgs/{org}/members"), &[]).await?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }
}

#[async_trait::async_trait]
impl EventSource for GithubClient {
    async fn user_events(&self, user: &str) -> Result<Vec<RawEvent>> {
        self.get_json(&format!("/users/{user}/events/public"), &[])
            .await
    }

    async fn org_events(&self, org: &str) -> Result<Vec<RawEvent>> {
        self.get_json(&format!("/orgs/{org}/events"), &[]).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchUsers {
    #[serde(default)]
    items: Vec<Login>,
}

#[derive(Debug, Deserialize)]
struct Login {
    login: String,
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
