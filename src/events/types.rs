// src/events/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A polled account: either an individual user or an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub kind: SubjectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    User,
    Org,
}

impl Subject {
    pub fn user<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            kind: SubjectKind::User,
        }
    }

    pub fn org<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            kind: SubjectKind::Org,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repo {
    /// Full name, e.g. "alice/repo".
    pub name: String,
}

/// One record from the public-events feed. `payload` stays untyped here;
/// the renderer deserializes it per kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: Actor,
    pub repo: Repo,
    #[serde(default)]
    pub public: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RawEvent {
    /// Event date as used in front matter and file stems.
    pub fn date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// The event categories this pipeline understands. Anything else coming out
/// of the API fails to parse and is skipped by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    PullRequest,
    Create,
    IssueComment,
    Release,
    Issues,
    Public,
    PullRequestReviewComment,
    PullRequestReview,
    Gollum,
    Watch,
    Fork,
    Member,
    Delete,
}

impl EventKind {
    pub fn from_api(s: &str) -> Option<Self> {
        Some(match s {
            "PushEvent" => Self::Push,
            "PullRequestEvent" => Self::PullRequest,
            "CreateEvent" => Self::Create,
            "IssueCommentEvent" => Self::IssueComment,
            "ReleaseEvent" => Self::Release,
            "IssuesEvent" => Self::Issues,
            "PublicEvent" => Self::Public,
            "PullRequestReviewCommentEvent" => Self::PullRequestReviewComment,
            "PullRequestReviewEvent" => Self::PullRequestReview,
            "GollumEvent" => Self::Gollum,
            "WatchEvent" => Self::Watch,
            "ForkEvent" => Self::Fork,
            "MemberEvent" => Self::Member,
            "DeleteEvent" => Self::Delete,
            _ => return None,
        })
    }

    pub fn as_api(&self) -> &'static str {
        match self {
            Self::Push => "PushEvent",
            Self::PullRequest => "PullRequestEvent",
            Self::Create => "CreateEvent",
            Self::IssueComment => "IssueCommentEvent",
            Self::Release => "ReleaseEvent",
            Self::Issues => "IssuesEvent",
            Self::Public => "PublicEvent",
            Self::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            Self::PullRequestReview => "PullRequestReviewEvent",
            Self::Gollum => "GollumEvent",
            Self::Watch => "WatchEvent",
            Self::Fork => "ForkEvent",
            Self::Member => "MemberEvent",
            Self::Delete => "DeleteEvent",
        }
    }

    /// Wiki edits, stars, forks, membership churn and branch deletions are
    /// noise for an activity feed.
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            Self::Gollum | Self::Watch | Self::Fork | Self::Member | Self::Delete
        )
    }

    /// Kinds capped at one document per (actor, repo) per run.
    pub fn is_capped(&self) -> bool {
        matches!(self, Self::Push | Self::IssueComment)
    }
}

#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    async fn user_events(&self, user: &str) -> Result<Vec<RawEvent>>;
    async fn org_events(&self, org: &str) -> Result<Vec<RawEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_api_names() {
        for name in [
            "PushEvent",
            "PullRequestEvent",
            "CreateEvent",
            "IssueCommentEvent",
            "ReleaseEvent",
            "IssuesEvent",
            "PublicEvent",
            "PullRequestReviewCommentEvent",
            "PullRequestReviewEvent",
            "GollumEvent",
            "WatchEvent",
            "ForkEvent",
            "MemberEvent",
            "DeleteEvent",
        ] {
            let kind = EventKind::from_api(name).unwrap();
            assert_eq!(kind.as_api(), name);
        }
        assert!(EventKind::from_api("SponsorshipEvent").is_none());
    }

    #[test]
    fn event_date_is_day_precision() {
        let ev: RawEvent = serde_json::from_value(serde_json::json!({
            "id": "1",
            "type": "PushEvent",
            "actor": {"login": "alice", "avatar_url": "https://example.test/a.png"},
            "repo": {"name": "alice/repo"},
            "created_at": "2022-01-01T12:34:56Z",
            "payload": {}
        }))
        .unwrap();
        assert_eq!(ev.date(), "2022-01-01");
    }
}
