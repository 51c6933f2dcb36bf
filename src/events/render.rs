// src/events/render.rs
//
// One handler per event kind. Payloads are deserialized into small per-kind
// structs; a payload that does not match fails that single event, which the
// pipeline logs and skips.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::events::types::{EventKind, RawEvent};

/// Everything the writer needs for one markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Source event id, part of the output identifier.
    pub id: String,
    pub event_type: &'static str,
    pub avatar_url: String,
    pub actor: String,
    /// Event date, YYYY-MM-DD.
    pub date: String,
    pub repo_name: String,
    /// Primary link for the event (commit, PR, issue, ...).
    pub html_url: String,
    pub repo_url: String,
    pub description: String,
}

/// Render one admitted event. `Ok(None)` means the kind is not supported;
/// unsupported kinds never halt the run.
pub fn render(event: &RawEvent) -> Result<Option<RenderedDocument>> {
    let Some(kind) = EventKind::from_api(&event.kind) else {
        tracing::debug!(kind = %event.kind, id = %event.id, "kind not supported, skipping");
        return Ok(None);
    };

    let (html_url, description) = match kind {
        EventKind::Push => push(event)?,
        EventKind::PullRequest => pull_request(event)?,
        EventKind::Create => create(event)?,
        EventKind::IssueComment => issue_comment(event)?,
        EventKind::Release => release(event)?,
        EventKind::Issues => issues(event)?,
        EventKind::Public => public(event),
        EventKind::PullRequestReviewComment => review_comment(event)?,
        EventKind::PullRequestReview => review(event)?,
        EventKind::Gollum
        | EventKind::Watch
        | EventKind::Fork
        | EventKind::Member
        | EventKind::Delete => return Ok(None),
    };

    Ok(Some(RenderedDocument {
        id: event.id.clone(),
        event_type: kind.as_api(),
        avatar_url: event.actor.avatar_url.clone(),
        actor: event.actor.login.clone(),
        date: event.date(),
        repo_name: event.repo.name.clone(),
        html_url,
        repo_url: repo_url(&event.repo.name),
        description,
    }))
}

pub fn repo_url(repo_name: &str) -> String {
    format!("https://github.com/{repo_name}")
}

fn payload<T: DeserializeOwned>(event: &RawEvent) -> Result<T> {
    serde_json::from_value(event.payload.clone())
        .with_context(|| format!("malformed {} payload for event {}", event.kind, event.id))
}

fn link(url: &str, text: &str) -> String {
    format!("<a href='{url}' target='_blank'>{text}</a>")
}

fn actor_link(login: &str) -> String {
    link(&format!("https://github.com/{login}"), login)
}

/// First line of a possibly multi-line body, HTML-escaped.
fn first_line(body: &str) -> String {
    esc(body.lines().next().unwrap_or(""))
}

fn esc(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(default)]
    commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
struct PushCommit {
    sha: String,
    message: String,
}

fn push(event: &RawEvent) -> Result<(String, String)> {
    let p: PushPayload = payload(event)?;
    let last = p
        .commits
        .last()
        .with_context(|| format!("push event {} carries no commits", event.id))?;

    let repo = repo_url(&event.repo.name);
    let commit_url = format!("{repo}/commit/{}", last.sha);
    let description = format!(
        "{} pushed to {}\n\n<small>{}</small>\n\n{}",
        actor_link(&event.actor.login),
        link(&repo, &event.repo.name),
        esc(&last.message),
        link(&commit_url, "View Commit"),
    );
    Ok((commit_url, description))
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: PullRequestInfo,
}

#[derive(Debug, Deserialize)]
struct PullRequestInfo {
    html_url: String,
    #[serde(default)]
    merged: bool,
}

fn pull_request(event: &RawEvent) -> Result<(String, String)> {
    let p: PullRequestPayload = payload(event)?;
    // The merged flag wins over the literal action; "closed" on a merged PR
    // would under-report it.
    let action = if p.pull_request.merged {
        "merged"
    } else {
        p.action.as_str()
    };

    let repo = repo_url(&event.repo.name);
    let url = p.pull_request.html_url;
    let description = format!(
        "{} {} a pull request to {}\n\n{}",
        actor_link(&event.actor.login),
        action,
        link(&repo, &event.repo.name),
        link(&url, "View Pull Request"),
    );
    Ok((url, description))
}

#[derive(Debug, Deserialize)]
struct CreatePayload {
    ref_type: String,
    /// Null when a repository itself was created.
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

fn create(event: &RawEvent) -> Result<(String, String)> {
    let p: CreatePayload = payload(event)?;
    let created = if p.ref_type == "repository" {
        event.repo.name.clone()
    } else {
        p.git_ref
            .with_context(|| format!("create event {} has no ref", event.id))?
    };

    let repo = repo_url(&event.repo.name);
    let description = format!(
        "{} created a new {}, {} at {}\n\n{}",
        actor_link(&event.actor.login),
        p.ref_type,
        esc(&created),
        link(&repo, &event.repo.name),
        link(&repo, "View Repository"),
    );
    Ok((repo, description))
}

#[derive(Debug, Deserialize)]
struct IssueCommentPayload {
    issue: IssueRef,
    comment: CommentRef,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    html_url: String,
    number: u64,
}

#[derive(Debug, Deserialize)]
struct CommentRef {
    html_url: String,
    body: String,
}

fn issue_comment(event: &RawEvent) -> Result<(String, String)> {
    let p: IssueCommentPayload = payload(event)?;
    let url = p.issue.html_url;
    let description = format!(
        "{} commented on issue {}.\n\n<small>{}...</small>\n\n{}",
        actor_link(&event.actor.login),
        link(&url, &format!("{}#{}", event.repo.name, p.issue.number)),
        first_line(&p.comment.body),
        link(&url, "View Comment"),
    );
    Ok((url, description))
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    release: ReleaseInfo,
}

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    html_url: String,
    tag_name: String,
    body: String,
}

fn release(event: &RawEvent) -> Result<(String, String)> {
    let p: ReleasePayload = payload(event)?;
    let url = p.release.html_url;
    let description = format!(
        "{} released {}.\n\n<small>{}</small>{}",
        actor_link(&event.actor.login),
        link(&url, &p.release.tag_name),
        esc(&p.release.body),
        link(&url, "View Release"),
    );
    Ok((url, description))
}

#[derive(Debug, Deserialize)]
struct IssuesPayload {
    issue: IssueInfo,
}

#[derive(Debug, Deserialize)]
struct IssueInfo {
    html_url: String,
    number: u64,
    state: String,
    title: String,
    /// Issues are routinely filed with an empty body.
    body: Option<String>,
}

fn issues(event: &RawEvent) -> Result<(String, String)> {
    let p: IssuesPayload = payload(event)?;
    let url = p.issue.html_url;
    let description = format!(
        "{} {} issue {}.\n\n<p>{}</p><small>{}...</small>{}",
        actor_link(&event.actor.login),
        p.issue.state,
        link(&url, &format!("{}#{}", event.repo.name, p.issue.number)),
        esc(&p.issue.title),
        first_line(p.issue.body.as_deref().unwrap_or("")),
        link(&url, "View Issue"),
    );
    Ok((url, description))
}

fn public(event: &RawEvent) -> (String, String) {
    let visibility = if event.public { "public" } else { "private" };
    let repo = repo_url(&event.repo.name);
    let description = format!(
        "{} has made {} {}.{}",
        actor_link(&event.actor.login),
        link(&repo, &event.repo.name),
        visibility,
        link(&repo, "View Repository"),
    );
    (repo, description)
}

#[derive(Debug, Deserialize)]
struct ReviewCommentPayload {
    comment: CommentRef,
}

fn review_comment(event: &RawEvent) -> Result<(String, String)> {
    let p: ReviewCommentPayload = payload(event)?;
    let url = p.comment.html_url;
    let repo = repo_url(&event.repo.name);
    let description = format!(
        "{} {} on {}\n\n{}",
        actor_link(&event.actor.login),
        link(&url, "commented"),
        link(&repo, &event.repo.name),
        link(&url, "View Comment"),
    );
    Ok((url, description))
}

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    review: ReviewInfo,
    pull_request: ReviewedPullRequest,
}

#[derive(Debug, Deserialize)]
struct ReviewInfo {
    html_url: String,
    /// Approvals often carry no text at all.
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewedPullRequest {
    html_url: String,
    number: u64,
}

fn review(event: &RawEvent) -> Result<(String, String)> {
    let p: ReviewPayload = payload(event)?;
    let url = p.review.html_url;
    let summary = match p.review.body.as_deref() {
        Some(body) if !body.is_empty() => format!("<small>{}</small>\n\n", first_line(body)),
        _ => String::new(),
    };
    let description = format!(
        "{} reviewed {}.\n\n{}{}",
        actor_link(&event.actor.login),
        link(
            &p.pull_request.html_url,
            &format!("{}#{}", event.repo.name, p.pull_request.number),
        ),
        summary,
        link(&url, "View Review"),
    );
    Ok((url, description))
}
