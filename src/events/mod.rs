// src/events/mod.rs
pub mod render;
pub mod types;
pub mod writer;

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use self::render::render;
use self::types::{EventKind, EventSource, RawEvent, Subject, SubjectKind};
use self::writer::{EventWriter, WriteOutcome};

/// Per-run record of which (actor, kind, repo) triples already produced a
/// document, for the capped kinds. Owned by the caller, never ambient.
#[derive(Debug, Default)]
pub struct SeenState {
    seen: HashMap<(String, EventKind), HashSet<String>>,
}

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the triple; returns false when it was already present.
    pub fn record(&mut self, actor: &str, kind: EventKind, repo: &str) -> bool {
        self.seen
            .entry((actor.to_string(), kind))
            .or_default()
            .insert(repo.to_string())
    }
}

/// Why an event did or did not survive the filter. Rejections are
/// sentinels, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Kind is in the ignored set.
    Ignored,
    /// An allow-list is configured and this kind is not in it.
    NotAllowed,
    /// Same actor already contributed this capped kind for this repo.
    RepeatForRepo,
    /// Push with no commits (merge or empty push).
    EmptyPush,
}

/// Admission filter, evaluated per event in received order. The acting user
/// is the event's own actor, not the polled subject, so org-sourced events
/// dedup against the author's direct activity.
pub fn admit(event: &RawEvent, allowed_kinds: &[String], seen: &mut SeenState) -> Admission {
    let kind = EventKind::from_api(&event.kind);

    if kind.is_some_and(|k| k.is_ignored()) {
        return Admission::Ignored;
    }
    if !allowed_kinds.is_empty() && !allowed_kinds.iter().any(|k| k == &event.kind) {
        return Admission::NotAllowed;
    }
    if let Some(capped) = kind.filter(|k| k.is_capped()) {
        if !seen.record(&event.actor.login, capped, &event.repo.name) {
            return Admission::RepeatForRepo;
        }
    }
    if kind == Some(EventKind::Push) && !has_commits(event) {
        return Admission::EmptyPush;
    }
    Admission::Admitted
}

fn has_commits(event: &RawEvent) -> bool {
    event
        .payload
        .get("commits")
        .and_then(|c| c.as_array())
        .is_some_and(|a| !a.is_empty())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub subjects: usize,
    pub fetched: usize,
    pub filtered: usize,
    pub unsupported: usize,
    pub render_failed: usize,
    pub written: usize,
    pub duplicates: usize,
    pub write_failed: usize,
}

/// Fetch every subject's feed, users first. A user fetch error aborts the
/// run; an org fetch error only costs that org's contribution.
pub async fn fetch_all(
    source: &dyn EventSource,
    subjects: &[Subject],
) -> Result<Vec<(Subject, Vec<RawEvent>)>> {
    let mut out = Vec::with_capacity(subjects.len());

    for subject in subjects.iter().filter(|s| s.kind == SubjectKind::User) {
        let events = source
            .user_events(&subject.name)
            .await
            .with_context(|| format!("fetching events for user {}", subject.name))?;
        info!(user = %subject.name, count = events.len(), "fetched user events");
        out.push((subject.clone(), events));
    }

    for subject in subjects.iter().filter(|s| s.kind == SubjectKind::Org) {
        match source.org_events(&subject.name).await {
            Ok(events) => {
                info!(org = %subject.name, count = events.len(), "fetched org events");
                out.push((subject.clone(), events));
            }
            Err(e) => warn!(error = ?e, org = %subject.name, "skipping org after fetch error"),
        }
    }

    Ok(out)
}

/// Filter, render and write one run's worth of events, sequentially.
pub fn process_events(
    fetched: &[(Subject, Vec<RawEvent>)],
    allowed_kinds: &[String],
    writer: &mut EventWriter,
) -> RunStats {
    let mut stats = RunStats {
        subjects: fetched.len(),
        ..Default::default()
    };
    let mut seen = SeenState::new();

    for (subject, events) in fetched {
        debug!(subject = %subject.name, count = events.len(), "processing subject");
        for event in events {
            stats.fetched += 1;

            match admit(event, allowed_kinds, &mut seen) {
                Admission::Admitted => {}
                reason => {
                    debug!(?reason, id = %event.id, kind = %event.kind, "event filtered");
                    stats.filtered += 1;
                    continue;
                }
            }

            let doc = match render(event) {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    stats.unsupported += 1;
                    continue;
                }
                Err(e) => {
                    warn!(error = ?e, id = %event.id, "failed to render event");
                    stats.render_failed += 1;
                    continue;
                }
            };

            match writer.write(&doc) {
                Ok(WriteOutcome::Written(path)) => {
                    info!(path = %path.display(), "wrote event");
                    stats.written += 1;
                }
                Ok(WriteOutcome::Duplicate) => stats.duplicates += 1,
                Err(e) => {
                    warn!(error = ?e, id = %event.id, "failed to write event");
                    stats.write_failed += 1;
                }
            }
        }
    }

    stats
}

/// One full pipeline pass: fetch, filter, render, write.
pub async fn run_once(
    source: &dyn EventSource,
    subjects: &[Subject],
    allowed_kinds: &[String],
    writer: &mut EventWriter,
) -> Result<RunStats> {
    let fetched = fetch_all(source, subjects).await?;
    let stats = process_events(&fetched, allowed_kinds, writer);
    info!(
        subjects = stats.subjects,
        fetched = stats.fetched,
        written = stats.written,
        filtered = stats.filtered,
        unsupported = stats.unsupported,
        "run complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(actor: &str, repo: &str, kind: &str, payload: serde_json::Value) -> RawEvent {
        serde_json::from_value(json!({
            "id": "1",
            "type": kind,
            "actor": {"login": actor, "avatar_url": ""},
            "repo": {"name": repo},
            "created_at": "2022-01-01T00:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    fn push(actor: &str, repo: &str) -> RawEvent {
        event(
            actor,
            repo,
            "PushEvent",
            json!({"commits": [{"sha": "abc", "message": "m"}]}),
        )
    }

    #[test]
    fn ignored_kinds_never_pass() {
        let mut seen = SeenState::new();
        for kind in [
            "GollumEvent",
            "WatchEvent",
            "ForkEvent",
            "MemberEvent",
            "DeleteEvent",
        ] {
            let ev = event("alice", "alice/repo", kind, json!({}));
            assert_eq!(admit(&ev, &[], &mut seen), Admission::Ignored);
        }
    }

    #[test]
    fn allow_list_restricts_kinds() {
        let mut seen = SeenState::new();
        let allowed = vec!["ReleaseEvent".to_string()];
        let ev = push("alice", "alice/repo");
        assert_eq!(admit(&ev, &allowed, &mut seen), Admission::NotAllowed);
        let rel = event("alice", "alice/repo", "ReleaseEvent", json!({}));
        assert_eq!(admit(&rel, &allowed, &mut seen), Admission::Admitted);
    }

    #[test]
    fn capped_kind_admits_once_per_actor_and_repo() {
        let mut seen = SeenState::new();
        assert_eq!(admit(&push("alice", "alice/a"), &[], &mut seen), Admission::Admitted);
        assert_eq!(
            admit(&push("alice", "alice/a"), &[], &mut seen),
            Admission::RepeatForRepo
        );
        // another repo or another actor is a fresh slot
        assert_eq!(admit(&push("alice", "alice/b"), &[], &mut seen), Admission::Admitted);
        assert_eq!(admit(&push("bob", "alice/a"), &[], &mut seen), Admission::Admitted);
    }

    #[test]
    fn cap_keys_on_actor_not_subject() {
        // Same author surfacing through a user feed and an org feed: the
        // second occurrence loses, whatever subject carried it.
        let mut seen = SeenState::new();
        assert_eq!(admit(&push("alice", "org/tool"), &[], &mut seen), Admission::Admitted);
        assert_eq!(
            admit(&push("alice", "org/tool"), &[], &mut seen),
            Admission::RepeatForRepo
        );
    }

    #[test]
    fn empty_push_is_rejected() {
        let mut seen = SeenState::new();
        let no_commits = event("alice", "alice/repo", "PushEvent", json!({"commits": []}));
        assert_eq!(admit(&no_commits, &[], &mut seen), Admission::EmptyPush);
        let missing = event("alice", "alice/repo", "PushEvent", json!({}));
        assert_eq!(admit(&missing, &[], &mut seen), Admission::EmptyPush);
    }

    #[test]
    fn unknown_kind_passes_filter_for_renderer_to_judge() {
        let mut seen = SeenState::new();
        let ev = event("alice", "alice/repo", "SponsorshipEvent", json!({}));
        assert_eq!(admit(&ev, &[], &mut seen), Admission::Admitted);
    }
}
