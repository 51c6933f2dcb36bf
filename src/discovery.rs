// src/discovery.rs
//
// Username discovery: grows the tracked users file from a search query and
// org memberships. Decoupled from the event pipeline; only the flat-file
// format is shared.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{read_names, DiscoveryConfig};
use crate::github::GithubClient;

/// Gather candidate logins. The search query is the essential source and
/// fails the run; org membership lookups are best-effort per org.
pub async fn discover_candidates(
    client: &GithubClient,
    query: &str,
    orgs: &[String],
) -> Result<Vec<String>> {
    let mut candidates = client
        .search_users(query)
        .await
        .context("searching users")?;
    info!(count = candidates.len(), "user search complete");

    for org in orgs {
        match client.org_members(org).await {
            Ok(members) => {
                info!(org = %org, count = members.len(), "fetched org members");
                candidates.extend(members);
            }
            Err(e) => warn!(error = ?e, org = %org, "skipping org membership lookup"),
        }
    }

    Ok(candidates)
}

/// Merge candidates into the tracked list: existing order is preserved,
/// genuinely new logins are appended, excluded ones never come back.
pub fn merge_users(
    existing: &[String],
    excluded: &[String],
    candidates: Vec<String>,
) -> (Vec<String>, usize) {
    let mut known: HashSet<String> = existing.iter().cloned().collect();
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();

    let mut merged = existing.to_vec();
    let mut added = 0usize;
    for candidate in candidates {
        if excluded.contains(candidate.as_str()) || known.contains(&candidate) {
            continue;
        }
        known.insert(candidate.clone());
        merged.push(candidate);
        added += 1;
    }
    (merged, added)
}

/// One discovery pass: read the list files, query, rewrite the users file.
/// Returns how many new users were found.
pub async fn update_users(client: &GithubClient, cfg: &DiscoveryConfig) -> Result<usize> {
    let existing = read_names_or_empty(&cfg.users_file)?;
    let excluded = read_names_or_empty(&cfg.exclude_users_file)?;
    let orgs = read_names_or_empty(&cfg.orgs_file)?;

    let candidates = discover_candidates(client, &cfg.query, &orgs).await?;
    let (merged, added) = merge_users(&existing, &excluded, candidates);

    fs::write(&cfg.users_file, merged.join("\n"))
        .with_context(|| format!("writing {}", cfg.users_file.display()))?;
    info!(added, total = merged.len(), "updated users file");
    Ok(added)
}

fn read_names_or_empty(path: &Path) -> Result<Vec<String>> {
    if path.exists() {
        read_names(path)
    } else {
        Ok(Vec::new())
    }
}
