// src/events/writer.rs
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::events::render::RenderedDocument;

/// Output identifier: a pure function of date, repo, kind and event id.
pub fn file_stem(doc: &RenderedDocument) -> String {
    format!(
        "{}-{}-{}-{}",
        doc.date,
        doc.repo_name.replace('/', "-"),
        doc.event_type,
        doc.id
    )
}

/// Front-matter block plus description body. Key order is part of the
/// output contract consumed by the site generator.
pub fn to_markdown(doc: &RenderedDocument) -> String {
    let mut content = String::from("---\n");
    content.push_str(&format!("event_type: {}\n", doc.event_type));
    content.push_str(&format!("avatar: \"{}\"\n", doc.avatar_url));
    content.push_str(&format!("user: {}\n", doc.actor));
    content.push_str(&format!("date: {}\n", doc.date));
    content.push_str(&format!("repo_name: {}\n", doc.repo_name));
    content.push_str(&format!("html_url: {}\n", doc.html_url));
    content.push_str(&format!("repo_url: {}\n", doc.repo_url));
    content.push_str("---\n\n");
    content.push_str(&doc.description);
    content.push('\n');
    content
}

#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// This identifier was already emitted in the current run.
    Duplicate,
}

/// Writes rendered documents into one collection directory, remembering the
/// identifiers emitted so far in this run. State lives only for one run.
pub struct EventWriter {
    out_dir: PathBuf,
    emitted: HashSet<String>,
}

impl EventWriter {
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
            emitted: HashSet::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn write(&mut self, doc: &RenderedDocument) -> Result<WriteOutcome> {
        let stem = file_stem(doc);
        if self.emitted.contains(&stem) {
            return Ok(WriteOutcome::Duplicate);
        }
        let path = self.out_dir.join(format!("{stem}.md"));
        fs::write(&path, to_markdown(doc))
            .with_context(|| format!("writing {}", path.display()))?;
        self.emitted.insert(stem);
        Ok(WriteOutcome::Written(path))
    }
}
