// src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::events::types::Subject;

/// All pipeline inputs, resolved once at the process boundary from the
/// action-style `INPUT_*` variables. The core never reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub users_file: PathBuf,
    pub orgs_file: PathBuf,
    pub output_dir: PathBuf,
    /// Comma-separated allow-list of event kinds; empty admits everything.
    pub allowed_kinds: Vec<String>,
    pub token: Option<String>,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Self {
        let workspace = env::var("GITHUB_WORKSPACE").unwrap_or_else(|_| ".".into());
        let collection = env::var("INPUT_COLLECTION").unwrap_or_else(|_| "_events".into());
        Self {
            users_file: env_path("INPUT_USERS_FILE", "users.txt"),
            orgs_file: env_path("INPUT_ORGS_FILE", "orgs.txt"),
            output_dir: Path::new(&workspace).join("docs").join(collection),
            allowed_kinds: parse_kinds(&env::var("INPUT_EVENTS").unwrap_or_default()),
            token: github_token(),
            api_base: api_base(),
        }
    }

    /// Users are a required source, orgs optional. User subjects are
    /// returned first so org-sourced duplicates lose ties downstream.
    pub fn load_subjects(&self) -> Result<Vec<Subject>> {
        if !self.users_file.exists() {
            bail!("users file {} does not exist", self.users_file.display());
        }
        let mut subjects: Vec<Subject> = read_names(&self.users_file)?
            .into_iter()
            .map(Subject::user)
            .collect();
        if self.orgs_file.exists() {
            subjects.extend(read_names(&self.orgs_file)?.into_iter().map(Subject::org));
        }
        Ok(subjects)
    }
}

/// Inputs for the user-discovery binary. Shares only the flat-file layout
/// with the pipeline config.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub users_file: PathBuf,
    pub exclude_users_file: PathBuf,
    pub orgs_file: PathBuf,
    /// See https://github.com/search/advanced for query syntax.
    pub query: String,
    pub token: Option<String>,
    pub api_base: String,
}

impl DiscoveryConfig {
    pub fn from_env() -> Result<Self> {
        let query = env::var("INPUT_QUERY").unwrap_or_default();
        if query.trim().is_empty() {
            bail!("INPUT_QUERY must be set to a user search query");
        }
        Ok(Self {
            users_file: env_path("INPUT_USERS_FILE", "users.txt"),
            exclude_users_file: env_path("INPUT_EXCLUDE_USERS_FILE", "exclude-users.txt"),
            orgs_file: env_path("INPUT_ORGS_FILE", "orgs.txt"),
            query,
            token: github_token(),
            api_base: api_base(),
        })
    }
}

/// One name per line, blank lines ignored.
pub fn read_names(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

fn env_path(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_kinds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn github_token() -> Option<String> {
    env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}

fn api_base() -> String {
    env::var("GITHUB_API_URL").unwrap_or_else(|_| crate::github::DEFAULT_API_BASE.to_string())
}
