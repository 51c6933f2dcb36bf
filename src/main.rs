//! Event pipeline binary: polls public events for the tracked users and
//! orgs and renders one markdown file per admitted event.
//!
//! Configuration comes from action-style `INPUT_*` environment variables;
//! see `Config::from_env`.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oss_heartbeat::config::Config;
use oss_heartbeat::events::{run_once, writer::EventWriter};
use oss_heartbeat::github::GithubClient;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in CI.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env();
    let subjects = cfg.load_subjects()?;
    tracing::info!(
        subjects = subjects.len(),
        output_dir = %cfg.output_dir.display(),
        "starting event run"
    );

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;

    let client = GithubClient::with_base_url(cfg.api_base.clone(), cfg.token.clone());
    let mut writer = EventWriter::new(cfg.output_dir.clone());
    run_once(&client, &subjects, &cfg.allowed_kinds, &mut writer).await?;

    Ok(())
}
