//! `statrun <request.json>`: run one record and print it back populated.
//!
//! `STATRUN_CONFIG` points at a YAML engine config and
//! `STATRUN_RESULTS_ROOT` overrides its results root.
use anyhow::{Context, Result};
use statrun::{EngineConfig, Record};

fn config_from_env() -> Result<EngineConfig> {
    let mut config = match std::env::var("STATRUN_CONFIG") {
        Ok(path) => EngineConfig::load(&path)?,
        Err(_) => EngineConfig::default(),
    };
    if let Ok(root) = std::env::var("STATRUN_RESULTS_ROOT") {
        config = config.with_results_root(root);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    statrun::init_tracing();

    let path = std::env::args()
        .nth(1)
        .context("usage: statrun <request.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let mut record = Record::from_json(&raw)?;

    let orchestrator = statrun::default_orchestrator(config_from_env()?);
    let saved = orchestrator.handle(&mut record).await?;
    tracing::info!(snapshot = %saved.snapshot.display(), "done");

    println!("{}", record.to_json_pretty()?);
    Ok(())
}
