//! Headless stage runner.
//!
//! Usage: `blockstage <scenario.json>`
//!
//! Loads the scenario, runs it for its tick count, and prints the final
//! snapshot as pretty JSON on stdout. Logs go to stderr; set `RUST_LOG` to
//! change the level (defaults to `info` for the blockstage crates).

use anyhow::Context;
use blockstage_engine::scenario::Scenario;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), anyhow::Error> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("blockstage=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: blockstage <scenario.json>")?;

    info!(%path, "loading scenario");
    let scenario =
        Scenario::from_file(&path).with_context(|| format!("failed to load scenario {path}"))?;

    let stage = scenario.run()?;
    let snapshot = stage.capture_snapshot()?;
    info!(hash = %snapshot.hash, "final state");

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
