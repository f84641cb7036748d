use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use agri_engine::{AgriEngine, EngineConfig};
use agri_model::ModelRegistry;
use agri_types::OptimizationRequestWire;
use anyhow::Context;

/// Usage: `agri-optimize [request.json]`. Reads the request from stdin when
/// no path is given and prints the recommendation as JSON on stdout.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let input = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading request from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading request from stdin")?;
            buffer
        }
    };

    let request: OptimizationRequestWire =
        serde_json::from_str(&input).context("parsing optimization request")?;

    let config = EngineConfig::from_env().context("loading engine config")?;
    let engine = AgriEngine::new(config, Arc::new(ModelRegistry::new()))?;
    let response = engine.optimize_wire(request)?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
