//! `ipala-sim`: replay a scenario file and print the result as JSON.

use std::io;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use ipala_keeper::KeeperConfig;
use ipala_sim::{run, RunOptions, SimConfig};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ipala-sim")]
#[command(about = "Replay IPALA claim blocks", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (TOML)
    #[arg(env = "IPALA_SCENARIO")]
    scenario: PathBuf,

    /// Keeper config file, replaces the scenario's [keeper] table
    #[arg(short, long, env = "IPALA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "IPALA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "IPALA_LOG_JSON")]
    json: bool,

    /// Skip invariant checks after each block
    #[arg(long)]
    no_invariants: bool,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }

    let mut scenario = SimConfig::load(&cli.scenario)?;
    if let Some(path) = &cli.config {
        scenario.keeper = KeeperConfig::load(path)
            .with_context(|| format!("loading keeper config {}", path.display()))?;
    }

    info!(
        scenario = %cli.scenario.display(),
        blocks = scenario.blocks.len(),
        module = %scenario.keeper.module_name,
        "Replaying scenario"
    );

    let report = run(
        &scenario,
        RunOptions {
            check_invariants: !cli.no_invariants,
        },
    )?;

    let out = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");

    info!(digest = %report.state_digest, "Replay finished");
    Ok(())
}
