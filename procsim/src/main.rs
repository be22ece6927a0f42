/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use procsim::config::SimulationConfig;
use procsim::dispatch::PolicySpec;
use procsim::system::ProcessingSystem;

// ── CLI argument definition ───────────────────────────────────────────────────

/// CPU scheduling simulator.
///
/// Example:
///   procsim -n 4 --policy fifo,spn,src,rr:2 --clock-period-ms 10 --seed 7
#[derive(Debug, Parser)]
#[command(
    name = "procsim",
    about = "Multi-processor CPU scheduling simulator",
    long_about = None,
)]
struct Cli {
    /// Path to a YAML simulation configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Number of simulated processors.
    #[arg(short = 'n', long = "processors")]
    processors: Option<usize>,

    /// Dispatch policies (fifo, spn, src, rr:<quantum>), reused cyclically.
    #[arg(short = 'p', long = "policy", value_delimiter = ',')]
    policies: Vec<PolicySpec>,

    /// Pacing delay per clock cycle in milliseconds (0 disables pacing).
    #[arg(long = "clock-period-ms")]
    clock_period_ms: Option<u64>,

    /// Seed for the workload generator.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Run all processors in lock-step on one thread, without pacing.
    #[arg(long = "lockstep", default_value_t = false)]
    lockstep: bool,

    /// Write the final statistics as YAML to this path.
    #[arg(short = 'r', long = "report")]
    report: Option<PathBuf>,
}

impl Cli {
    /// File (or default) configuration with command-line overrides applied.
    fn resolve_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load_from_file(path)?,
            None => SimulationConfig::default(),
        };

        if !self.policies.is_empty() {
            config.policies = self.policies.clone();
            config.processors = self.policies.len();
        }
        if let Some(n) = self.processors {
            config.processors = n;
        }
        if let Some(ms) = self.clock_period_ms {
            config.clock_period = Duration::from_millis(ms);
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Simulation failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;

    info!(
        processors      = config.processors,
        policies        = ?config.policies,
        clock_period_ms = config.clock_period.as_millis() as u64,
        batch_size      = config.batch_size,
        seed            = ?config.seed,
        lockstep        = cli.lockstep,
        "Configuration"
    );

    let mut system = ProcessingSystem::from_config(&config)?;

    let stats = if cli.lockstep {
        system.simulate_lockstep()?
    } else {
        system.simulate().await?
    };

    println!("{stats}");

    if let Some(path) = &cli.report {
        let yaml = serde_yaml::to_string(&stats).context("Failed to serialise statistics")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write report: {}", path.display()))?;
        info!("Report written to: {}", path.display());
    }

    Ok(())
}
