// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fp - fanping connection harness
//!
//! Opens concurrent connections to one endpoint, sends `ping` over each,
//! reads one reply buffer and closes. With no arguments it dials `[::1]:8888`
//! with five workers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use fp_core::{Coordinator, FailurePolicy, HarnessConfig, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "fp",
    version,
    about = "fanping - concurrent TCP connection harness"
)]
struct Cli {
    /// TOML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address every worker dials
    #[arg(long)]
    endpoint: Option<SocketAddr>,

    /// Number of concurrent connections
    #[arg(long)]
    workers: Option<usize>,

    /// Reply buffer size in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Pause between steps (e.g. "1s", "250ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    step_delay: Option<Duration>,

    /// Keep other workers running when one fails
    #[arg(long)]
    isolate_failures: bool,
}

impl Cli {
    fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(workers) = self.workers {
            config = config.with_worker_count(workers);
        }
        if let Some(buffer_size) = self.buffer_size {
            config = config.with_buffer_size(buffer_size);
        }
        if let Some(step_delay) = self.step_delay {
            config = config.with_step_delay(step_delay);
        }
        if self.isolate_failures {
            config = config.with_failure_policy(FailurePolicy::Isolate);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = cli.harness_config()?;
    let worker_count = config.worker_count;

    let report = Coordinator::new(config, StdoutProgress).run().await?;

    let failed = report.failures().count();
    if failed > 0 {
        for (worker, e) in report.failures() {
            error!(worker, error = %e, "worker failed");
        }
        anyhow::bail!("{} of {} workers failed", failed, worker_count);
    }

    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the progress lines only
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
