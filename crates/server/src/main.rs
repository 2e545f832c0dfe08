// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fanping pong daemon (fpd)
//!
//! Listens for harness connections and answers each one.

use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use fp_server::{PongServer, ReplyMode, DEFAULT_LISTEN};

#[derive(Parser)]
#[command(name = "fpd", version, about = "fanping - pong server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value_t = DEFAULT_LISTEN)]
    listen: SocketAddr,

    /// How to answer connections
    #[arg(long, value_enum, default_value_t = Mode::Pong)]
    mode: Mode,

    /// Bytes written on accept in greeting mode
    #[arg(long, default_value = "pong")]
    greeting: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Answer every chunk with PONG
    Pong,
    /// Send the greeting once on accept
    Greeting,
    /// Close the write side on accept
    Hangup,
    /// Reset the connection after the first chunk
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging();

    let mode = match args.mode {
        Mode::Pong => ReplyMode::Pong,
        Mode::Greeting => ReplyMode::Greeting(args.greeting.into_bytes()),
        Mode::Hangup => ReplyMode::Hangup,
        Mode::Reset => ReplyMode::Reset,
    };

    let server = PongServer::bind(args.listen, mode).await?;
    let local_addr = server.local_addr()?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(%local_addr, "server ready");
    // Signal ready for a parent process waiting on startup
    println!("READY");

    tokio::select! {
        () = server.serve() => {}
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    info!("Server stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
