// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use assert_cmd::Command;
use fp_server::{PongServer, ReplyMode, ServerStats};

/// Pong server running on its own runtime for the lifetime of the guard.
pub struct TestServer {
    pub addr: SocketAddr,
    pub stats: ServerStats,
    // Dropping the runtime stops the server
    runtime: tokio::runtime::Runtime,
}

impl TestServer {
    pub fn start(mode: ReplyMode) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let server = runtime
            .block_on(PongServer::bind_loopback(mode))
            .expect("Failed to bind test server");
        let addr = server.local_addr().expect("Failed to read server address");
        let stats = server.stats();
        runtime.spawn(server.serve());

        Self {
            addr,
            stats,
            runtime,
        }
    }

    /// Block until `count` connections have closed, or five seconds pass.
    pub fn wait_for_finished(&self, count: usize) -> bool {
        self.runtime
            .block_on(self.stats.wait_for_finished(count, Duration::from_secs(5)))
    }
}

/// An address nothing listens on
pub fn closed_endpoint() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("Failed to read address")
}

/// `fp` command with a short step delay
pub fn fp(endpoint: SocketAddr) -> Command {
    let mut cmd = Command::cargo_bin("fp").expect("fp binary not built");
    cmd.args(["--endpoint", &endpoint.to_string(), "--step-delay", "10ms"]);
    cmd
}

/// Count stdout lines starting with `prefix`
pub fn count_lines(stdout: &[u8], prefix: &str) -> usize {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| line.starts_with(prefix))
        .count()
}
