// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for workers and the coordinator

use std::net::SocketAddr;

use thiserror::Error;

/// I/O failure inside a single connection worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: SocketAddr,
        source: std::io::Error,
    },
    #[error("failed to send payload: {0}")]
    Send(#[source] std::io::Error),
    #[error("failed to read reply: {0}")]
    Receive(#[source] std::io::Error),
}

impl WorkerError {
    /// Underlying I/O error kind
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            WorkerError::Connect { source, .. } => source.kind(),
            WorkerError::Send(e) | WorkerError::Receive(e) => e.kind(),
        }
    }
}

/// Errors that end a harness run
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("worker {worker} failed: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: WorkerError,
    },
    #[error("worker task did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),
}
