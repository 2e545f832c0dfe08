// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection worker
//!
//! A worker drives one TCP connection through a fixed sequence:
//! connect, pause, send, pause, receive, pause, signal completion, close.
//! The pauses only suspend the worker's own task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::completion::CompletionToken;
use crate::config::{HarnessConfig, PAYLOAD};
use crate::error::WorkerError;
use crate::progress::Progress;

/// Result of one successful connection sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub bytes_sent: usize,
    /// Bytes the single read actually returned
    pub bytes_received: usize,
    /// Whole receive buffer; bytes past `bytes_received` are zero
    pub reply: Vec<u8>,
}

impl WorkerReport {
    /// The bytes the peer actually sent
    pub fn received(&self) -> &[u8] {
        &self.reply[..self.bytes_received]
    }
}

/// Drives a single connection against the configured endpoint
pub struct Worker<P> {
    id: usize,
    endpoint: SocketAddr,
    buffer_size: usize,
    step_delay: Duration,
    progress: Arc<P>,
}

impl<P: Progress> Worker<P> {
    pub fn new(id: usize, config: &HarnessConfig, progress: Arc<P>) -> Self {
        Self {
            id,
            endpoint: config.endpoint,
            buffer_size: config.buffer_size,
            step_delay: config.step_delay,
            progress,
        }
    }

    /// Run the full sequence, consuming the completion token.
    ///
    /// The token is completed only when every step succeeded. On error it is
    /// dropped, which releases it as abandoned.
    pub async fn run(self, token: CompletionToken) -> Result<WorkerReport, WorkerError> {
        let span = tracing::info_span!("worker", id = self.id, endpoint = %self.endpoint);
        self.sequence(token).instrument(span).await
    }

    async fn sequence(self, token: CompletionToken) -> Result<WorkerReport, WorkerError> {
        let mut stream = TcpStream::connect(self.endpoint)
            .await
            .map_err(|source| WorkerError::Connect {
                endpoint: self.endpoint,
                source,
            })?;
        tracing::debug!("connected");

        tokio::time::sleep(self.step_delay).await;
        self.progress.sending(self.id, PAYLOAD);
        stream.write_all(PAYLOAD).await.map_err(WorkerError::Send)?;
        tracing::debug!(bytes = PAYLOAD.len(), "sent");

        tokio::time::sleep(self.step_delay).await;
        let mut reply = vec![0u8; self.buffer_size];
        // Single bounded read; 0 means the peer closed without replying.
        let bytes_received = stream.read(&mut reply).await.map_err(WorkerError::Receive)?;
        tracing::debug!(bytes_received, "received");
        self.progress.replied(self.id, &reply);

        tokio::time::sleep(self.step_delay).await;
        token.complete();

        if let Err(e) = stream.shutdown().await {
            tracing::debug!(error = %e, "close failed");
        }
        drop(stream);
        tracing::info!(bytes_received, "worker finished");

        Ok(WorkerReport {
            worker: self.id,
            bytes_sent: PAYLOAD.len(),
            bytes_received,
            reply,
        })
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
