// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fp-server: TCP peer for the fanping harness
//!
//! Accepts connections and answers according to a [`ReplyMode`]. Each
//! connection runs on its own task; a failing connection is logged and never
//! stops the listener.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn, Instrument};

/// Bytes written back for every chunk received in [`ReplyMode::Pong`]
pub const PONG: &[u8] = b"PONG";

/// Default listen address: every IPv6 interface, port 8888
pub const DEFAULT_LISTEN: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V6(Ipv6Addr::UNSPECIFIED), 8888);

const READ_CHUNK: usize = 80;

/// How the server answers a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    /// Write [`PONG`] for every chunk received
    Pong,
    /// Write fixed bytes once on accept, then drain input
    Greeting(Vec<u8>),
    /// Shut down the write side on accept, then drain input
    Hangup,
    /// Read one chunk, then reset the connection
    Reset,
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Default)]
struct StatsInner {
    accepted: AtomicUsize,
    received: Mutex<Vec<Vec<u8>>>,
}

/// Counters shared between the server and its observers
#[derive(Clone, Default)]
pub struct ServerStats {
    inner: Arc<StatsInner>,
}

impl ServerStats {
    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.inner.accepted.load(Ordering::Acquire)
    }

    /// Bytes received on each connection that reached EOF, in finish order
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.inner
            .received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Poll until `count` connections have reached EOF or `timeout` passes.
    pub async fn wait_for_finished(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.received().len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn record(&self, received: Vec<u8>) {
        self.inner
            .received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(received);
    }
}

/// Listening pong server
pub struct PongServer {
    listener: TcpListener,
    mode: Arc<ReplyMode>,
    stats: ServerStats,
    resets_on_accept: usize,
}

impl PongServer {
    pub async fn bind(addr: SocketAddr, mode: ReplyMode) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            mode: Arc::new(mode),
            stats: ServerStats::default(),
            resets_on_accept: 0,
        })
    }

    /// Reset the first `count` accepted connections before answering them
    pub fn with_resets_on_accept(mut self, count: usize) -> Self {
        self.resets_on_accept = count;
        self
    }

    /// Bind an ephemeral port on `[::1]`, falling back to `127.0.0.1` on
    /// hosts without IPv6 loopback.
    pub async fn bind_loopback(mode: ReplyMode) -> Result<Self, ServerError> {
        match Self::bind(SocketAddr::from((Ipv6Addr::LOCALHOST, 0)), mode.clone()).await {
            Ok(server) => Ok(server),
            Err(e) => {
                warn!(error = %e, "IPv6 loopback unavailable, using IPv4");
                Self::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), mode).await
            }
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn stats(&self) -> ServerStats {
        self.stats.clone()
    }

    /// Accept connections forever
    pub async fn serve(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let index = self.stats.inner.accepted.fetch_add(1, Ordering::AcqRel);
                    info!(%peer, "accepted connection");

                    if index < self.resets_on_accept {
                        debug!(%peer, "resetting connection on accept");
                        if let Err(e) = reset(stream) {
                            warn!(%peer, error = %e, "reset failed");
                        }
                        continue;
                    }

                    let mode = Arc::clone(&self.mode);
                    let stats = self.stats.clone();
                    let span = tracing::info_span!("connection", %peer);
                    tokio::spawn(
                        async move {
                            match handle_connection(stream, &mode).await {
                                Ok(received) => {
                                    debug!(bytes = received.len(), "client closed connection");
                                    stats.record(received);
                                }
                                Err(e) => warn!(error = %e, "connection failed"),
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => warn!(error = %e, "error accepting connection"),
            }
        }
    }
}

/// Serve one connection until the peer closes it, returning every byte read
async fn handle_connection(
    mut stream: TcpStream,
    mode: &ReplyMode,
) -> Result<Vec<u8>, ServerError> {
    match mode {
        ReplyMode::Pong => {}
        ReplyMode::Greeting(bytes) => stream.write_all(bytes).await?,
        ReplyMode::Hangup => stream.shutdown().await?,
        ReplyMode::Reset => {}
    }

    let mut received = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(received);
        }
        debug!(bytes = n, "received data");
        received.extend_from_slice(&chunk[..n]);

        match mode {
            ReplyMode::Pong => stream.write_all(PONG).await?,
            ReplyMode::Reset => {
                reset(stream)?;
                return Ok(received);
            }
            ReplyMode::Greeting(_) | ReplyMode::Hangup => {}
        }
    }
}

/// Close with a zero linger so the peer sees RST instead of FIN
fn reset(stream: TcpStream) -> Result<(), ServerError> {
    socket2::SockRef::from(&stream).set_linger(Some(Duration::ZERO))?;
    drop(stream);
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
