// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress output for workers
//!
//! Workers announce each send and each reply through a [`Progress`] sink.
//! The binary prints to stdout; tests record events in memory.

use std::sync::{Arc, Mutex};

/// Receives worker progress notifications
pub trait Progress: Send + Sync + 'static {
    /// Called immediately before the payload is written
    fn sending(&self, worker: usize, payload: &[u8]);

    /// Called with the whole reply buffer, padding included
    fn replied(&self, worker: usize, reply: &[u8]);
}

/// Prints `send: <payload>` and `reply: <buffer>` lines to stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutProgress;

impl Progress for StdoutProgress {
    fn sending(&self, _worker: usize, payload: &[u8]) {
        println!("send: {}", String::from_utf8_lossy(payload));
    }

    fn replied(&self, _worker: usize, reply: &[u8]) {
        println!("reply: {}", String::from_utf8_lossy(reply));
    }
}

/// Recorded progress notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Sending { worker: usize, payload: Vec<u8> },
    Replied { worker: usize, reply: Vec<u8> },
}

/// In-memory progress sink for tests
#[derive(Clone, Default)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn sends(&self) -> Vec<(usize, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Sending { worker, payload } => Some((worker, payload)),
                ProgressEvent::Replied { .. } => None,
            })
            .collect()
    }

    pub fn replies(&self) -> Vec<(usize, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Replied { worker, reply } => Some((worker, reply)),
                ProgressEvent::Sending { .. } => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl Progress for RecordingProgress {
    fn sending(&self, worker: usize, payload: &[u8]) {
        self.push(ProgressEvent::Sending {
            worker,
            payload: payload.to_vec(),
        });
    }

    fn replied(&self, worker: usize, reply: &[u8]) {
        self.push(ProgressEvent::Replied {
            worker,
            reply: reply.to_vec(),
        });
    }
}
