// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fp-core: concurrent TCP connection harness
//!
//! This crate provides:
//! - A connection worker that drives one connect/send/receive/close sequence
//! - A completion group for waiting on concurrently running workers
//! - A coordinator that fans workers out and applies the failure policy
//! - TOML-backed configuration with the fixed harness defaults

pub mod completion;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod progress;
pub mod worker;

pub use completion::{CompletionGroup, CompletionSummary, CompletionToken};
pub use config::{ConfigError, FailurePolicy, HarnessConfig, PAYLOAD};
pub use coordinator::{Coordinator, RunReport, WorkerOutcome};
pub use error::{HarnessError, WorkerError};
pub use progress::{Progress, ProgressEvent, RecordingProgress, StdoutProgress};
pub use worker::{Worker, WorkerReport};
