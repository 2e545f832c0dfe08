// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator tests

use super::*;
use crate::progress::RecordingProgress;
use fp_server::{PongServer, ReplyMode, ServerStats};
use std::net::SocketAddr;

async fn start(mode: ReplyMode) -> (SocketAddr, ServerStats) {
    let server = PongServer::bind_loopback(mode).await.unwrap();
    let addr = server.local_addr().unwrap();
    let stats = server.stats();
    tokio::spawn(server.serve());
    (addr, stats)
}

fn closed_endpoint() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn config(endpoint: SocketAddr, step_delay: Duration) -> HarnessConfig {
    HarnessConfig::default()
        .with_endpoint(endpoint)
        .with_step_delay(step_delay)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn runs_every_worker_to_completion() {
    let (addr, stats) = start(ReplyMode::Greeting(b"pong".to_vec())).await;
    let progress = RecordingProgress::new();
    let coordinator = Coordinator::new(config(addr, Duration::from_millis(10)), progress.clone());

    let report = coordinator.run().await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.completion.completed, 5);
    assert_eq!(report.completion.abandoned, 0);
    let ids: Vec<usize> = report.outcomes.iter().map(|o| o.worker).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    for worker in report.reports() {
        assert_eq!(worker.received(), b"pong");
        assert_eq!(worker.reply.len(), 1024);
    }

    assert_eq!(progress.sends().len(), 5);
    assert!(progress.sends().iter().all(|(_, p)| p == b"ping"));
    assert_eq!(progress.replies().len(), 5);

    assert_eq!(stats.accepted(), 5);
    assert!(stats.wait_for_finished(5, Duration::from_secs(5)).await);
    assert!(stats.received().iter().all(|r| r == b"ping"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn workers_run_in_parallel() {
    let (addr, _stats) = start(ReplyMode::Pong).await;
    let step = Duration::from_millis(100);
    let coordinator = Coordinator::new(config(addr, step), RecordingProgress::new());

    let report = coordinator.run().await.unwrap();

    assert!(report.is_success());
    assert!(report.elapsed >= step * 3, "elapsed {:?}", report.elapsed);
    // Serial execution would take 5 * 3 steps
    assert!(report.elapsed < step * 8, "elapsed {:?}", report.elapsed);
}

#[tokio::test]
async fn single_worker_configuration() {
    let (addr, stats) = start(ReplyMode::Pong).await;
    let coordinator = Coordinator::new(
        config(addr, Duration::ZERO).with_worker_count(1),
        RecordingProgress::new(),
    );

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.completion.completed, 1);
    assert_eq!(stats.accepted(), 1);
}

#[tokio::test]
async fn abort_policy_fails_run_on_unreachable_endpoint() {
    let progress = RecordingProgress::new();
    let coordinator = Coordinator::new(
        config(closed_endpoint(), Duration::from_millis(10)),
        progress.clone(),
    );

    let err = coordinator.run().await.unwrap_err();

    match err {
        HarnessError::Worker { source, .. } => {
            assert!(matches!(source, WorkerError::Connect { .. }));
        }
        other => panic!("expected worker failure, got {other:?}"),
    }
    assert!(progress.sends().is_empty(), "no worker may reach send");
}

#[tokio::test]
async fn isolate_policy_collects_every_failure() {
    let progress = RecordingProgress::new();
    let coordinator = Coordinator::new(
        config(closed_endpoint(), Duration::from_millis(10))
            .with_failure_policy(FailurePolicy::Isolate),
        progress.clone(),
    );

    let report = coordinator.run().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures().count(), 5);
    assert_eq!(report.completion.completed, 0);
    assert_eq!(report.completion.abandoned, 5);
    assert!(progress.events().is_empty());
}

/// Greets `pong` on every connection except the first, which is reset on accept
async fn start_with_one_reset() -> SocketAddr {
    let server = PongServer::bind_loopback(ReplyMode::Greeting(b"pong".to_vec()))
        .await
        .unwrap()
        .with_resets_on_accept(1);
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn abort_policy_cancels_running_siblings() {
    let addr = start_with_one_reset().await;
    let step = Duration::from_millis(300);
    let progress = RecordingProgress::new();
    let coordinator = Coordinator::new(config(addr, step), progress.clone());

    let started = Instant::now();
    let err = coordinator.run().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, HarnessError::Worker { .. }), "got {err:?}");
    // The reset connection fails at its first write; siblings are still
    // waiting to read when the run is aborted.
    assert!(elapsed < step * 2, "elapsed {elapsed:?}");
    assert!(progress.replies().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn isolate_policy_keeps_siblings_running() {
    let addr = start_with_one_reset().await;
    let progress = RecordingProgress::new();
    let coordinator = Coordinator::new(
        config(addr, Duration::from_millis(50)).with_failure_policy(FailurePolicy::Isolate),
        progress.clone(),
    );

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.reports().count(), 4);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(
        report.completion,
        CompletionSummary {
            completed: 4,
            abandoned: 1
        }
    );
    assert!(report.reports().all(|r| r.received() == b"pong"));
    assert_eq!(progress.replies().len(), 4);
}
