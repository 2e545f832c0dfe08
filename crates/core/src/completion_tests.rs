// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn wait_returns_immediately_when_empty() {
    let group = CompletionGroup::new();
    let summary = group.wait().await;
    assert_eq!(summary, CompletionSummary::default());
}

#[tokio::test]
async fn wait_blocks_until_every_token_completes() {
    let group = CompletionGroup::new();
    let first = group.register();
    let second = group.register();
    assert_eq!(group.outstanding(), 2);

    first.complete();
    let pending = tokio::time::timeout(Duration::from_millis(50), group.wait()).await;
    assert!(pending.is_err(), "wait returned with a token outstanding");

    second.complete();
    let summary = group.wait().await;
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.abandoned, 0);
}

#[tokio::test]
async fn dropped_token_counts_as_abandoned() {
    let group = CompletionGroup::new();
    let token = group.register();
    drop(token);

    let summary = group.wait().await;
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.abandoned, 1);
    assert_eq!(group.outstanding(), 0);
}

#[tokio::test]
async fn waiter_is_woken_by_release_from_another_task() {
    let group = CompletionGroup::new();
    let token = group.register();

    let waiter = tokio::spawn({
        let group = group.clone();
        async move { group.wait().await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.complete();

    let summary = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter hung")
        .unwrap();
    assert_eq!(summary.completed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_releases_reach_zero() {
    let group = CompletionGroup::new();
    let mut handles = Vec::new();

    for i in 0..64 {
        let token = group.register();
        handles.push(tokio::spawn(async move {
            tokio::task::yield_now().await;
            if i % 4 == 0 {
                drop(token);
            } else {
                token.complete();
            }
        }));
    }

    let summary = tokio::time::timeout(Duration::from_secs(5), group.wait())
        .await
        .expect("wait hung");
    assert_eq!(summary.completed + summary.abandoned, 64);
    assert_eq!(summary.abandoned, 16);

    for handle in handles {
        handle.await.unwrap();
    }
}
