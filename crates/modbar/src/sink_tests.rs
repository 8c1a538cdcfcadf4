// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[test]
fn starts_with_no_current_value() {
    let sink: Sink<i32> = Sink::new();
    assert_eq!(sink.current(), None);
}

#[test]
fn emit_updates_current() {
    let sink = Sink::new();
    sink.emit(1);
    sink.emit(2);
    assert_eq!(sink.current(), Some(2));
}

#[tokio::test]
async fn changed_resolves_once_subscribed_and_then_emitted() {
    let sink = Sink::new();
    let mut watcher = sink.subscribe();
    sink.emit("a".to_owned());
    let v = tokio::time::timeout(Duration::from_millis(10), watcher.changed()).await.unwrap();
    assert_eq!(v, Some("a".to_owned()));
}

#[tokio::test]
async fn changed_blocks_until_the_next_emission() {
    let sink: Sink<i32> = Sink::new();
    let mut watcher = sink.subscribe();
    // Nothing emitted yet, and the initial `None` isn't itself a "change".
    assert!(tokio::time::timeout(Duration::from_millis(10), watcher.changed()).await.is_err());
    sink.emit(7);
    let v = tokio::time::timeout(Duration::from_millis(10), watcher.changed()).await.unwrap();
    assert_eq!(v, Some(7));
}

#[tokio::test]
async fn independent_subscribers_each_see_every_change() {
    let sink = Sink::new();
    let mut a = sink.subscribe();
    let mut b = sink.subscribe();
    sink.emit(1);
    assert_eq!(a.changed().await, Some(1));
    sink.emit(2);
    assert_eq!(b.changed().await, Some(2));
    assert_eq!(a.changed().await, Some(2));
}
