// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[tokio::test]
async fn at_fires_exactly_once_at_the_target_instant() {
    let timing = Timing::new_for_test();
    let mut sched = timing.scheduler();
    let start = timing.now();
    sched.at(start + Duration::from_secs(5));

    timing.advance_to(start + Duration::from_secs(4));
    assert!(tokio::time::timeout(Duration::from_millis(10), sched.tick()).await.is_err());

    timing.advance_to(start + Duration::from_secs(5));
    assert!(sched.tick().await);
    assert_eq!(timing.now(), start + Duration::from_secs(5));
}

#[tokio::test]
async fn every_fires_repeatedly_at_fixed_cadence() {
    let timing = Timing::new_for_test();
    let mut sched = timing.scheduler();
    let start = timing.now();
    sched.every(Duration::from_secs(10));

    timing.advance_to(start + Duration::from_secs(35));
    for _ in 0..3 {
        assert!(sched.tick().await);
    }
    assert!(tokio::time::timeout(Duration::from_millis(10), sched.tick()).await.is_err());
}

#[tokio::test]
async fn stop_cancels_a_pending_interval_with_no_final_tick() {
    let timing = Timing::new_for_test();
    let mut sched = timing.scheduler();
    let start = timing.now();
    sched.every(Duration::from_secs(10));
    sched.stop();

    timing.advance_to(start + Duration::from_secs(100));
    assert!(tokio::time::timeout(Duration::from_millis(10), sched.tick()).await.is_err());
}

#[tokio::test]
async fn advance_to_fires_multiple_schedulers_in_non_decreasing_order() {
    let timing = Timing::new_for_test();
    let mut a = timing.scheduler();
    let mut b = timing.scheduler();
    let start = timing.now();
    a.at(start + Duration::from_secs(3));
    b.at(start + Duration::from_secs(1));

    timing.advance_to(start + Duration::from_secs(10));
    assert!(b.tick().await);
    assert!(a.tick().await);
}

#[tokio::test]
async fn paused_scheduler_does_not_fire_until_resume() {
    let timing = Timing::new_for_test();
    let mut sched = timing.scheduler();
    let start = timing.now();
    sched.every(Duration::from_secs(10));

    timing.pause();
    timing.advance_to(start + Duration::from_secs(25));
    assert!(tokio::time::timeout(Duration::from_millis(10), sched.tick()).await.is_err());

    timing.resume();
    // Exactly one catch-up tick, not one per missed period.
    assert!(sched.tick().await);
    assert!(tokio::time::timeout(Duration::from_millis(10), sched.tick()).await.is_err());
}

#[tokio::test]
async fn next_tick_advances_to_the_earliest_pending_fire() {
    let timing = Timing::new_for_test();
    let mut a = timing.scheduler();
    let mut b = timing.scheduler();
    let start = timing.now();
    a.at(start + Duration::from_secs(20));
    b.at(start + Duration::from_secs(5));

    let reached = timing.next_tick();
    assert_eq!(reached, start + Duration::from_secs(5));
    assert!(b.tick().await);
    assert!(tokio::time::timeout(Duration::from_millis(10), a.tick()).await.is_err());
}

#[tokio::test]
async fn dropping_a_scheduler_removes_its_registration() {
    let timing = Timing::new_for_test();
    let sched = timing.scheduler();
    let start = timing.now();
    sched.at(start + Duration::from_secs(1));
    drop(sched);

    // Should not panic even though nothing observes the fire.
    timing.advance_to(start + Duration::from_secs(2));
}

#[test]
fn instant_zero_is_distinguishable_from_a_real_epoch() {
    assert!(Instant::ZERO.is_zero());
    let timing = Timing::new_for_test();
    assert!(!timing.now().is_zero());
}

#[tokio::test]
async fn real_mode_after_eventually_fires() {
    let timing = Timing::new_real();
    let mut sched = timing.scheduler();
    sched.after(Duration::from_millis(5));
    assert!(tokio::time::timeout(Duration::from_secs(2), sched.tick()).await.unwrap());
}
