//! Integration tests for continuous location watching.

mod helpers;

use geotrust_core::location::testing::ScriptedProvider;
use geotrust_core::location::{
    LocationError, PositionSample, TrustOptions, UserAlert, WatchOptions, WatchSession,
    WatchStatus,
};
use helpers::{android, evaluator, later, north_of, reading, NOW};

/// Walks a session from start to stop over the Istanbul scenario: a short
/// step, then a 21 km jump one second later, then stop.
#[tokio::test]
async fn istanbul_scenario_counts_one_alert_and_cancels() {
    let provider = ScriptedProvider::new();
    provider.set_watch_samples(vec![
        PositionSample::new(41.0082, 28.9784, NOW),
        PositionSample::new(41.0083, 28.9785, NOW + 1_000),
        PositionSample::new(41.2000, 28.9784, NOW + 2_000),
    ]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(None);
    assert_eq!(session.status(), WatchStatus::Idle);

    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    assert_eq!(session.status(), WatchStatus::Watching);
    assert_eq!(evaluator.provider().active_watches(), 1);

    let first = session.next_update(&evaluator).await.unwrap().unwrap();
    assert_eq!(first.assessment.unwrap().alert_count, 0);

    let step = session.next_update(&evaluator).await.unwrap().unwrap();
    assert_eq!(step.assessment.unwrap().alert_count, 0);
    assert_eq!(step.cumulative_alert_count, 0);

    let jump = session.next_update(&evaluator).await.unwrap().unwrap();
    assert_eq!(jump.assessment.unwrap().alert_count, 1);
    assert_eq!(jump.cumulative_alert_count, 1);
    assert_eq!(
        evaluator.alerter().alerts(),
        vec![UserAlert::AbnormalMovement]
    );

    session.stop();

    assert_eq!(session.state().cumulative_alert_count(), 1);
    assert_eq!(session.status(), WatchStatus::Stopped);
    assert!(session.is_cancelled());
    assert_eq!(evaluator.provider().active_watches(), 0);
}

#[tokio::test]
async fn flagged_update_does_not_move_baseline() {
    let baseline = reading();
    let provider = ScriptedProvider::new();
    provider.set_watch_samples(vec![later(&north_of(&baseline, 50_000.0), 1_000)]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(Some(baseline.clone()));
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    session.next_update(&evaluator).await.unwrap();

    assert_eq!(session.state().last_accepted_sample(), Some(&baseline));
}

#[tokio::test]
async fn invalid_coordinates_never_become_baseline() {
    let baseline = reading();
    let provider = ScriptedProvider::new();
    provider.set_watch_samples(vec![PositionSample::new(f64::NAN, 999.0, NOW + 1_000)]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(Some(baseline.clone()));
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    let update = session.next_update(&evaluator).await.unwrap().unwrap();

    assert_eq!(update.cumulative_alert_count, 1);
    assert_eq!(session.state().last_accepted_sample(), Some(&baseline));
}

#[tokio::test]
async fn stationary_update_is_not_assessed() {
    let baseline = reading();
    let provider = ScriptedProvider::new();
    // Same spot, awful accuracy: would be flagged if it were checked.
    provider.set_watch_samples(vec![later(&baseline, 1_000).with_accuracy(5_000.0)]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(Some(baseline));
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    let update = session.next_update(&evaluator).await.unwrap().unwrap();

    assert!(update.assessment.is_none());
    assert_eq!(update.cumulative_alert_count, 0);
}

#[tokio::test]
async fn mocked_update_on_android_raises_blocking_alert() {
    let provider = ScriptedProvider::new();
    provider.set_watch_samples(vec![reading().mocked(true)]);
    let evaluator = evaluator(provider, android());

    let mut session = WatchSession::new(None);
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    let update = session.next_update(&evaluator).await.unwrap().unwrap();

    assert!(update.assessment.unwrap().alert_count >= 1);
    assert_eq!(evaluator.alerter().count(UserAlert::FakeLocation), 1);
    assert!(UserAlert::FakeLocation.is_blocking());
}

#[tokio::test]
async fn restart_prompt_after_six_alerts() {
    let provider = ScriptedProvider::new();
    let samples = (0..7_i32)
        .map(|i| {
            let moved = north_of(&reading(), f64::from(i) * 100.0);
            later(&moved, i64::from(i) * 60_000).with_accuracy(2_000.0)
        })
        .collect();
    provider.set_watch_samples(samples);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(None);
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();

    let mut last = None;
    while let Some(update) = session.next_update(&evaluator).await.unwrap() {
        last = Some(update);
    }

    let last = last.unwrap();
    assert_eq!(last.cumulative_alert_count, 7);
    assert!(last.restart_required);
    assert_eq!(evaluator.alerter().count(UserAlert::RestartRequired), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_resets_counter_after_verification() {
    let fresh = reading();
    let provider = ScriptedProvider::with_readings([fresh.clone(), fresh.clone()]);
    provider.set_watch_samples(vec![reading().with_accuracy(2_000.0)]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(None);
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    session.next_update(&evaluator).await.unwrap();
    assert_eq!(session.state().cumulative_alert_count(), 1);

    let location = session.restart(&evaluator).await.unwrap();

    assert!(location.verified);
    assert_eq!(session.state().cumulative_alert_count(), 0);
    assert_eq!(session.state().last_accepted_sample(), Some(&fresh));
    assert_eq!(session.status(), WatchStatus::Watching);
}

#[tokio::test(start_paused = true)]
async fn failed_restart_keeps_counter() {
    let provider = ScriptedProvider::with_readings([reading().with_accuracy(900.0)]);
    provider.set_watch_samples(vec![reading().with_accuracy(2_000.0)]);
    let evaluator = evaluator(provider, TrustOptions::default());

    let mut session = WatchSession::new(None);
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    session.next_update(&evaluator).await.unwrap();

    assert!(session.restart(&evaluator).await.is_err());
    assert_eq!(session.state().cumulative_alert_count(), 1);
}

#[tokio::test]
async fn next_update_requires_active_watch() {
    let evaluator = evaluator(ScriptedProvider::new(), TrustOptions::default());
    let mut session = WatchSession::new(None);

    let idle = session.next_update(&evaluator).await;
    assert!(matches!(idle, Err(LocationError::InvalidState(_))));

    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();
    session.stop();

    let stopped = session.next_update(&evaluator).await;
    assert!(matches!(stopped, Err(LocationError::InvalidState(_))));
}

#[tokio::test]
async fn start_is_only_allowed_from_idle() {
    let evaluator = evaluator(ScriptedProvider::new(), TrustOptions::default());
    let mut session = WatchSession::new(None);
    let options = WatchOptions::default();

    session.start(evaluator.provider(), &options).await.unwrap();
    assert!(session.start(evaluator.provider(), &options).await.is_err());

    session.stop();
    assert!(session.start(evaluator.provider(), &options).await.is_err());
    assert_eq!(evaluator.provider().active_watches(), 0);
}

#[tokio::test]
async fn dropping_session_releases_subscription() {
    let evaluator = evaluator(ScriptedProvider::new(), TrustOptions::default());
    {
        let mut session = WatchSession::new(None);
        session
            .start(evaluator.provider(), &WatchOptions::default())
            .await
            .unwrap();
        assert_eq!(evaluator.provider().active_watches(), 1);
    }
    assert_eq!(evaluator.provider().active_watches(), 0);
}

#[tokio::test]
async fn ended_stream_yields_none() {
    let evaluator = evaluator(ScriptedProvider::new(), TrustOptions::default());
    let mut session = WatchSession::new(None);
    session
        .start(evaluator.provider(), &WatchOptions::default())
        .await
        .unwrap();

    assert_eq!(session.next_update(&evaluator).await.unwrap(), None);
    assert_eq!(session.status(), WatchStatus::Watching);
}
