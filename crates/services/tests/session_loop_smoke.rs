use std::sync::Arc;
use std::time::Duration;

use exam_core::model::{Answer, FinishReason, QuestionId, TestId};
use exam_core::time::{fixed_clock, fixed_now};
use exam_core::{AnswerPolicy, Clock, SessionError, SessionPhase};
use services::{CredentialError, ExamLoopService, NonEmptyCredential, SessionServiceError};
use storage::Storage;
use storage::seed::ensure_demo_test;

async fn setup(clock: Clock, duration_secs: Option<u32>) -> (Storage, TestId, ExamLoopService) {
    let storage = Storage::in_memory();
    let test_id = ensure_demo_test(storage.tests.as_ref(), fixed_now().date_naive())
        .await
        .unwrap();
    let svc = ExamLoopService::new(
        clock,
        Arc::clone(&storage.tests),
        Arc::clone(&storage.submissions),
        Arc::new(NonEmptyCredential),
    )
    .with_duration_secs(duration_secs);
    (storage, test_id, svc)
}

#[tokio::test(start_paused = true)]
async fn clock_expiry_finishes_and_submits() {
    let (storage, test_id, svc) = setup(fixed_clock(), Some(5)).await;
    let handle = svc.start_session(test_id, "STUDENT-1").await.unwrap();
    handle.go_next().await.unwrap();
    handle
        .toggle_multiple(QuestionId::new(2), "Python", true)
        .await
        .unwrap();

    let snapshot = handle.wait_finished().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Finished(FinishReason::TimeExpired));
    assert_eq!(snapshot.remaining_secs, 0);
    assert_eq!(snapshot.current_index, 1);
    assert!(!snapshot.clock_running);
    assert_eq!(snapshot.submission_id, Some(1));

    let stored = storage.submissions.submissions_for_test(test_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reason(), FinishReason::TimeExpired);
    assert_eq!(stored[0].access_key.as_str(), "STUDENT-1");
    assert!(stored[0].answers().answer_for(QuestionId::new(2)).is_answered());
}

#[tokio::test(start_paused = true)]
async fn remaining_time_counts_down_once_per_second() {
    let (_storage, test_id, svc) = setup(fixed_clock(), Some(5)).await;
    let handle = svc.start_session(test_id, "STUDENT-1").await.unwrap();
    assert_eq!(handle.snapshot().remaining_secs, 5);
    assert_eq!(handle.snapshot().remaining_label(), "00:00:05");

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.remaining_secs, 2);
    assert!(snapshot.is_running_low());
    assert_eq!(snapshot.phase, SessionPhase::InProgress);
}

#[tokio::test(start_paused = true)]
async fn commands_after_expiry_are_closed() {
    let (_storage, test_id, svc) = setup(fixed_clock(), Some(2)).await;
    let handle = svc.start_session(test_id, "STUDENT-1").await.unwrap();
    handle.wait_finished().await.unwrap();

    let before = handle.snapshot();
    let err = handle.go_next().await.unwrap_err();
    assert!(err.is_closed());
    let err = handle.set_single(QuestionId::new(1), "<html>").await.unwrap_err();
    assert!(err.is_closed());
    assert_eq!(handle.snapshot(), before);

    // finishing again is a no-op
    handle.finish().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn command_racing_the_final_tick_is_not_applied() {
    let (storage, test_id, svc) = setup(fixed_clock(), Some(1)).await;
    let handle = svc.start_session(test_id, "STUDENT-1").await.unwrap();
    // let the driver consume the immediate first tick and park in select
    tokio::task::yield_now().await;

    tokio::time::advance(Duration::from_millis(1000)).await;
    let err = handle
        .set_single(QuestionId::new(1), "<html>")
        .await
        .unwrap_err();
    assert!(err.is_closed());

    let snapshot = handle.wait_finished().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Finished(FinishReason::TimeExpired));
    assert!(!snapshot.answer_for(QuestionId::new(1)).is_answered());

    let stored = storage.submissions.submissions_for_test(test_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].answers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn finish_on_last_question_submits_immediately() {
    let (storage, test_id, svc) = setup(fixed_clock(), None).await;
    let handle = svc.start_session(test_id, "STUDENT-2").await.unwrap();
    assert_eq!(handle.snapshot().remaining_secs, 3600);

    handle.set_single(QuestionId::new(1), "<html>").await.unwrap();
    handle.go_next().await.unwrap();
    handle.toggle_multiple(QuestionId::new(2), "Java", true).await.unwrap();
    handle.go_next().await.unwrap();
    assert_eq!(handle.current_question().id(), QuestionId::new(3));
    handle.set_number(QuestionId::new(3), "8").await.unwrap();

    let snapshot = handle.finish().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Finished(FinishReason::Submitted));
    assert_eq!(snapshot.remaining_secs, 3600);
    assert_eq!(
        snapshot.answer_for(QuestionId::new(3)).answer(),
        Some(&Answer::Number("8".into()))
    );

    let stored = storage.submissions.submissions_for_test(test_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].answers().len(), 3);
    assert_eq!(stored[0].started_at, fixed_now());
}

#[tokio::test(start_paused = true)]
async fn finish_before_last_question_is_rejected() {
    let (_storage, test_id, svc) = setup(fixed_clock(), None).await;
    let handle = svc.start_session(test_id, "STUDENT-3").await.unwrap();
    let err = handle.finish().await.unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Session(SessionError::NotOnLastQuestion { index: 0, last: 2 })
    ));
    assert_eq!(handle.snapshot().phase, SessionPhase::InProgress);
}

#[tokio::test(start_paused = true)]
async fn navigation_clamps_through_the_handle() {
    let (_storage, test_id, svc) = setup(fixed_clock(), None).await;
    let handle = svc.start_session(test_id, "STUDENT-4").await.unwrap();
    handle.go_previous().await.unwrap();
    assert_eq!(handle.snapshot().current_index, 0);
    for _ in 0..4 {
        handle.go_next().await.unwrap();
    }
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert!(snapshot.is_last());
    assert_eq!(snapshot.progress_percent, 100);
}

#[tokio::test(start_paused = true)]
async fn strict_policy_rejects_bad_values() {
    let (_storage, test_id, svc) = setup(fixed_clock(), None).await;
    let svc = svc.with_policy(AnswerPolicy::Strict);
    let handle = svc.start_session(test_id, "STUDENT-5").await.unwrap();
    let err = handle.set_number(QuestionId::new(3), "eight").await.unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Session(SessionError::InvalidNumber { .. })
    ));
    assert!(!handle.snapshot().answer_for(QuestionId::new(3)).is_answered());
}

#[tokio::test(start_paused = true)]
async fn blank_key_does_not_start() {
    let (_storage, test_id, svc) = setup(fixed_clock(), None).await;
    let err = svc.start_session(test_id, "   ").await.unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Credential(CredentialError::Missing)
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_or_closed_test_does_not_start() {
    let (_storage, test_id, svc) = setup(fixed_clock(), None).await;
    let err = svc.start_session(TestId::new(42), "KEY").await.unwrap_err();
    assert!(matches!(err, SessionServiceError::UnknownTest(_)));

    let mut late = fixed_clock();
    late.advance(chrono::Duration::days(30));
    let (_storage, test_id_late, svc_late) = setup(late, None).await;
    assert_eq!(test_id, test_id_late);
    let err = svc_late.start_session(test_id_late, "KEY").await.unwrap_err();
    assert!(matches!(err, SessionServiceError::NotOpen { .. }));
}

#[tokio::test(start_paused = true)]
async fn closing_stops_the_clock_without_submitting() {
    let (storage, test_id, svc) = setup(fixed_clock(), Some(3)).await;
    let handle = svc.start_session(test_id, "STUDENT-6").await.unwrap();
    let mut updates = handle.subscribe();
    handle.close().await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!updates.borrow_and_update().clock_running);
    assert!(
        storage
            .submissions
            .submissions_for_test(test_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_tears_the_session_down() {
    let (storage, test_id, svc) = setup(fixed_clock(), Some(3)).await;
    let handle = svc.start_session(test_id, "STUDENT-7").await.unwrap();
    let updates = handle.subscribe();
    drop(handle);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(updates.has_changed().is_err(), "driver should have exited");
    assert!(
        storage
            .submissions
            .submissions_for_test(test_id)
            .await
            .unwrap()
            .is_empty()
    );
}
