use chrono::Duration;
use exam_core::model::{AccessKey, AnswerSheet, FinishReason, QuestionId, SessionOutcome, Submission, TestId};
use exam_core::time::fixed_now;
use storage::Storage;
use storage::seed::ensure_demo_test;

fn submission(test_id: TestId, key: &str, reason: FinishReason) -> Submission {
    let mut answers = AnswerSheet::new();
    answers.set_number(QuestionId::new(3), "8");
    Submission {
        test_id,
        access_key: AccessKey::parse(key).unwrap(),
        started_at: fixed_now(),
        finished_at: fixed_now() + Duration::minutes(12),
        outcome: SessionOutcome {
            reason,
            remaining_secs: 2880,
            answers,
        },
    }
}

#[tokio::test]
async fn storage_collects_submissions_per_test() {
    let storage = Storage::in_memory();
    let test_id = ensure_demo_test(storage.tests.as_ref(), fixed_now().date_naive())
        .await
        .unwrap();

    let first = storage
        .submissions
        .record_submission(&submission(test_id, "A-1", FinishReason::Submitted))
        .await
        .unwrap();
    let second = storage
        .submissions
        .record_submission(&submission(test_id, "A-2", FinishReason::TimeExpired))
        .await
        .unwrap();
    storage
        .submissions
        .record_submission(&submission(TestId::new(99), "B-1", FinishReason::Submitted))
        .await
        .unwrap();

    assert_eq!((first, second), (1, 2));
    let stored = storage.submissions.submissions_for_test(test_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].access_key.as_str(), "A-1");
    assert_eq!(stored[1].reason(), FinishReason::TimeExpired);
    assert_eq!(stored[1].answers().len(), 1);
}
