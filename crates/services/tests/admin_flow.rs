use exam_core::model::{AccessKey, Question, QuestionId, TestDraft};
use exam_core::time::{fixed_clock, fixed_now};
use services::{AppServices, CredentialError, SessionOptions, SessionServiceError};

async fn services_with_issued_keys() -> AppServices {
    let options = SessionOptions {
        require_issued_keys: true,
        ..SessionOptions::default()
    };
    AppServices::in_memory(fixed_clock(), options).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn issued_key_admits_and_revoked_key_does_not() {
    let services = services_with_issued_keys().await;
    let test_id = services.default_test_id();
    let admin = services.admin();
    let exam = services.exam_loop();

    let err = exam.start_session(test_id, "MADE-UP").await.unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Credential(CredentialError::Unknown)
    ));

    let record = admin.issue_key(test_id, "Ivan Ivanov").await.unwrap();
    let handle = exam
        .start_session(test_id, record.key.as_str())
        .await
        .unwrap();
    assert_eq!(handle.test_id(), test_id);
    handle.close().await;

    admin.revoke_key(&record.key).await.unwrap();
    let err = exam
        .start_session(test_id, record.key.as_str())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Credential(CredentialError::Revoked)
    ));
}

#[tokio::test(start_paused = true)]
async fn keys_are_bound_to_their_test() {
    let services = services_with_issued_keys().await;
    let admin = services.admin();
    let other = admin
        .create_test(
            TestDraft::new("Arithmetic", fixed_now().date_naive())
                .with_duration_minutes(5)
                .with_question(Question::number(QuestionId::new(1), "2 + 2?").unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(other.id().to_string(), "test-002");

    let key = AccessKey::parse("STUDENT-1").unwrap();
    admin
        .issue_named_key(services.default_test_id(), "Anna Petrova", key.clone())
        .await
        .unwrap();

    let err = services
        .exam_loop()
        .start_session(other.id(), key.as_str())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Credential(CredentialError::WrongTest { .. })
    ));

    admin
        .issue_named_key(other.id(), "Boris Sidorov", AccessKey::parse("STUDENT-2").unwrap())
        .await
        .unwrap();
    let handle = services
        .exam_loop()
        .start_session(other.id(), "STUDENT-2")
        .await
        .unwrap();
    assert_eq!(handle.snapshot().remaining_secs, 300);
    assert_eq!(handle.questions().len(), 1);

    let listed = admin.list_tests().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|item| item.student_count == 1));
}
