//! Demo catalogue used by the binary and by integration tests.

use chrono::{Duration, NaiveDate};
use exam_core::model::{
    Question, QuestionError, QuestionId, TestDefinition, TestDraft, TestError, TestId,
};
use thiserror::Error;

use crate::repository::{StorageError, TestRepository};

pub const DEMO_TEST_TITLE: &str = "Programming basics";

/// Days the demo test stays open, counting the first day.
const DEMO_WINDOW_DAYS: i64 = 6;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The three sample questions: one of each kind.
///
/// # Errors
///
/// Returns `QuestionError` only if the fixed sample data were invalid.
pub fn demo_questions() -> Result<Vec<Question>, QuestionError> {
    Ok(vec![
        Question::single(
            QuestionId::new(1),
            "Which element is the root structural component of an HTML document?",
            ["<div>", "<html>", "<body>", "<head>"],
        )?,
        Question::multiple(
            QuestionId::new(2),
            "Select the general-purpose programming languages:",
            ["Python", "HTML", "JavaScript", "CSS", "Java"],
        )?,
        Question::number(QuestionId::new(3), "How many bits are in one byte?")?,
    ])
}

/// A one-hour demo test open from `opens_on` for a week.
///
/// # Errors
///
/// Returns `SeedError` only if the fixed sample data were invalid.
pub fn demo_test(id: TestId, opens_on: NaiveDate) -> Result<TestDefinition, SeedError> {
    let mut draft = TestDraft::new(DEMO_TEST_TITLE, opens_on)
        .with_window(opens_on, opens_on + Duration::days(DEMO_WINDOW_DAYS));
    draft.questions = demo_questions()?;
    Ok(TestDefinition::new(id, draft)?)
}

/// Store the demo test under the next free id unless a test already exists.
///
/// # Errors
///
/// Returns `SeedError` on storage failure.
pub async fn ensure_demo_test(
    tests: &dyn TestRepository,
    opens_on: NaiveDate,
) -> Result<TestId, SeedError> {
    if let Some(existing) = tests.list_tests().await?.first() {
        return Ok(existing.id());
    }
    let test = demo_test(tests.next_test_id().await?, opens_on)?;
    tests.upsert_test(&test).await?;
    Ok(test.id())
}
