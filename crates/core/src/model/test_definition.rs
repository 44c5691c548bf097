use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test duration must be > 0 minutes")]
    InvalidDuration,

    #[error("availability window ends ({ends_on}) before it starts ({starts_on})")]
    InvalidWindow {
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    },

    #[error("test must contain at least one question")]
    NoQuestions,

    #[error("question id {0} is used more than once")]
    DuplicateQuestion(QuestionId),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Default test length used by the authoring form.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Unvalidated input for a new test, as filled in by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDraft {
    pub title: String,
    pub duration_minutes: u32,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub questions: Vec<Question>,
}

impl TestDraft {
    /// Starts a draft with the default duration and a single-day window.
    #[must_use]
    pub fn new(title: impl Into<String>, on: NaiveDate) -> Self {
        Self {
            title: title.into(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            starts_on: on,
            ends_on: on,
            questions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_window(mut self, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        self.starts_on = starts_on;
        self.ends_on = ends_on;
        self
    }

    #[must_use]
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }
}

//
// ─── TEST DEFINITION ───────────────────────────────────────────────────────────
//

/// A published test: ordered questions plus timing and availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    id: TestId,
    title: String,
    duration_minutes: u32,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
    questions: Vec<Question>,
}

impl TestDefinition {
    /// Validate a draft and assign it an id.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the title is blank, the duration is zero, the
    /// window is inverted, or the questions are empty or share an id.
    pub fn new(id: TestId, draft: TestDraft) -> Result<Self, TestError> {
        let TestDraft {
            title,
            duration_minutes,
            starts_on,
            ends_on,
            questions,
        } = draft;

        let title = title.trim().to_owned();
        if title.is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(TestError::InvalidDuration);
        }
        if ends_on < starts_on {
            return Err(TestError::InvalidWindow { starts_on, ends_on });
        }
        if questions.is_empty() {
            return Err(TestError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(TestError::DuplicateQuestion(question.id()));
            }
        }

        Ok(Self {
            id,
            title,
            duration_minutes,
            starts_on,
            ends_on,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Session length in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn starts_on(&self) -> NaiveDate {
        self.starts_on
    }

    #[must_use]
    pub fn ends_on(&self) -> NaiveDate {
        self.ends_on
    }

    /// True when `date` falls inside the availability window (inclusive).
    #[must_use]
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}
