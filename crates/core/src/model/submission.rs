use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::access_key::AccessKey;
use crate::model::answer::AnswerSheet;
use crate::model::ids::TestId;

/// Why a session stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The countdown reached zero.
    TimeExpired,
    /// The respondent finished from the last question.
    Submitted,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::TimeExpired => f.write_str("time expired"),
            FinishReason::Submitted => f.write_str("submitted"),
        }
    }
}

/// Answers frozen at the moment a session finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub reason: FinishReason,
    pub remaining_secs: u32,
    pub answers: AnswerSheet,
}

/// What gets handed to the submission sink once an attempt is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub test_id: TestId,
    pub access_key: AccessKey,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: SessionOutcome,
}

impl Submission {
    #[must_use]
    pub fn reason(&self) -> FinishReason {
        self.outcome.reason
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.outcome.answers
    }
}
