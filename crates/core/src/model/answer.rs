use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::QuestionId;

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A recorded response, shaped by the kind of question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Answer {
    Single(String),
    Multiple(BTreeSet<String>),
    /// Raw text as typed; not parsed.
    Number(String),
}

/// Result of looking up the answer for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus<'a> {
    Unanswered,
    Answered(&'a Answer),
}

impl<'a> AnswerStatus<'a> {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerStatus::Answered(_))
    }

    #[must_use]
    pub fn answer(&self) -> Option<&'a Answer> {
        match self {
            AnswerStatus::Answered(answer) => Some(answer),
            AnswerStatus::Unanswered => None,
        }
    }
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// Per-session mapping from question id to the respondent's answer.
///
/// Holds at most one answer per question. This layer records values as given;
/// checking them against the question is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet {
    answers: BTreeMap<QuestionId, Answer>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` as the single choice for `question`, replacing any prior value.
    pub fn set_single(&mut self, question: QuestionId, option: impl Into<String>) {
        self.answers.insert(question, Answer::Single(option.into()));
    }

    /// Add or remove `option` from the selection for `question`.
    ///
    /// Both directions are idempotent. A question with no prior multiple-choice
    /// selection starts from an empty set.
    pub fn toggle_multiple(&mut self, question: QuestionId, option: impl Into<String>, selected: bool) {
        let option = option.into();
        let entry = self
            .answers
            .entry(question)
            .or_insert_with(|| Answer::Multiple(BTreeSet::new()));
        if !matches!(entry, Answer::Multiple(_)) {
            *entry = Answer::Multiple(BTreeSet::new());
        }
        if let Answer::Multiple(set) = entry {
            if selected {
                set.insert(option);
            } else {
                set.remove(&option);
            }
        }
    }

    /// Record the raw numeric text for `question`, replacing any prior value.
    pub fn set_number(&mut self, question: QuestionId, raw: impl Into<String>) {
        self.answers.insert(question, Answer::Number(raw.into()));
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> AnswerStatus<'_> {
        self.answers
            .get(&question)
            .map_or(AnswerStatus::Unanswered, AnswerStatus::Answered)
    }

    /// Number of questions with a recorded answer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
