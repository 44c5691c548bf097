use exam_core::model::{AnswerSheet, AnswerStatus, QuestionId};
use exam_core::{SessionPhase, TestSession, format_remaining, is_running_low};

/// Read-only view of a running session, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub total_questions: usize,
    pub remaining_secs: u32,
    pub progress_percent: u8,
    pub clock_running: bool,
    pub answers: AnswerSheet,
    /// Sequence number assigned by the submission sink, once recorded.
    pub submission_id: Option<u64>,
}

impl SessionSnapshot {
    pub(crate) fn capture(session: &TestSession, submission_id: Option<u64>) -> Self {
        Self {
            phase: session.phase(),
            current_index: session.current_index(),
            total_questions: session.total_questions(),
            remaining_secs: session.remaining_secs(),
            progress_percent: session.progress_percent(),
            clock_running: session.is_clock_running(),
            answers: session.answers().clone(),
            submission_id,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished(_))
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.total_questions
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> AnswerStatus<'_> {
        self.answers.answer_for(question)
    }

    /// Remaining time as `HH:MM:SS`.
    #[must_use]
    pub fn remaining_label(&self) -> String {
        format_remaining(self.remaining_secs)
    }

    #[must_use]
    pub fn is_running_low(&self) -> bool {
        is_running_low(self.remaining_secs)
    }
}
