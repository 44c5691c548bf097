use std::fmt;
use thiserror::Error;

use crate::countdown::{Countdown, TickOutcome};
use crate::model::{
    AccessKey, AnswerSheet, AnswerStatus, FinishReason, Question, QuestionId, QuestionKind,
    SessionOutcome, TestDefinition,
};
use crate::navigation::Navigator;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session already started")]
    AlreadyStarted,

    #[error("session has not started")]
    NotStarted,

    #[error("session is closed")]
    Closed,

    #[error("finish is only allowed on the last question (at {index}, last is {last})")]
    NotOnLastQuestion { index: usize, last: usize },

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("question {question} expects a {expected} answer")]
    KindMismatch {
        question: QuestionId,
        expected: QuestionKind,
    },

    #[error("`{option}` is not an option of question {question}")]
    UnknownOption { question: QuestionId, option: String },

    #[error("`{raw}` is not a number (question {question})")]
    InvalidNumber { question: QuestionId, raw: String },
}

//
// ─── POLICY & PHASE ────────────────────────────────────────────────────────────
//

/// How strictly recorded answers are checked against their question.
///
/// Both policies reject answers for unknown questions or of the wrong kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnswerPolicy {
    /// Values are stored as given.
    #[default]
    Lenient,
    /// Choices must be listed options and numbers must parse as finite `f64`.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Finished(FinishReason),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One respondent's attempt at a fixed, ordered list of questions.
///
/// `NotStarted → InProgress → Finished`. Once finished, the answers are frozen
/// into a [`SessionOutcome`] and every mutating call fails with
/// [`SessionError::Closed`] without touching state.
pub struct TestSession {
    questions: Vec<Question>,
    navigator: Navigator,
    answers: AnswerSheet,
    countdown: Countdown,
    policy: AnswerPolicy,
    phase: SessionPhase,
    credential: Option<AccessKey>,
    outcome: Option<SessionOutcome>,
}

impl TestSession {
    /// Create a session that will run for `duration_secs` once started.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<Question>, duration_secs: u32) -> Result<Self, SessionError> {
        let navigator = Navigator::new(questions.len()).ok_or(SessionError::Empty)?;
        Ok(Self {
            questions,
            navigator,
            answers: AnswerSheet::new(),
            countdown: Countdown::idle(duration_secs),
            policy: AnswerPolicy::default(),
            phase: SessionPhase::NotStarted,
            credential: None,
            outcome: None,
        })
    }

    /// Create a session over a published test, using its duration.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the test carries no questions.
    pub fn for_test(test: &TestDefinition) -> Result<Self, SessionError> {
        Self::new(test.questions().to_vec(), test.duration_secs())
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Admit the respondent holding `credential` and start the clock.
    ///
    /// A zero-length session finishes immediately with `TimeExpired`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` if called twice.
    pub fn start(&mut self, credential: AccessKey) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.credential = Some(credential);
        self.countdown = Countdown::start(self.countdown.remaining());
        self.phase = SessionPhase::InProgress;
        if self.countdown.is_expired() {
            self.finish_with(FinishReason::TimeExpired);
        }
        Ok(())
    }

    /// Advance the clock by one second.
    ///
    /// Reaching zero finishes the session in the same call, so no later tick
    /// can be observed. Ticks outside `InProgress` report `Stopped`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::InProgress {
            return TickOutcome::Stopped;
        }
        let outcome = self.countdown.tick();
        if outcome == TickOutcome::Expired {
            self.finish_with(FinishReason::TimeExpired);
        }
        outcome
    }

    /// Finish from the last question. Repeating it after the session ended is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`, and
    /// `SessionError::NotOnLastQuestion` when the current question is not the last.
    pub fn finish(&mut self) -> Result<&SessionOutcome, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Finished(_) => {}
            SessionPhase::InProgress => {
                if !self.navigator.is_last() {
                    return Err(SessionError::NotOnLastQuestion {
                        index: self.navigator.index(),
                        last: self.navigator.total() - 1,
                    });
                }
                self.finish_with(FinishReason::Submitted);
            }
        }
        self.outcome.as_ref().ok_or(SessionError::Closed)
    }

    /// Stop the clock for teardown. Leaves the phase untouched.
    pub fn stop_clock(&mut self) {
        self.countdown.stop();
    }

    fn finish_with(&mut self, reason: FinishReason) {
        if matches!(self.phase, SessionPhase::Finished(_)) {
            return;
        }
        self.countdown.stop();
        self.phase = SessionPhase::Finished(reason);
        self.outcome = Some(SessionOutcome {
            reason,
            remaining_secs: self.countdown.remaining(),
            answers: self.answers.clone(),
        });
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::NotStarted => Err(SessionError::NotStarted),
            SessionPhase::InProgress => Ok(()),
            SessionPhase::Finished(_) => Err(SessionError::Closed),
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next question; a no-op on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` or `SessionError::NotStarted` outside `InProgress`.
    pub fn go_next(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.navigator.go_next();
        Ok(())
    }

    /// Move to the previous question; a no-op on the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` or `SessionError::NotStarted` outside `InProgress`.
    pub fn go_previous(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.navigator.go_previous();
        Ok(())
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record `option` for a single-choice question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is not in progress, the question is
    /// unknown or not single-choice, or (strict policy) the option is not listed.
    pub fn set_single(&mut self, question: QuestionId, option: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let option = option.into();
        let q = self.question_of_kind(question, QuestionKind::Single)?;
        self.check_option(q, &option)?;
        self.answers.set_single(question, option);
        Ok(())
    }

    /// Select or deselect `option` for a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TestSession::set_single`], for multiple-choice questions.
    pub fn toggle_multiple(
        &mut self,
        question: QuestionId,
        option: impl Into<String>,
        selected: bool,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let option = option.into();
        let q = self.question_of_kind(question, QuestionKind::Multiple)?;
        self.check_option(q, &option)?;
        self.answers.toggle_multiple(question, option, selected);
        Ok(())
    }

    /// Record raw numeric text for a number question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is not in progress, the question is
    /// unknown or not numeric, or (strict policy) the text is not a finite number.
    pub fn set_number(&mut self, question: QuestionId, raw: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let raw = raw.into();
        self.question_of_kind(question, QuestionKind::Number)?;
        if self.policy == AnswerPolicy::Strict
            && !raw.trim().parse::<f64>().is_ok_and(f64::is_finite)
        {
            return Err(SessionError::InvalidNumber { question, raw });
        }
        self.answers.set_number(question, raw);
        Ok(())
    }

    fn question_of_kind(&self, id: QuestionId, kind: QuestionKind) -> Result<&Question, SessionError> {
        let question = self
            .questions
            .iter()
            .find(|q| q.id() == id)
            .ok_or(SessionError::UnknownQuestion(id))?;
        if question.kind() != kind {
            return Err(SessionError::KindMismatch {
                question: id,
                expected: question.kind(),
            });
        }
        Ok(question)
    }

    fn check_option(&self, question: &Question, option: &str) -> Result<(), SessionError> {
        if self.policy == AnswerPolicy::Strict && !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                question: question.id(),
                option: option.to_owned(),
            });
        }
        Ok(())
    }

    //
    // ─── READ ACCESSORS ────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished(_))
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.navigator.index()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.navigator.index()]
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.navigator.total()
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.navigator.is_first()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.navigator.is_last()
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        self.navigator.progress_fraction()
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.navigator.progress_percent()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn is_clock_running(&self) -> bool {
        self.countdown.is_running()
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> AnswerStatus<'_> {
        self.answers.answer_for(question)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn credential(&self) -> Option<&AccessKey> {
        self.credential.as_ref()
    }

    /// Frozen answers; `Some` once the session has finished.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.navigator.index())
            .field("answered", &self.answers.len())
            .field("remaining_secs", &self.countdown.remaining())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
