use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use exam_core::model::{Question, QuestionId, Submission, TestId};
use exam_core::{SessionError, TestSession, TickOutcome};
use storage::repository::SubmissionRepository;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use super::snapshot::SessionSnapshot;
use crate::Clock;
use crate::error::SessionServiceError;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
enum Command {
    Next,
    Previous,
    SetSingle { question: QuestionId, option: String },
    ToggleMultiple {
        question: QuestionId,
        option: String,
        selected: bool,
    },
    SetNumber { question: QuestionId, raw: String },
    Finish,
    Close,
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Everything the driver needs besides the session itself.
pub(crate) struct DriverContext {
    pub test_id: TestId,
    pub clock: Clock,
    pub started_at: DateTime<Utc>,
    pub submissions: Arc<dyn SubmissionRepository>,
}

/// Spawn the driver task for an already started session.
pub(crate) fn spawn(session: TestSession, ctx: DriverContext) -> SessionHandle {
    let questions: Arc<[Question]> = session.questions().into();
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::capture(&session, None));
    let test_id = ctx.test_id;

    let driver = SessionDriver {
        session,
        ctx,
        commands: commands_rx,
        snapshot: snapshot_tx,
        submission_id: None,
    };
    let task = tokio::spawn(driver.run());

    SessionHandle {
        test_id,
        questions,
        commands: commands_tx,
        snapshot: snapshot_rx,
        task,
    }
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

/// Owns one session. Ticks and commands are applied one at a time on this task,
/// so no lock guards the session.
struct SessionDriver {
    session: TestSession,
    ctx: DriverContext,
    commands: mpsc::Receiver<Request>,
    snapshot: watch::Sender<SessionSnapshot>,
    submission_id: Option<u64>,
}

impl SessionDriver {
    async fn run(mut self) {
        let mut ticker = time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        if self.session.is_finished() {
            self.record_outcome().await;
        }

        while !self.session.is_finished() {
            tokio::select! {
                biased;
                _ = ticker.tick() => self.on_tick().await,
                request = self.commands.recv() => {
                    let Some(request) = request else {
                        self.session.stop_clock();
                        debug!(test_id = %self.ctx.test_id, "all handles dropped, session torn down");
                        return;
                    };
                    if !self.apply(request).await {
                        return;
                    }
                }
            }
        }

        // Finished: the clock is stopped and queued commands are not applied.
        while let Some(Request { command, reply }) = self.commands.recv().await {
            let close = matches!(command, Command::Close);
            let result = match command {
                Command::Finish | Command::Close => Ok(()),
                _ => Err(SessionError::Closed),
            };
            let _ = reply.send(result);
            if close {
                return;
            }
        }
    }

    async fn on_tick(&mut self) {
        match self.session.tick() {
            TickOutcome::Running(_) => self.publish(),
            TickOutcome::Expired => {
                info!(test_id = %self.ctx.test_id, "time expired");
                self.record_outcome().await;
            }
            TickOutcome::Stopped => {}
        }
    }

    /// Apply one command. Returns `false` once the session was torn down.
    async fn apply(&mut self, request: Request) -> bool {
        let Request { command, reply } = request;
        let was_finished = self.session.is_finished();

        let result = match command {
            Command::Next => self.session.go_next(),
            Command::Previous => self.session.go_previous(),
            Command::SetSingle { question, option } => self.session.set_single(question, option),
            Command::ToggleMultiple {
                question,
                option,
                selected,
            } => self.session.toggle_multiple(question, option, selected),
            Command::SetNumber { question, raw } => self.session.set_number(question, raw),
            Command::Finish => self.session.finish().map(|_| ()),
            Command::Close => {
                self.session.stop_clock();
                info!(test_id = %self.ctx.test_id, remaining_secs = self.session.remaining_secs(), "session closed before finishing");
                self.publish();
                let _ = reply.send(Ok(()));
                return false;
            }
        };

        if !was_finished && self.session.is_finished() {
            self.record_outcome().await;
        } else if result.is_ok() {
            self.publish();
        } else if let Err(err) = &result {
            debug!(test_id = %self.ctx.test_id, error = %err, "command rejected");
        }

        let _ = reply.send(result);
        true
    }

    /// Hand the frozen answers to the submission sink, then publish.
    async fn record_outcome(&mut self) {
        let (Some(outcome), Some(access_key)) =
            (self.session.outcome().cloned(), self.session.credential().cloned())
        else {
            return;
        };

        let submission = Submission {
            test_id: self.ctx.test_id,
            access_key,
            started_at: self.ctx.started_at,
            finished_at: self.ctx.clock.now(),
            outcome,
        };

        match self.ctx.submissions.record_submission(&submission).await {
            Ok(id) => {
                info!(
                    test_id = %submission.test_id,
                    reason = %submission.reason(),
                    answered = submission.answers().len(),
                    submission_id = id,
                    "session finished"
                );
                self.submission_id = Some(id);
            }
            Err(err) => {
                error!(test_id = %submission.test_id, error = %err, "failed to record submission");
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot
            .send_replace(SessionSnapshot::capture(&self.session, self.submission_id));
    }
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("test_id", &self.test_id)
            .field("questions_len", &self.questions.len())
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

fn closed() -> SessionServiceError {
    SessionServiceError::Session(SessionError::Closed)
}

/// The presentation layer's grip on a running session.
///
/// Dropping every handle tears the session down and stops its clock.
pub struct SessionHandle {
    test_id: TestId,
    questions: Arc<[Question]>,
    commands: mpsc::Sender<Request>,
    snapshot: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        let index = self.snapshot.borrow().current_index;
        &self.questions[index]
    }

    /// A receiver notified on every tick and applied command.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// # Errors
    ///
    /// Returns a closed-session error once the session has finished.
    pub async fn go_next(&self) -> Result<(), SessionServiceError> {
        self.send(Command::Next).await
    }

    /// # Errors
    ///
    /// Returns a closed-session error once the session has finished.
    pub async fn go_previous(&self) -> Result<(), SessionServiceError> {
        self.send(Command::Previous).await
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Session` if the answer is rejected.
    pub async fn set_single(&self, question: QuestionId, option: impl Into<String>) -> Result<(), SessionServiceError> {
        self.send(Command::SetSingle {
            question,
            option: option.into(),
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Session` if the answer is rejected.
    pub async fn toggle_multiple(
        &self,
        question: QuestionId,
        option: impl Into<String>,
        selected: bool,
    ) -> Result<(), SessionServiceError> {
        self.send(Command::ToggleMultiple {
            question,
            option: option.into(),
            selected,
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Session` if the answer is rejected.
    pub async fn set_number(&self, question: QuestionId, raw: impl Into<String>) -> Result<(), SessionServiceError> {
        self.send(Command::SetNumber {
            question,
            raw: raw.into(),
        })
        .await
    }

    /// Finish from the last question and return the final state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotOnLastQuestion` when not on the last question.
    pub async fn finish(&self) -> Result<SessionSnapshot, SessionServiceError> {
        self.send(Command::Finish).await?;
        Ok(self.snapshot())
    }

    /// Wait until the session finishes, by clock or by an explicit finish.
    ///
    /// # Errors
    ///
    /// Returns a closed-session error if the session was torn down unfinished.
    pub async fn wait_finished(&self) -> Result<SessionSnapshot, SessionServiceError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(SessionSnapshot::is_finished)
            .await
            .map_err(|_| closed())?
            .clone();
        Ok(snapshot)
    }

    /// Tear the session down, stopping its clock, and wait for the driver to exit.
    pub async fn close(self) {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(Request {
                command: Command::Close,
                reply,
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
        drop(self.commands);
        if let Err(err) = self.task.await {
            error!(error = %err, "session driver panicked");
        }
    }

    async fn send(&self, command: Command) -> Result<(), SessionServiceError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| closed())?;
        let result = rx.await.map_err(|_| closed())?;
        Ok(result?)
    }
}
