use std::sync::Arc;

use exam_core::model::{AccessKey, TestDefinition, TestId};
use exam_core::{AnswerPolicy, TestSession};
use storage::repository::{StorageError, SubmissionRepository, TestRepository};
use tracing::info;

use super::driver::{self, DriverContext, SessionHandle};
use crate::Clock;
use crate::credentials::CredentialCheck;
use crate::error::{CredentialError, SessionServiceError};

/// Admits respondents and starts timed sessions against the test catalogue.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    credentials: Arc<dyn CredentialCheck>,
    policy: AnswerPolicy,
    duration_secs: Option<u32>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tests: Arc<dyn TestRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        credentials: Arc<dyn CredentialCheck>,
    ) -> Self {
        Self {
            clock,
            tests,
            submissions,
            credentials,
            policy: AnswerPolicy::default(),
            duration_secs: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every session for `secs` instead of the test's own duration.
    #[must_use]
    pub fn with_duration_secs(mut self, secs: Option<u32>) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Check `raw_key` and start a session for `test_id`; the clock starts now.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Missing` for a blank key, `UnknownTest`,
    /// `NotOpen` outside the availability window, or the credential check's error.
    pub async fn start_session(
        &self,
        test_id: TestId,
        raw_key: &str,
    ) -> Result<SessionHandle, SessionServiceError> {
        let key = AccessKey::parse(raw_key).map_err(|_| CredentialError::Missing)?;
        let test = self.load_test(test_id).await?;

        let today = self.clock.today();
        if !test.is_open_on(today) {
            return Err(SessionServiceError::NotOpen { test_id, today });
        }

        self.credentials.check(&key, test_id).await?;

        let mut session = match self.duration_secs {
            Some(secs) => TestSession::new(test.questions().to_vec(), secs)?,
            None => TestSession::for_test(&test)?,
        }
        .with_policy(self.policy);
        info!(
            test_id = %test_id,
            key = %key.masked(),
            duration_secs = session.remaining_secs(),
            "session started"
        );
        session.start(key)?;

        Ok(driver::spawn(
            session,
            DriverContext {
                test_id,
                clock: self.clock,
                started_at: self.clock.now(),
                submissions: Arc::clone(&self.submissions),
            },
        ))
    }

    async fn load_test(&self, test_id: TestId) -> Result<TestDefinition, SessionServiceError> {
        match self.tests.get_test(test_id).await {
            Ok(test) => Ok(test),
            Err(StorageError::NotFound) => Err(SessionServiceError::UnknownTest(test_id)),
            Err(e) => Err(e.into()),
        }
    }
}
