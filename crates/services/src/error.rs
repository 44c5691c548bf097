//! Shared error types for the services crate.

use chrono::NaiveDate;
use thiserror::Error;

use exam_core::model::{TestError, TestId};
use exam_core::session::SessionError;
use storage::repository::StorageError;
use storage::seed::SeedError;

/// Why an access key was not accepted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("an access key is required")]
    Missing,
    #[error("access key is not recognised")]
    Unknown,
    #[error("access key has been revoked")]
    Revoked,
    #[error("access key belongs to {actual}, not {requested}")]
    WrongTest { requested: TestId, actual: TestId },
    #[error(transparent)]
    Storage(StorageError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminServiceError {
    #[error("unknown test {0}")]
    UnknownTest(TestId),
    #[error("student name must not be blank")]
    BlankStudent,
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error("unknown test {0}")]
    UnknownTest(TestId),
    #[error("test {test_id} is not open on {today}")]
    NotOpen { test_id: TestId, today: NaiveDate },
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionServiceError {
    /// True when the session had already finished or been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionServiceError::Session(SessionError::Closed))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
