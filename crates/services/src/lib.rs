#![forbid(unsafe_code)]

pub mod admin_service;
pub mod app_services;
pub mod credentials;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use admin_service::{AdminService, TestListItem};
pub use app_services::{AppServices, SessionOptions};
pub use credentials::{CredentialCheck, IssuedKeyCredential, NonEmptyCredential};
pub use error::{AdminServiceError, AppServicesError, CredentialError, SessionServiceError};

pub use sessions::{ExamLoopService, SessionHandle, SessionSnapshot};
