use std::sync::Arc;

use exam_core::AnswerPolicy;
use exam_core::model::TestId;
use storage::repository::Storage;
use storage::seed::ensure_demo_test;

use crate::Clock;
use crate::admin_service::AdminService;
use crate::credentials::{CredentialCheck, IssuedKeyCredential, NonEmptyCredential};
use crate::error::AppServicesError;
use crate::sessions::ExamLoopService;

/// Knobs the binary passes through from its configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Only admit keys an administrator issued; otherwise any non-empty key works.
    pub require_issued_keys: bool,
    pub policy: AnswerPolicy,
    pub duration_secs: Option<u32>,
}

/// Assembles app-facing services and resolves a usable default test.
#[derive(Clone)]
pub struct AppServices {
    default_test_id: TestId,
    storage: Storage,
    admin: Arc<AdminService>,
    exam_loop: Arc<ExamLoopService>,
}

impl AppServices {
    /// Build services over in-memory storage seeded with the demo test.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if seeding fails.
    pub async fn in_memory(clock: Clock, options: SessionOptions) -> Result<Self, AppServicesError> {
        let storage = Storage::in_memory();
        let default_test_id = ensure_demo_test(storage.tests.as_ref(), clock.today()).await?;

        let credentials: Arc<dyn CredentialCheck> = if options.require_issued_keys {
            Arc::new(IssuedKeyCredential::new(Arc::clone(&storage.keys)))
        } else {
            Arc::new(NonEmptyCredential)
        };

        let admin = Arc::new(AdminService::new(
            clock,
            Arc::clone(&storage.tests),
            Arc::clone(&storage.keys),
        ));
        let exam_loop = Arc::new(
            ExamLoopService::new(
                clock,
                Arc::clone(&storage.tests),
                Arc::clone(&storage.submissions),
                credentials,
            )
            .with_policy(options.policy)
            .with_duration_secs(options.duration_secs),
        );

        Ok(Self {
            default_test_id,
            storage,
            admin,
            exam_loop,
        })
    }

    #[must_use]
    pub fn default_test_id(&self) -> TestId {
        self.default_test_id
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }

    #[must_use]
    pub fn exam_loop(&self) -> Arc<ExamLoopService> {
        Arc::clone(&self.exam_loop)
    }
}
