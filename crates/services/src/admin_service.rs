use std::sync::Arc;

use exam_core::model::{AccessKey, TestDefinition, TestDraft, TestId};
use storage::repository::{AccessKeyRecord, AccessKeyRepository, StorageError, TestRepository};
use tracing::info;

use crate::Clock;
use crate::error::AdminServiceError;

/// Fresh keys are random; retry a few times on the unlikely collision.
const KEY_MINT_ATTEMPTS: usize = 3;

/// A catalogue row: the test plus how many students hold keys for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestListItem {
    pub test: TestDefinition,
    pub student_count: usize,
}

/// Test authoring and student access management.
#[derive(Clone)]
pub struct AdminService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    keys: Arc<dyn AccessKeyRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(clock: Clock, tests: Arc<dyn TestRepository>, keys: Arc<dyn AccessKeyRepository>) -> Self {
        Self { clock, tests, keys }
    }

    /// Validate and publish a new test under the next `test-NNN` id.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::Test` for an invalid draft, or storage errors.
    pub async fn create_test(&self, draft: TestDraft) -> Result<TestDefinition, AdminServiceError> {
        let id = self.tests.next_test_id().await?;
        let test = TestDefinition::new(id, draft)?;
        self.tests.upsert_test(&test).await?;
        info!(test_id = %test.id(), title = test.title(), questions = test.questions().len(), "test created");
        Ok(test)
    }

    /// All tests in id order with their student counts.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::Storage` on backend failure.
    pub async fn list_tests(&self) -> Result<Vec<TestListItem>, AdminServiceError> {
        let tests = self.tests.list_tests().await?;
        let mut items = Vec::with_capacity(tests.len());
        for test in tests {
            let student_count = self.keys.keys_for_test(test.id()).await?.len();
            items.push(TestListItem {
                test,
                student_count,
            });
        }
        Ok(items)
    }

    /// Add `student` to `test_id` under a freshly minted key.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::BlankStudent` for an empty name, or
    /// `AdminServiceError::UnknownTest` if the test does not exist.
    pub async fn issue_key(&self, test_id: TestId, student: &str) -> Result<AccessKeyRecord, AdminServiceError> {
        let student = student_name(student)?;
        self.ensure_test(test_id).await?;
        for _ in 0..KEY_MINT_ATTEMPTS {
            match self.store_key(AccessKey::generate(), test_id, student).await {
                Ok(record) => return Ok(record),
                Err(StorageError::Conflict) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::Conflict.into())
    }

    /// Add `student` to `test_id` under an administrator-chosen key.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::BlankStudent`, `AdminServiceError::UnknownTest`,
    /// or `StorageError::Conflict` if the key is taken.
    pub async fn issue_named_key(
        &self,
        test_id: TestId,
        student: &str,
        key: AccessKey,
    ) -> Result<AccessKeyRecord, AdminServiceError> {
        let student = student_name(student)?;
        self.ensure_test(test_id).await?;
        Ok(self.store_key(key, test_id, student).await?)
    }

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown keys.
    pub async fn revoke_key(&self, key: &AccessKey) -> Result<(), AdminServiceError> {
        self.keys.revoke_key(key).await?;
        info!(key = %key.masked(), "access key revoked");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AdminServiceError::Storage` on backend failure.
    pub async fn keys_for(&self, test_id: TestId) -> Result<Vec<AccessKeyRecord>, AdminServiceError> {
        Ok(self.keys.keys_for_test(test_id).await?)
    }

    async fn ensure_test(&self, test_id: TestId) -> Result<(), AdminServiceError> {
        match self.tests.get_test(test_id).await {
            Ok(_) => Ok(()),
            Err(StorageError::NotFound) => Err(AdminServiceError::UnknownTest(test_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_key(
        &self,
        key: AccessKey,
        test_id: TestId,
        student: &str,
    ) -> Result<AccessKeyRecord, StorageError> {
        let record = AccessKeyRecord::new(key, test_id, student, self.clock.now());
        self.keys.insert_key(&record).await?;
        info!(test_id = %test_id, student, key = %record.key.masked(), "access key issued");
        Ok(record)
    }
}

fn student_name(raw: &str) -> Result<&str, AdminServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AdminServiceError::BlankStudent);
    }
    Ok(name)
}
