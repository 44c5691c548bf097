use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{AccessKey, Submission, TestDefinition, TestId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),
}

/// An issued access key, the student holding it, and the test it admits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyRecord {
    pub key: AccessKey,
    pub test_id: TestId,
    pub student: String,
    pub issued_at: DateTime<Utc>,
    pub revoked: bool,
}

impl AccessKeyRecord {
    #[must_use]
    pub fn new(
        key: AccessKey,
        test_id: TestId,
        student: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            test_id,
            student: student.into(),
            issued_at,
            revoked: false,
        }
    }
}

/// Question source: the catalogue of published tests.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Persist or replace a test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the test cannot be stored.
    async fn upsert_test(&self, test: &TestDefinition) -> Result<(), StorageError>;

    /// Fetch a test by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_test(&self, id: TestId) -> Result<TestDefinition, StorageError>;

    /// All tests ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, StorageError>;

    /// The id the next created test should receive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn next_test_id(&self) -> Result<TestId, StorageError>;
}

#[async_trait]
pub trait AccessKeyRepository: Send + Sync {
    /// Store a newly issued key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the key already exists.
    async fn insert_key(&self, record: &AccessKeyRecord) -> Result<(), StorageError>;

    /// Look up a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown keys.
    async fn get_key(&self, key: &AccessKey) -> Result<AccessKeyRecord, StorageError>;

    /// Mark a key as revoked. Revoking twice is fine.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown keys.
    async fn revoke_key(&self, key: &AccessKey) -> Result<(), StorageError>;

    /// Keys issued for a test, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn keys_for_test(&self, test_id: TestId) -> Result<Vec<AccessKeyRecord>, StorageError>;
}

/// Submission sink for finished sessions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Record a finished attempt and return its sequence number.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be stored.
    async fn record_submission(&self, submission: &Submission) -> Result<u64, StorageError>;

    /// Submissions for a test, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn submissions_for_test(&self, test_id: TestId) -> Result<Vec<Submission>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tests: Arc<Mutex<BTreeMap<TestId, TestDefinition>>>,
    keys: Arc<Mutex<HashMap<AccessKey, AccessKeyRecord>>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn upsert_test(&self, test: &TestDefinition) -> Result<(), StorageError> {
        let mut guard = self.tests.lock().map_err(poisoned)?;
        guard.insert(test.id(), test.clone());
        Ok(())
    }

    async fn get_test(&self, id: TestId) -> Result<TestDefinition, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_tests(&self) -> Result<Vec<TestDefinition>, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn next_test_id(&self) -> Result<TestId, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard
            .keys()
            .next_back()
            .map_or_else(|| TestId::new(1), TestId::next))
    }
}

#[async_trait]
impl AccessKeyRepository for InMemoryRepository {
    async fn insert_key(&self, record: &AccessKeyRecord) -> Result<(), StorageError> {
        let mut guard = self.keys.lock().map_err(poisoned)?;
        if guard.contains_key(&record.key) {
            return Err(StorageError::Conflict);
        }
        guard.insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn get_key(&self, key: &AccessKey) -> Result<AccessKeyRecord, StorageError> {
        let guard = self.keys.lock().map_err(poisoned)?;
        guard.get(key).cloned().ok_or(StorageError::NotFound)
    }

    async fn revoke_key(&self, key: &AccessKey) -> Result<(), StorageError> {
        let mut guard = self.keys.lock().map_err(poisoned)?;
        let record = guard.get_mut(key).ok_or(StorageError::NotFound)?;
        record.revoked = true;
        Ok(())
    }

    async fn keys_for_test(&self, test_id: TestId) -> Result<Vec<AccessKeyRecord>, StorageError> {
        let guard = self.keys.lock().map_err(poisoned)?;
        let mut found: Vec<_> = guard
            .values()
            .filter(|record| record.test_id == test_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.key.cmp(&b.key)));
        Ok(found)
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn record_submission(&self, submission: &Submission) -> Result<u64, StorageError> {
        let mut guard = self.submissions.lock().map_err(poisoned)?;
        guard.push(submission.clone());
        Ok(guard.len() as u64)
    }

    async fn submissions_for_test(&self, test_id: TestId) -> Result<Vec<Submission>, StorageError> {
        let guard = self.submissions.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|s| s.test_id == test_id)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub keys: Arc<dyn AccessKeyRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let tests: Arc<dyn TestRepository> = Arc::new(repo.clone());
        let keys: Arc<dyn AccessKeyRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionRepository> = Arc::new(repo);
        Self {
            tests,
            keys,
            submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Question, QuestionId, TestDraft};
    use exam_core::time::fixed_now;

    fn build_test(id: u32) -> TestDefinition {
        let draft = TestDraft::new(format!("Test {id}"), fixed_now().date_naive())
            .with_question(Question::number(QuestionId::new(1), "Bits in a byte?").unwrap());
        TestDefinition::new(TestId::new(id), draft).unwrap()
    }

    #[tokio::test]
    async fn next_test_id_follows_highest() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.next_test_id().await.unwrap(), TestId::new(1));

        repo.upsert_test(&build_test(1)).await.unwrap();
        repo.upsert_test(&build_test(4)).await.unwrap();
        assert_eq!(repo.next_test_id().await.unwrap(), TestId::new(5));

        let ids: Vec<_> = repo
            .list_tests()
            .await
            .unwrap()
            .iter()
            .map(TestDefinition::id)
            .collect();
        assert_eq!(ids, vec![TestId::new(1), TestId::new(4)]);
    }

    #[tokio::test]
    async fn missing_test_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_test(TestId::new(9)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn keys_conflict_and_revoke() {
        let repo = InMemoryRepository::new();
        let key = AccessKey::parse("KEY-1").unwrap();
        let record = AccessKeyRecord::new(key.clone(), TestId::new(1), "Ivan Ivanov", fixed_now());

        repo.insert_key(&record).await.unwrap();
        assert!(matches!(
            repo.insert_key(&record).await.unwrap_err(),
            StorageError::Conflict
        ));

        repo.revoke_key(&key).await.unwrap();
        repo.revoke_key(&key).await.unwrap();
        let stored = repo.get_key(&key).await.unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.student, "Ivan Ivanov");

        let unknown = AccessKey::parse("NOPE").unwrap();
        assert!(matches!(
            repo.revoke_key(&unknown).await.unwrap_err(),
            StorageError::NotFound
        ));
        assert_eq!(repo.keys_for_test(TestId::new(1)).await.unwrap().len(), 1);
        assert!(repo.keys_for_test(TestId::new(2)).await.unwrap().is_empty());
    }
}
