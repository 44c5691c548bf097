use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{AccessKey, TestId};
use storage::repository::{AccessKeyRepository, StorageError};

use crate::error::CredentialError;

/// Decides whether an access key admits its holder to a test.
#[async_trait]
pub trait CredentialCheck: Send + Sync {
    /// # Errors
    ///
    /// Returns `CredentialError` when the key must not start a session.
    async fn check(&self, key: &AccessKey, test_id: TestId) -> Result<(), CredentialError>;
}

/// Accepts any non-empty key. `AccessKey` cannot be empty, so this always passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyCredential;

#[async_trait]
impl CredentialCheck for NonEmptyCredential {
    async fn check(&self, _key: &AccessKey, _test_id: TestId) -> Result<(), CredentialError> {
        Ok(())
    }
}

/// Accepts only keys an administrator issued for the requested test and has not revoked.
#[derive(Clone)]
pub struct IssuedKeyCredential {
    keys: Arc<dyn AccessKeyRepository>,
}

impl IssuedKeyCredential {
    #[must_use]
    pub fn new(keys: Arc<dyn AccessKeyRepository>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl CredentialCheck for IssuedKeyCredential {
    async fn check(&self, key: &AccessKey, test_id: TestId) -> Result<(), CredentialError> {
        let record = match self.keys.get_key(key).await {
            Ok(record) => record,
            Err(StorageError::NotFound) => return Err(CredentialError::Unknown),
            Err(e) => return Err(CredentialError::Storage(e)),
        };
        if record.revoked {
            return Err(CredentialError::Revoked);
        }
        if record.test_id != test_id {
            return Err(CredentialError::WrongTest {
                requested: test_id,
                actual: record.test_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;
    use storage::repository::{AccessKeyRecord, InMemoryRepository};

    #[tokio::test]
    async fn issued_key_rules() {
        let repo = InMemoryRepository::new();
        let good = AccessKey::parse("GOOD").unwrap();
        let revoked = AccessKey::parse("GONE").unwrap();
        repo.insert_key(&AccessKeyRecord::new(good.clone(), TestId::new(1), "Anna", fixed_now()))
            .await
            .unwrap();
        repo.insert_key(&AccessKeyRecord::new(revoked.clone(), TestId::new(1), "Boris", fixed_now()))
            .await
            .unwrap();
        repo.revoke_key(&revoked).await.unwrap();

        let check = IssuedKeyCredential::new(Arc::new(repo));
        check.check(&good, TestId::new(1)).await.unwrap();
        assert!(matches!(
            check.check(&revoked, TestId::new(1)).await,
            Err(CredentialError::Revoked)
        ));
        assert!(matches!(
            check.check(&good, TestId::new(2)).await,
            Err(CredentialError::WrongTest { .. })
        ));
        assert!(matches!(
            check.check(&AccessKey::parse("WHO").unwrap(), TestId::new(1)).await,
            Err(CredentialError::Unknown)
        ));
    }

    #[tokio::test]
    async fn non_empty_accepts_anything_parsed() {
        let key = AccessKey::parse("anything").unwrap();
        NonEmptyCredential.check(&key, TestId::new(7)).await.unwrap();
    }
}
