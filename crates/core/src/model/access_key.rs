use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessKeyError {
    #[error("access key cannot be empty")]
    Empty,
}

/// Opaque credential that admits a respondent to a test session.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    /// Parse a key as typed by a respondent; surrounding whitespace is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AccessKeyError::Empty` if nothing remains after trimming.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, AccessKeyError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(AccessKeyError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// Mint a fresh random key in `XXXX-XXXX-XXXX` form.
    #[must_use]
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Self(format!("{}-{}-{}", &raw[0..4], &raw[4..8], &raw[8..12]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form safe for logs: the first four characters only.
    #[must_use]
    pub fn masked(&self) -> String {
        let head: String = self.0.chars().take(4).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessKey({})", self.masked())
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
