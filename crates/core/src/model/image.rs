use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS (domain validation) ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Illustration attached to a question: either a local asset path or a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    FilePath(PathBuf),
    Url(Url),
}

impl ImageRef {
    /// Parse a raw reference. Absolute URLs become `Url`, anything else is a path.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` for blank input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        match Url::parse(s) {
            Ok(url) if url.has_host() || url.scheme() == "data" => Ok(ImageRef::Url(url)),
            _ => Ok(ImageRef::FilePath(PathBuf::from(s))),
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageRef::FilePath(p) => Some(p.as_path()),
            ImageRef::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ImageRef::Url(u) => Some(u),
            ImageRef::FilePath(_) => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::FilePath(p) => write!(f, "{}", p.display()),
            ImageRef::Url(u) => write!(f, "{u}"),
        }
    }
}
