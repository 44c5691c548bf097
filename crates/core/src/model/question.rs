use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::image::ImageRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("{kind} question requires at least one option")]
    MissingOptions { kind: QuestionKind },

    #[error("number question cannot carry options")]
    UnexpectedOptions,

    #[error("option #{index} is blank")]
    BlankOption { index: usize },

    #[error("option `{0}` is listed more than once")]
    DuplicateOption(String),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Exactly one option may be selected.
    Single,
    /// Any subset of options may be selected.
    Multiple,
    /// Free-form numeric entry.
    Number,
}

impl QuestionKind {
    #[must_use]
    pub fn requires_options(self) -> bool {
        matches!(self, QuestionKind::Single | QuestionKind::Multiple)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::Number => "number",
        };
        f.write_str(label)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single test question.
///
/// Choice questions always carry a non-empty list of distinct, non-blank
/// options; number questions carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    image: Option<ImageRef>,
    options: Vec<String>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or the options do not fit the kind.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        prompt: impl Into<String>,
        image: Option<ImageRef>,
        options: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        if kind.requires_options() {
            if options.is_empty() {
                return Err(QuestionError::MissingOptions { kind });
            }
            let mut seen = HashSet::with_capacity(options.len());
            for (index, option) in options.iter().enumerate() {
                if option.trim().is_empty() {
                    return Err(QuestionError::BlankOption { index });
                }
                if !seen.insert(option.as_str()) {
                    return Err(QuestionError::DuplicateOption(option.clone()));
                }
            }
        } else if !options.is_empty() {
            return Err(QuestionError::UnexpectedOptions);
        }

        Ok(Self {
            id,
            kind,
            prompt,
            image,
            options,
        })
    }

    /// Shorthand for a single-choice question without an image.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn single<I, S>(id: QuestionId, prompt: impl Into<String>, options: I) -> Result<Self, QuestionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            QuestionKind::Single,
            prompt,
            None,
            options.into_iter().map(Into::into).collect(),
        )
    }

    /// Shorthand for a multiple-choice question without an image.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn multiple<I, S>(id: QuestionId, prompt: impl Into<String>, options: I) -> Result<Self, QuestionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            QuestionKind::Multiple,
            prompt,
            None,
            options.into_iter().map(Into::into).collect(),
        )
    }

    /// Shorthand for a numeric-entry question without an image.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn number(id: QuestionId, prompt: impl Into<String>) -> Result<Self, QuestionError> {
        Self::new(id, QuestionKind::Number, prompt, None, Vec::new())
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Options in display order; `None` for number questions.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        if self.kind.requires_options() {
            Some(&self.options)
        } else {
            None
        }
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}
