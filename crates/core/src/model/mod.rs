mod access_key;
mod answer;
mod ids;
mod image;
mod question;
mod submission;
mod test_definition;

pub use ids::{ParseIdError, QuestionId, TestId};
pub use image::{ImageRef, ImageRefError};

pub use access_key::{AccessKey, AccessKeyError};
pub use answer::{Answer, AnswerSheet, AnswerStatus};
pub use question::{Question, QuestionError, QuestionKind};
pub use submission::{FinishReason, SessionOutcome, Submission};
pub use test_definition::{DEFAULT_DURATION_MINUTES, TestDefinition, TestDraft, TestError};
