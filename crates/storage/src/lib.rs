#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;

pub use repository::{
    AccessKeyRecord, AccessKeyRepository, InMemoryRepository, Storage, StorageError,
    SubmissionRepository, TestRepository,
};
