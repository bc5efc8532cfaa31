//! Persistence collaborators of the judge: users, problems with their test
//! cases, submissions, user statistics and object storage for test data.

mod catalog;
mod fs;
mod memory;
pub mod model;

pub use catalog::{load_catalog, CatalogSummary};
pub use fs::FsStorage;
pub use memory::{MemoryObjects, MemoryStore};

use async_trait::async_trait;
use model::{Completion, Problem, Submission, TestCase, User, UserStatistics};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },
    #[error("submission {0} already has a final verdict")]
    AlreadyFinal(Uuid),
    #[error("object path `{0}` escapes its bucket")]
    InvalidPath(String),
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest at {}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(what: &'static str, id: impl ToString) -> StoreError {
        StoreError::NotFound {
            what,
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn find_problem(&self, id: u64) -> Result<Option<Problem>, StoreError>;
    /// Test cases of the problem in declaration order.
    async fn test_cases(&self, problem_id: u64) -> Result<Vec<TestCase>, StoreError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: Submission) -> Result<(), StoreError>;
    /// Applies the terminal verdict. Fails if the submission is already final.
    async fn complete(&self, id: Uuid, completion: Completion) -> Result<Submission, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;
    async fn by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError>;
    async fn by_problem(&self, problem_id: u64) -> Result<Vec<Submission>, StoreError>;
    /// Newest first.
    async fn recent(&self, page: usize, size: usize) -> Result<Vec<Submission>, StoreError>;
    async fn count_accepted(&self, user_id: u64, problem_id: u64) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    async fn get(&self, user_id: u64) -> Result<UserStatistics, StoreError>;
    /// Marks `problem_id` solved by `user_id` and awards `score`.
    /// Returns false without changing anything if the pair was already recorded.
    async fn record_solve(&self, user_id: u64, problem_id: u64, score: u32) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn read_string(&self, path: &str, bucket: &str) -> Result<String, StoreError>;
}
