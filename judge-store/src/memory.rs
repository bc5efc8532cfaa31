use crate::{
    model::{Completion, Problem, Submission, TestCase, User, UserStatistics},
    ObjectStorage, ProblemRepository, StatisticsRepository, StoreError, SubmissionRepository,
    UserRepository,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<u64, User>,
    problems: HashMap<u64, Problem>,
    /// In insertion (declaration) order
    test_cases: Vec<TestCase>,
    next_test_case_id: u64,
    /// In insertion order, so the tail holds the newest records
    submissions: Vec<Submission>,
    statistics: HashMap<u64, UserStatistics>,
    solved: HashSet<(u64, u64)>,
}

/// Keeps all records in memory. Implements every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub async fn add_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn add_problem(&self, problem: Problem) {
        self.tables.write().await.problems.insert(problem.id, problem);
    }

    /// Appends a test case to the problem and returns it with its new id.
    pub async fn add_test_case(
        &self,
        problem_id: u64,
        input_path: &str,
        output_path: &str,
        is_sample: bool,
    ) -> TestCase {
        let mut tables = self.tables.write().await;
        tables.next_test_case_id += 1;
        let test_case = TestCase {
            id: tables.next_test_case_id,
            problem_id,
            input_path: input_path.to_string(),
            output_path: output_path.to_string(),
            is_sample,
        };
        tables.test_cases.push(test_case.clone());
        test_case
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl ProblemRepository for MemoryStore {
    async fn find_problem(&self, id: u64) -> Result<Option<Problem>, StoreError> {
        Ok(self.tables.read().await.problems.get(&id).cloned())
    }

    async fn test_cases(&self, problem_id: u64) -> Result<Vec<TestCase>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .test_cases
            .iter()
            .filter(|tc| tc.problem_id == problem_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn insert(&self, submission: Submission) -> Result<(), StoreError> {
        self.tables.write().await.submissions.push(submission);
        Ok(())
    }

    async fn complete(&self, id: Uuid, completion: Completion) -> Result<Submission, StoreError> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("submission", id))?;
        if submission.verdict.is_final() {
            return Err(StoreError::AlreadyFinal(id));
        }
        submission.verdict = completion.verdict;
        submission.execution_time_ms = completion.execution_time_ms;
        submission.memory_kb = completion.memory_kb;
        submission.passed_test_cases = completion.passed_test_cases;
        submission.total_test_cases = completion.total_test_cases;
        Ok(submission.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn by_problem(&self, problem_id: u64) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .filter(|s| s.problem_id == problem_id)
            .cloned()
            .collect())
    }

    async fn recent(&self, page: usize, size: usize) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .rev()
            .skip(page.saturating_mul(size))
            .take(size)
            .cloned()
            .collect())
    }

    async fn count_accepted(&self, user_id: u64, problem_id: u64) -> Result<usize, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.problem_id == problem_id)
            .filter(|s| s.verdict.is_accepted())
            .count())
    }
}

#[async_trait]
impl StatisticsRepository for MemoryStore {
    async fn get(&self, user_id: u64) -> Result<UserStatistics, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .statistics
            .get(&user_id)
            .cloned()
            .unwrap_or(UserStatistics {
                user_id,
                ..UserStatistics::default()
            }))
    }

    async fn record_solve(&self, user_id: u64, problem_id: u64, score: u32) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.solved.insert((user_id, problem_id)) {
            return Ok(false);
        }
        let stats = tables.statistics.entry(user_id).or_insert(UserStatistics {
            user_id,
            ..UserStatistics::default()
        });
        stats.solved_count += 1;
        stats.ranking_point += u64::from(score);
        Ok(true)
    }
}

/// Object storage backed by a map of `(bucket, path)` to contents.
#[derive(Default)]
pub struct MemoryObjects {
    objects: RwLock<HashMap<(String, String), String>>,
}

impl MemoryObjects {
    pub fn new() -> MemoryObjects {
        MemoryObjects::default()
    }

    pub async fn put(&self, bucket: &str, path: &str, contents: impl Into<String>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), path.to_string()), contents.into());
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjects {
    async fn read_string(&self, path: &str, bucket: &str) -> Result<String, StoreError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found("object", format!("{}/{}", bucket, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_apis::Verdict;

    fn accepted() -> Completion {
        Completion {
            verdict: Verdict::Accepted,
            execution_time_ms: Some(12),
            memory_kb: Some(2048),
            passed_test_cases: 1,
            total_test_cases: 1,
        }
    }

    #[tokio::test]
    async fn completion_happens_once() {
        let store = MemoryStore::new();
        let sub = Submission::judging(1, 2, "python", "print(1)");
        let id = sub.id;
        store.insert(sub).await.unwrap();

        let done = store.complete(id, accepted()).await.unwrap();
        assert_eq!(done.verdict, Verdict::Accepted);
        assert_eq!(done.execution_time_ms, Some(12));

        let err = store.complete(id, accepted()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyFinal(x) if x == id));
        assert_eq!(store.count_accepted(1, 2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let sub = Submission::judging(1, i, "c", "");
            ids.push(sub.id);
            store.insert(sub).await.unwrap();
        }
        let first: Vec<_> = store.recent(0, 2).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(first, vec![ids[4], ids[3]]);
        let last: Vec<_> = store.recent(2, 2).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(last, vec![ids[0]]);
        assert!(store.recent(3, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn solve_is_recorded_once() {
        let store = MemoryStore::new();
        assert!(store.record_solve(7, 1, 10).await.unwrap());
        assert!(!store.record_solve(7, 1, 10).await.unwrap());
        assert!(store.record_solve(7, 2, 30).await.unwrap());
        let stats = store.get(7).await.unwrap();
        assert_eq!(stats.solved_count, 2);
        assert_eq!(stats.ranking_point, 40);
        assert_eq!(store.get(8).await.unwrap().solved_count, 0);
    }

    #[tokio::test]
    async fn test_cases_keep_declaration_order() {
        let store = MemoryStore::new();
        let a = store.add_test_case(1, "p1/1.in", "p1/1.out", true).await;
        store.add_test_case(2, "p2/1.in", "p2/1.out", false).await;
        let b = store.add_test_case(1, "p1/2.in", "p1/2.out", false).await;
        assert_eq!(store.test_cases(1).await.unwrap(), vec![a, b]);
    }
}
