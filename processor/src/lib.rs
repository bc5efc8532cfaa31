//! Processor is the part of judge that deals with a single submission: it
//! runs the submission on every test case of its problem, combines the
//! results into a verdict, stores it and updates user statistics.

mod aggregate;
mod dispatch;
mod engine;
pub mod fake;
mod notify;
mod statistics;

pub use aggregate::{aggregate, JudgeSummary};
pub use dispatch::{DispatchSettings, Dispatcher};
pub use engine::ExecutionEngine;
pub use notify::Notifier;
pub use statistics::{StatisticsChange, StatisticsUpdater, DEFAULT_PROBLEM_SCORE};

use judge_apis::{judge_log::TestCaseResult, live::LiveJudgeStatus};
use judge_store::{
    model::{Problem, Submission},
    MemoryStore, ObjectStorage, ProblemRepository, StatisticsRepository, StoreError,
    SubmissionRepository, UserRepository,
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Contains the execution engine and all storage collaborators
#[derive(Clone)]
pub struct Clients {
    pub engine: Arc<dyn ExecutionEngine>,
    pub users: Arc<dyn UserRepository>,
    pub problems: Arc<dyn ProblemRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl Clients {
    /// Uses `store` for every repository.
    pub fn with_store(
        engine: Arc<dyn ExecutionEngine>,
        store: Arc<MemoryStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Clients {
        Clients {
            engine,
            users: store.clone(),
            problems: store.clone(),
            submissions: store.clone(),
            statistics: store,
            storage,
        }
    }
}

/// Settings are global rather than come from a request.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub dispatch: DispatchSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("user {0} not found")]
    UserNotFound(u64),
    #[error("problem {0} not found")]
    ProblemNotFound(u64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Judged submission together with the per-test-case details.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub submission: Submission,
    pub summary: JudgeSummary,
}

/// Drives submissions from creation to their final verdict.
#[derive(Clone)]
pub struct Orchestrator {
    clients: Clients,
    dispatcher: Arc<Dispatcher>,
    statistics: Arc<StatisticsUpdater>,
    notifier: Notifier,
}

impl Orchestrator {
    pub fn new(clients: Clients, settings: Settings) -> Orchestrator {
        let dispatcher = Dispatcher::new(
            clients.engine.clone(),
            clients.storage.clone(),
            settings.dispatch,
        );
        let statistics =
            StatisticsUpdater::new(clients.submissions.clone(), clients.statistics.clone());
        Orchestrator {
            clients,
            dispatcher: Arc::new(dispatcher),
            statistics: Arc::new(statistics),
            notifier: Notifier::new(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn engine_available(&self) -> bool {
        self.clients.engine.available().await
    }

    /// Creates a submission and judges it. Returns once the final verdict has
    /// been stored.
    #[tracing::instrument(skip(self, source_code))]
    pub async fn submit(
        &self,
        user_id: u64,
        problem_id: u64,
        language: &str,
        source_code: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let (submission, problem) = self
            .create(user_id, problem_id, language, source_code)
            .await?;
        self.judge_submission(submission, problem).await
    }

    /// Creates a submission and judges it in a background task. Returns the
    /// record in its `JUDGING` state.
    #[tracing::instrument(skip(self, source_code))]
    pub async fn submit_in_background(
        &self,
        user_id: u64,
        problem_id: u64,
        language: &str,
        source_code: &str,
    ) -> Result<Submission, SubmitError> {
        let (submission, problem) = self
            .create(user_id, problem_id, language, source_code)
            .await?;
        let placeholder = submission.clone();
        let this = self.clone();
        tokio::task::spawn(
            async move {
                if let Err(err) = this.judge_submission(submission, problem).await {
                    tracing::error!(error = %err, "background judging failed");
                }
            }
            .in_current_span(),
        );
        Ok(placeholder)
    }

    async fn create(
        &self,
        user_id: u64,
        problem_id: u64,
        language: &str,
        source_code: &str,
    ) -> Result<(Submission, Problem), SubmitError> {
        if self.clients.users.find_user(user_id).await?.is_none() {
            return Err(SubmitError::UserNotFound(user_id));
        }
        let problem = self
            .clients
            .problems
            .find_problem(problem_id)
            .await?
            .ok_or(SubmitError::ProblemNotFound(problem_id))?;
        let submission = Submission::judging(user_id, problem_id, language, source_code);
        self.clients.submissions.insert(submission.clone()).await?;
        tracing::info!(submission_id = %submission.id, "submission created");
        Ok((submission, problem))
    }

    #[tracing::instrument(skip(self, submission, problem), fields(submission_id = %submission.id))]
    async fn judge_submission(
        &self,
        submission: Submission,
        problem: Problem,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let id = submission.id;
        self.notifier.publish(LiveJudgeStatus::judging(id)).await;

        let summary = match self.clients.problems.test_cases(problem.id).await {
            Ok(test_cases) if test_cases.is_empty() => {
                tracing::warn!(problem_id = problem.id, "problem has no test cases");
                JudgeSummary::no_test_cases()
            }
            Ok(test_cases) => {
                let results = self
                    .dispatcher
                    .execute_all(&submission.source_code, &submission.language, &test_cases)
                    .await;
                aggregate(&test_cases, results)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load test cases");
                JudgeSummary::failed()
            }
        };

        let stored = match self
            .clients
            .submissions
            .complete(id, summary.completion())
            .await
        {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(error = %err, "failed to store verdict");
                self.publish_stored(id).await;
                return Err(err.into());
            }
        };
        self.notifier.publish(stored.live_status()).await;
        tracing::info!(
            verdict = %stored.verdict,
            passed = summary.passed,
            total = summary.total,
            "submission judged"
        );

        // The stored verdict stands whatever happens to statistics.
        match self
            .statistics
            .on_verdict(stored.user_id, &problem, stored.verdict)
            .await
        {
            Ok(change) => tracing::debug!(?change, "statistics updated"),
            Err(err) => tracing::warn!(error = %err, "failed to update user statistics"),
        }

        Ok(SubmissionOutcome {
            submission: stored,
            summary,
        })
    }

    /// Tells subscribers the verdict that is actually stored. Subscribers are
    /// dropped if there is none.
    async fn publish_stored(&self, id: Uuid) {
        match self.clients.submissions.find(id).await {
            Ok(Some(current)) if current.verdict.is_final() => {
                self.notifier.publish(current.live_status()).await
            }
            _ => self.notifier.close(id).await,
        }
    }

    /// Runs the source on the sample test cases of a problem without storing
    /// anything. Results are in declaration order.
    #[tracing::instrument(skip(self, source_code))]
    pub async fn run_sample_only(
        &self,
        problem_id: u64,
        source_code: &str,
        language: &str,
    ) -> Result<Vec<TestCaseResult>, SubmitError> {
        if self.clients.problems.find_problem(problem_id).await?.is_none() {
            return Err(SubmitError::ProblemNotFound(problem_id));
        }
        let samples: Vec<_> = self
            .clients
            .problems
            .test_cases(problem_id)
            .await?
            .into_iter()
            .filter(|tc| tc.is_sample)
            .collect();
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        let results = self
            .dispatcher
            .execute_all(source_code, language, &samples)
            .await;
        Ok(aggregate(&samples, results).results)
    }

    pub async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        self.clients.submissions.find(id).await
    }

    pub async fn submissions_by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError> {
        self.clients.submissions.by_user(user_id).await
    }

    pub async fn submissions_by_problem(
        &self,
        problem_id: u64,
    ) -> Result<Vec<Submission>, StoreError> {
        self.clients.submissions.by_problem(problem_id).await
    }

    /// Newest first.
    pub async fn recent_submissions(
        &self,
        page: usize,
        size: usize,
    ) -> Result<Vec<Submission>, StoreError> {
        self.clients.submissions.recent(page, size).await
    }
}
