use judge_apis::Verdict;
use judge_store::{model::Problem, StatisticsRepository, StoreError, SubmissionRepository};
use std::sync::Arc;

/// Points for problems without an explicit score.
pub const DEFAULT_PROBLEM_SCORE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsChange {
    NotAccepted,
    /// The user had solved this problem before.
    AlreadySolved,
    Awarded { score: u32 },
}

/// Awards a problem's score on a user's first accepted submission for it.
///
/// The solved-pair record in the statistics store is the only deciding
/// check, so racing acceptances award exactly once.
pub struct StatisticsUpdater {
    submissions: Arc<dyn SubmissionRepository>,
    statistics: Arc<dyn StatisticsRepository>,
}

impl StatisticsUpdater {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        statistics: Arc<dyn StatisticsRepository>,
    ) -> StatisticsUpdater {
        StatisticsUpdater {
            submissions,
            statistics,
        }
    }

    /// Must be called after the verdict has been persisted, so the
    /// submission itself is part of the accepted count.
    #[tracing::instrument(skip(self, problem), fields(problem_id = problem.id))]
    pub async fn on_verdict(
        &self,
        user_id: u64,
        problem: &Problem,
        verdict: Verdict,
    ) -> Result<StatisticsChange, StoreError> {
        if !verdict.is_accepted() {
            return Ok(StatisticsChange::NotAccepted);
        }
        let accepted = self.submissions.count_accepted(user_id, problem.id).await?;
        if accepted == 0 {
            tracing::warn!("accepted verdict is not persisted, skipping statistics");
            return Ok(StatisticsChange::NotAccepted);
        }
        let score = problem.score.unwrap_or(DEFAULT_PROBLEM_SCORE);
        // record_solve is atomic per (user, problem) and decides which of
        // several accepted submissions awards the score, whatever the count.
        if !self
            .statistics
            .record_solve(user_id, problem.id, score)
            .await?
        {
            tracing::debug!(accepted, "problem was already solved");
            return Ok(StatisticsChange::AlreadySolved);
        }
        tracing::info!(score, "problem solved for the first time");
        Ok(StatisticsChange::Awarded { score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_store::{
        model::{Completion, Submission},
        MemoryStore,
    };

    async fn accepted_submission(store: &MemoryStore, user_id: u64, problem_id: u64) {
        let sub = Submission::judging(user_id, problem_id, "python", "");
        let id = sub.id;
        store.insert(sub).await.unwrap();
        store
            .complete(
                id,
                Completion {
                    verdict: Verdict::Accepted,
                    execution_time_ms: None,
                    memory_kb: None,
                    passed_test_cases: 1,
                    total_test_cases: 1,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn awards_first_acceptance_only() {
        let store = Arc::new(MemoryStore::new());
        let updater = StatisticsUpdater::new(store.clone(), store.clone());
        let problem = Problem {
            id: 5,
            title: "Sum".to_string(),
            score: Some(25),
        };

        accepted_submission(&store, 1, 5).await;
        let change = updater.on_verdict(1, &problem, Verdict::Accepted).await.unwrap();
        assert_eq!(change, StatisticsChange::Awarded { score: 25 });

        accepted_submission(&store, 1, 5).await;
        let change = updater.on_verdict(1, &problem, Verdict::Accepted).await.unwrap();
        assert_eq!(change, StatisticsChange::AlreadySolved);

        let stats = store.get(1).await.unwrap();
        assert_eq!((stats.solved_count, stats.ranking_point), (1, 25));
    }

    #[tokio::test]
    async fn ignores_other_verdicts_and_defaults_score() {
        let store = Arc::new(MemoryStore::new());
        let updater = StatisticsUpdater::new(store.clone(), store.clone());
        let problem = Problem {
            id: 9,
            title: "Echo".to_string(),
            score: None,
        };
        let change = updater.on_verdict(2, &problem, Verdict::WrongAnswer).await.unwrap();
        assert_eq!(change, StatisticsChange::NotAccepted);
        assert_eq!(store.get(2).await.unwrap().solved_count, 0);

        accepted_submission(&store, 2, 9).await;
        let change = updater.on_verdict(2, &problem, Verdict::Accepted).await.unwrap();
        assert_eq!(change, StatisticsChange::Awarded { score: DEFAULT_PROBLEM_SCORE });
    }

    #[tokio::test]
    async fn racing_first_acceptances_award_once() {
        let store = Arc::new(MemoryStore::new());
        let updater = StatisticsUpdater::new(store.clone(), store.clone());
        let problem = Problem {
            id: 3,
            title: "Race".to_string(),
            score: Some(10),
        };
        // both callers observe a single accepted submission
        accepted_submission(&store, 4, 3).await;
        let (a, b) = tokio::join!(
            updater.on_verdict(4, &problem, Verdict::Accepted),
            updater.on_verdict(4, &problem, Verdict::Accepted)
        );
        let mut changes = vec![a.unwrap(), b.unwrap()];
        changes.sort_by_key(|c| matches!(c, StatisticsChange::Awarded { .. }));
        assert_eq!(
            changes,
            vec![
                StatisticsChange::AlreadySolved,
                StatisticsChange::Awarded { score: 10 }
            ]
        );
        assert_eq!(store.get(4).await.unwrap().ranking_point, 10);
    }

    #[tokio::test]
    async fn acceptances_persisted_before_any_update_award_once() {
        let store = Arc::new(MemoryStore::new());
        let updater = StatisticsUpdater::new(store.clone(), store.clone());
        let problem = Problem {
            id: 3,
            title: "Race".to_string(),
            score: Some(15),
        };
        // both verdicts are stored before either statistics update runs
        accepted_submission(&store, 4, 3).await;
        accepted_submission(&store, 4, 3).await;

        let first = updater.on_verdict(4, &problem, Verdict::Accepted).await.unwrap();
        let second = updater.on_verdict(4, &problem, Verdict::Accepted).await.unwrap();
        assert_eq!(first, StatisticsChange::Awarded { score: 15 });
        assert_eq!(second, StatisticsChange::AlreadySolved);

        let stats = store.get(4).await.unwrap();
        assert_eq!((stats.solved_count, stats.ranking_point), (1, 15));

        // later acceptances keep the single award
        accepted_submission(&store, 4, 3).await;
        let third = updater.on_verdict(4, &problem, Verdict::Accepted).await.unwrap();
        assert_eq!(third, StatisticsChange::AlreadySolved);
        assert_eq!(store.get(4).await.unwrap().ranking_point, 15);
    }
}
