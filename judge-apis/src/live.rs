use crate::Verdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Describes current judging status of particular submission.
/// Pushed to subscribers while judging is in progress.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LiveJudgeStatus {
    pub submission_id: Uuid,
    pub verdict: Verdict,
    /// Number of accepted test cases. None until judging has finished.
    pub passed: Option<u32>,
    pub total: Option<u32>,
}

impl LiveJudgeStatus {
    pub fn judging(submission_id: Uuid) -> Self {
        LiveJudgeStatus {
            submission_id,
            verdict: Verdict::Judging,
            passed: None,
            total: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.verdict.is_final()
    }
}
