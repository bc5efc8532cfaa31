use chrono::{DateTime, Utc};
use judge_apis::{live::LiveJudgeStatus, rest::SubmissionView, Verdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub id: u64,
    pub title: String,
    /// Points awarded on the first accepted submission. Unset means default.
    pub score: Option<u32>,
}

/// Reference to a test case's input and expected output in object storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: u64,
    pub problem_id: u64,
    pub input_path: String,
    pub output_path: String,
    pub is_sample: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: u64,
    pub problem_id: u64,
    pub language: String,
    pub source_code: String,
    pub verdict: Verdict,
    pub execution_time_ms: Option<u64>,
    pub memory_kb: Option<u64>,
    pub passed_test_cases: u32,
    pub total_test_cases: u32,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Creates a placeholder record that is being judged.
    pub fn judging(user_id: u64, problem_id: u64, language: &str, source_code: &str) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            user_id,
            problem_id,
            language: language.to_string(),
            source_code: source_code.to_string(),
            verdict: Verdict::Judging,
            execution_time_ms: None,
            memory_kb: None,
            passed_test_cases: 0,
            total_test_cases: 0,
            created_at: Utc::now(),
        }
    }

    /// Live status matching the stored state of the record.
    pub fn live_status(&self) -> LiveJudgeStatus {
        if !self.verdict.is_final() {
            return LiveJudgeStatus {
                verdict: self.verdict,
                ..LiveJudgeStatus::judging(self.id)
            };
        }
        LiveJudgeStatus {
            submission_id: self.id,
            verdict: self.verdict,
            passed: Some(self.passed_test_cases),
            total: Some(self.total_test_cases),
        }
    }

    pub fn view(&self) -> SubmissionView {
        SubmissionView {
            id: self.id,
            user_id: self.user_id,
            problem_id: self.problem_id,
            language: self.language.clone(),
            verdict: self.verdict,
            verdict_name: self.verdict.display_name().to_string(),
            execution_time_ms: self.execution_time_ms,
            memory_kb: self.memory_kb,
            created_at: self.created_at,
            total_test_cases: self.total_test_cases,
            passed_test_cases: self.passed_test_cases,
        }
    }
}

/// Terminal update applied to a submission once judging is over.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub verdict: Verdict,
    pub execution_time_ms: Option<u64>,
    pub memory_kb: Option<u64>,
    pub passed_test_cases: u32,
    pub total_test_cases: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStatistics {
    pub user_id: u64,
    pub solved_count: u32,
    pub ranking_point: u64,
}
