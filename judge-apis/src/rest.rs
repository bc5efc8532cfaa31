use crate::{judge_log::TestCaseResult, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submit request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmitRequest {
    pub user_id: u64,
    pub problem_id: u64,
    /// Language name, matched case-insensitively
    pub language: String,
    pub source_code: String,
}

/// Query of `POST /submissions`
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SubmitQuery {
    /// When false, the placeholder is returned at once and judging continues
    /// in the background.
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

impl Default for SubmitQuery {
    fn default() -> Self {
        SubmitQuery { wait: true }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SampleRunRequest {
    pub language: String,
    pub source_code: String,
}

/// Information about a submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionView {
    pub id: Uuid,
    pub user_id: u64,
    pub problem_id: u64,
    pub language: String,
    pub verdict: Verdict,
    pub verdict_name: String,
    pub execution_time_ms: Option<u64>,
    pub memory_kb: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub total_test_cases: u32,
    pub passed_test_cases: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SampleRunView {
    pub problem_id: u64,
    pub results: Vec<TestCaseResult>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LanguageView {
    pub name: String,
    pub id: u32,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct EngineStatusView {
    pub available: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    20
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: String,
}
