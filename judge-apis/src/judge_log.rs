//! Detailed information about testing of a single test case.
use crate::Verdict;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestCaseResult {
    pub test_case_id: u64,
    /// 1-based position in declaration order
    pub number: u32,
    pub verdict: Verdict,
    /// Seconds
    pub time: Option<f64>,
    pub memory_kb: Option<u64>,
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
    pub error: Option<String>,
    pub is_sample: bool,
}

impl TestCaseResult {
    /// Result for a test case that could not be executed.
    pub fn failed(test_case_id: u64, number: u32, is_sample: bool, error: impl Into<String>) -> Self {
        TestCaseResult {
            test_case_id,
            number,
            verdict: Verdict::RuntimeError,
            time: None,
            memory_kb: None,
            input: None,
            expected_output: None,
            actual_output: None,
            error: Some(error.into()),
            is_sample,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }
}
