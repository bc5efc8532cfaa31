//! Combines per-test-case results into the verdict of a submission.
use judge_apis::{judge_log::TestCaseResult, Verdict};
use judge_store::model::{Completion, TestCase};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeSummary {
    pub verdict: Verdict,
    pub total: u32,
    pub passed: u32,
    /// Largest execution time among test cases, seconds
    pub max_time: f64,
    pub max_memory_kb: u64,
    /// Set when the problem had nothing to judge against
    pub no_test_cases: bool,
    /// In declaration order
    pub results: Vec<TestCaseResult>,
}

impl JudgeSummary {
    pub fn no_test_cases() -> JudgeSummary {
        JudgeSummary {
            no_test_cases: true,
            ..JudgeSummary::failed()
        }
    }

    /// Summary for a submission that could not be judged at all.
    pub fn failed() -> JudgeSummary {
        JudgeSummary {
            verdict: Verdict::RuntimeError,
            total: 0,
            passed: 0,
            max_time: 0.0,
            max_memory_kb: 0,
            no_test_cases: false,
            results: Vec::new(),
        }
    }

    /// Terminal update for the submission record. Zero metrics are stored
    /// as absent.
    pub fn completion(&self) -> Completion {
        let time_ms = (self.max_time * 1000.0).round();
        Completion {
            verdict: self.verdict,
            execution_time_ms: (time_ms > 0.0).then(|| time_ms as u64),
            memory_kb: (self.max_memory_kb > 0).then(|| self.max_memory_kb),
            passed_test_cases: self.passed,
            total_test_cases: self.total,
        }
    }
}

/// The verdict is the one of the first non-accepted test case in declaration
/// order, regardless of the order in which results arrived.
pub fn aggregate(test_cases: &[TestCase], results: Vec<TestCaseResult>) -> JudgeSummary {
    if test_cases.is_empty() {
        return JudgeSummary::no_test_cases();
    }
    let mut by_id: HashMap<u64, TestCaseResult> =
        results.into_iter().map(|r| (r.test_case_id, r)).collect();
    let ordered: Vec<TestCaseResult> = test_cases
        .iter()
        .enumerate()
        .map(|(idx, tc)| {
            by_id.remove(&tc.id).unwrap_or_else(|| {
                TestCaseResult::failed(tc.id, idx as u32 + 1, tc.is_sample, "no result was produced")
            })
        })
        .collect();

    let verdict = ordered
        .iter()
        .find(|r| !r.is_accepted())
        .map_or(Verdict::Accepted, |r| r.verdict);
    let passed = ordered.iter().filter(|r| r.is_accepted()).count() as u32;
    let max_time = ordered
        .iter()
        .filter_map(|r| r.time)
        .fold(0.0_f64, f64::max);
    let max_memory_kb = ordered
        .iter()
        .filter_map(|r| r.memory_kb)
        .max()
        .unwrap_or(0);

    JudgeSummary {
        verdict,
        total: ordered.len() as u32,
        passed,
        max_time,
        max_memory_kb,
        no_test_cases: false,
        results: ordered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: u64) -> TestCase {
        TestCase {
            id,
            problem_id: 1,
            input_path: format!("{}.in", id),
            output_path: format!("{}.out", id),
            is_sample: false,
        }
    }

    fn result(id: u64, verdict: Verdict, time: Option<f64>, memory_kb: Option<u64>) -> TestCaseResult {
        TestCaseResult {
            verdict,
            time,
            memory_kb,
            error: None,
            ..TestCaseResult::failed(id, id as u32, false, "")
        }
    }

    #[test]
    fn first_failure_in_declaration_order_wins() {
        let cases = [case(1), case(2), case(3)];
        // arrival order differs from declaration order
        let results = vec![
            result(3, Verdict::WrongAnswer, None, None),
            result(2, Verdict::TimeLimitExceeded, None, None),
            result(1, Verdict::Accepted, None, None),
        ];
        let summary = aggregate(&cases, results);
        assert_eq!(summary.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.total, 3);
        let ids: Vec<_> = summary.results.iter().map(|r| r.test_case_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn all_accepted_with_maxima() {
        let cases = [case(1), case(2)];
        let results = vec![
            result(1, Verdict::Accepted, Some(0.25), Some(1024)),
            result(2, Verdict::Accepted, Some(0.1), Some(4096)),
        ];
        let summary = aggregate(&cases, results);
        assert_eq!(summary.verdict, Verdict::Accepted);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.max_time, 0.25);
        assert_eq!(summary.max_memory_kb, 4096);

        let completion = summary.completion();
        assert_eq!(completion.execution_time_ms, Some(250));
        assert_eq!(completion.memory_kb, Some(4096));
    }

    #[test]
    fn zero_metrics_are_absent() {
        let summary = aggregate(&[case(1)], vec![result(1, Verdict::Accepted, None, None)]);
        let completion = summary.completion();
        assert_eq!(completion.execution_time_ms, None);
        assert_eq!(completion.memory_kb, None);
    }

    #[test]
    fn no_test_cases_is_a_failure() {
        let summary = aggregate(&[], Vec::new());
        assert!(summary.no_test_cases);
        assert_eq!(summary.verdict, Verdict::RuntimeError);
        assert_eq!((summary.passed, summary.total), (0, 0));
    }

    #[test]
    fn missing_result_counts_as_failure() {
        let summary = aggregate(&[case(1), case(2)], vec![result(1, Verdict::Accepted, None, None)]);
        assert_eq!(summary.verdict, Verdict::RuntimeError);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[1].error.as_deref(), Some("no result was produced"));
    }
}
