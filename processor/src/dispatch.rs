//! Fans test cases of one submission out to the execution engine.
use crate::engine::ExecutionEngine;
use futures::FutureExt;
use judge_apis::judge_log::TestCaseResult;
use judge_store::{model::TestCase, ObjectStorage};
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Upper bound on test cases of one submission running at the same time
    pub max_concurrent_executions: usize,
    /// How long to wait for all test cases before cancelling the rest.
    /// Covers time spent queued for a permit, so a submission needs roughly
    /// `ceil(test cases / max_concurrent_executions)` engine round trips
    /// within this window.
    pub grace_period: Duration,
    /// Object storage bucket holding test case inputs and outputs
    pub testcase_bucket: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        DispatchSettings {
            max_concurrent_executions: 5,
            grace_period: Duration::from_secs(30),
            testcase_bucket: "testcases".to_string(),
        }
    }
}

impl DispatchSettings {
    /// Number of test cases that can finish within the grace period when each
    /// one takes `per_test_case`.
    pub fn test_cases_within_grace(&self, per_test_case: Duration) -> usize {
        if per_test_case.is_zero() {
            return usize::MAX;
        }
        let rounds = self.grace_period.as_millis() / per_test_case.as_millis().max(1);
        (rounds as usize).saturating_mul(self.max_concurrent_executions.max(1))
    }
}

pub struct Dispatcher {
    engine: Arc<dyn ExecutionEngine>,
    storage: Arc<dyn ObjectStorage>,
    settings: DispatchSettings,
}

struct Job {
    engine: Arc<dyn ExecutionEngine>,
    storage: Arc<dyn ObjectStorage>,
    bucket: Arc<str>,
    source_code: Arc<str>,
    language: Arc<str>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        storage: Arc<dyn ObjectStorage>,
        settings: DispatchSettings,
    ) -> Dispatcher {
        Dispatcher {
            engine,
            storage,
            settings,
        }
    }

    /// Runs every test case and returns exactly one result per test case, in
    /// the order of `test_cases`.
    ///
    /// Failures of one test case (including panics) only affect its own
    /// result. Test cases still running when the grace period ends are
    /// cancelled and reported as failed.
    #[tracing::instrument(skip(self, source_code, test_cases), fields(test_cases = test_cases.len()))]
    pub async fn execute_all(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCase],
    ) -> Vec<TestCaseResult> {
        if test_cases.is_empty() {
            return Vec::new();
        }
        // Scoped to this call: submissions never compete for permits.
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrent_executions.max(1)));
        let job = Arc::new(Job {
            engine: self.engine.clone(),
            storage: self.storage.clone(),
            bucket: Arc::from(self.settings.testcase_bucket.as_str()),
            source_code: Arc::from(source_code),
            language: Arc::from(language),
        });

        let mut tasks = JoinSet::new();
        for (idx, test_case) in test_cases.iter().cloned().enumerate() {
            let permits = permits.clone();
            let job = job.clone();
            let number = idx as u32 + 1;
            tasks.spawn(
                async move {
                    let _permit = match permits.acquire_owned().await {
                        Ok(p) => p,
                        Err(_) => {
                            return (
                                idx,
                                TestCaseResult::failed(
                                    test_case.id,
                                    number,
                                    test_case.is_sample,
                                    "dispatcher was shut down",
                                ),
                            )
                        }
                    };
                    let outcome = AssertUnwindSafe(run_test_case(&job, &test_case, number))
                        .catch_unwind()
                        .await;
                    let result = outcome.unwrap_or_else(|panic| {
                        let msg = panic_message(panic.as_ref());
                        tracing::error!(test_case_id = test_case.id, panic = %msg, "test case execution panicked");
                        TestCaseResult::failed(
                            test_case.id,
                            number,
                            test_case.is_sample,
                            format!("execution failed: {}", msg),
                        )
                    });
                    (idx, result)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<TestCaseResult>> = vec![None; test_cases.len()];
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((idx, result)) => slots[idx] = Some(result),
                    Err(err) => tracing::error!(error = %err, "test case task failed"),
                }
            }
        };
        if tokio::time::timeout(self.settings.grace_period, collect)
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = tasks.len(),
                grace_period = ?self.settings.grace_period,
                "test cases did not finish in time, cancelling"
            );
            tasks.shutdown().await;
        }

        slots
            .into_iter()
            .zip(test_cases)
            .enumerate()
            .map(|(idx, (slot, test_case))| {
                slot.unwrap_or_else(|| {
                    TestCaseResult::failed(
                        test_case.id,
                        idx as u32 + 1,
                        test_case.is_sample,
                        "execution was cancelled",
                    )
                })
            })
            .collect()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn run_test_case(job: &Job, test_case: &TestCase, number: u32) -> TestCaseResult {
    let failed = |error: String| {
        TestCaseResult::failed(test_case.id, number, test_case.is_sample, error)
    };
    let input = match job.storage.read_string(&test_case.input_path, &job.bucket).await {
        Ok(s) => s,
        Err(err) => return failed(format!("failed to read test input: {}", err)),
    };
    let expected = match job.storage.read_string(&test_case.output_path, &job.bucket).await {
        Ok(s) => s,
        Err(err) => return failed(format!("failed to read expected output: {}", err)),
    };

    match job
        .engine
        .judge(&job.source_code, &job.language, &input, &expected)
        .await
    {
        Ok(res) => {
            let error = if res.verdict.is_accepted() {
                None
            } else {
                [&res.compile_output, &res.stderr, &res.message]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .cloned()
            };
            tracing::debug!(test_case_id = test_case.id, verdict = %res.verdict, "test case judged");
            TestCaseResult {
                test_case_id: test_case.id,
                number,
                verdict: res.verdict,
                time: res.time,
                memory_kb: res.memory_kb,
                input: Some(input),
                expected_output: Some(expected),
                actual_output: Some(res.stdout),
                error,
                is_sample: test_case.is_sample,
            }
        }
        Err(err) => {
            tracing::warn!(test_case_id = test_case.id, error = %err, "test case execution failed");
            TestCaseResult {
                input: Some(input),
                expected_output: Some(expected),
                ..failed(err.to_string())
            }
        }
    }
}
