//! Engine that never leaves the process. Used for local runs without an
//! execution engine and in tests.
//!
//! By default a program "prints" its stdin, so a test case is accepted when its
//! input equals its expected output. Individual inputs can be scripted.
use crate::engine::ExecutionEngine;
use async_trait::async_trait;
use engine_client::{EngineError, JudgeResult};
use judge_apis::{language, status, Verdict};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Scripted behaviour for a given stdin.
#[derive(Debug, Clone, Default)]
pub struct FakeRun {
    /// Output of the program. Defaults to the input.
    pub stdout: Option<String>,
    /// Forced verdict. Defaults to comparing stdout with the expected output.
    pub verdict: Option<Verdict>,
    pub delay: Duration,
    /// Seconds
    pub time: Option<f64>,
    pub memory_kb: Option<u64>,
    /// Behave like an engine that never reports a terminal status.
    pub timeout: bool,
}

impl FakeRun {
    pub fn prints(stdout: impl Into<String>) -> FakeRun {
        FakeRun {
            stdout: Some(stdout.into()),
            ..FakeRun::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> FakeRun {
        self.delay = delay;
        self
    }

    pub fn with_usage(mut self, time: f64, memory_kb: u64) -> FakeRun {
        self.time = Some(time);
        self.memory_kb = Some(memory_kb);
        self
    }
}

#[derive(Default)]
pub struct FakeEngine {
    scripts: HashMap<String, FakeRun>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> FakeEngine {
        FakeEngine::default()
    }

    pub fn with_run(mut self, stdin: impl Into<String>, run: FakeRun) -> FakeEngine {
        self.scripts.insert(stdin.into(), run);
        self
    }

    /// Number of accepted judge calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Largest number of judge calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn run(&self, call: usize, stdin: &str, expected_output: &str) -> Result<JudgeResult, EngineError> {
        let run = self.scripts.get(stdin).cloned().unwrap_or_default();
        if !run.delay.is_zero() {
            tokio::time::sleep(run.delay).await;
        }
        if run.timeout {
            return Err(EngineError::PollTimeout {
                token: format!("fake-{}", call),
                attempts: 0,
            });
        }
        let stdout = run.stdout.unwrap_or_else(|| stdin.to_string());
        let verdict = run.verdict.unwrap_or(if stdout.trim() == expected_output.trim() {
            Verdict::Accepted
        } else {
            Verdict::WrongAnswer
        });
        let row = status::STATUS_TABLE.iter().find(|r| r.verdict == verdict);
        Ok(JudgeResult {
            verdict,
            stdout,
            stderr: String::new(),
            compile_output: String::new(),
            message: String::new(),
            time: run.time,
            memory_kb: run.memory_kb,
            status_code: row.map_or(0, |r| r.code),
            status_description: row.map_or("Unknown status", |r| r.description).to_string(),
        })
    }
}

#[async_trait]
impl ExecutionEngine for FakeEngine {
    async fn judge(
        &self,
        _source_code: &str,
        language_name: &str,
        stdin: &str,
        expected_output: &str,
    ) -> Result<JudgeResult, EngineError> {
        if !language::is_supported(language_name) {
            return Err(EngineError::UnsupportedLanguage {
                language: language_name.to_string(),
            });
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let res = self.run(call, stdin, expected_output).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(call, "fake engine finished");
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_input_by_default() {
        let engine = FakeEngine::new();
        let res = engine.judge("", "python", "A\n", "A").await.unwrap();
        assert_eq!(res.verdict, Verdict::Accepted);
        assert_eq!(res.status_code, 3);
        let res = engine.judge("", "python", "A", "B").await.unwrap();
        assert_eq!(res.verdict, Verdict::WrongAnswer);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn rejects_unknown_language_without_running() {
        let engine = FakeEngine::new();
        let err = engine.judge("", "cobol", "", "").await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage { .. }));
        assert_eq!(engine.calls(), 0);
    }
}
