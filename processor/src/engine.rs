use async_trait::async_trait;
use engine_client::{EngineError, JudgeResult};

/// Runs one program on one input. Implemented by the HTTP engine client and
/// by [`FakeEngine`](crate::fake::FakeEngine).
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn judge(
        &self,
        source_code: &str,
        language: &str,
        stdin: &str,
        expected_output: &str,
    ) -> Result<JudgeResult, EngineError>;

    /// Whether the engine is reachable.
    async fn available(&self) -> bool {
        true
    }
}

#[async_trait]
impl ExecutionEngine for engine_client::Client {
    async fn judge(
        &self,
        source_code: &str,
        language: &str,
        stdin: &str,
        expected_output: &str,
    ) -> Result<JudgeResult, EngineError> {
        engine_client::Client::judge(self, source_code, language, stdin, expected_output).await
    }

    async fn available(&self) -> bool {
        self.check_status().await
    }
}
