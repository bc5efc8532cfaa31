//! Client for the external execution engine.
//!
//! Submissions are sent asynchronously and then polled until the engine
//! reports a terminal status.
mod config;
mod error;

pub use config::EngineConfig;
pub use error::EngineError;

use judge_apis::{
    engine::{EngineSubmission, EngineSubmissionResponse},
    language, payload, status, Verdict,
};
use std::sync::Arc;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const AUTH_USER_HEADER: &str = "X-Auth-User";

/// Terminal outcome of one engine submission.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeResult {
    pub verdict: Verdict,
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub message: String,
    /// Seconds
    pub time: Option<f64>,
    pub memory_kb: Option<u64>,
    pub status_code: u32,
    pub status_description: String,
}

impl JudgeResult {
    pub fn from_response(resp: &EngineSubmissionResponse) -> JudgeResult {
        let code = resp.status_code();
        let status_description = match &resp.status {
            Some(s) if !s.description.is_empty() => s.description.clone(),
            _ => status::describe(code).to_string(),
        };
        JudgeResult {
            verdict: status::classify(code),
            stdout: payload::decode_lenient(resp.stdout.as_deref()),
            stderr: payload::decode_lenient(resp.stderr.as_deref()),
            compile_output: payload::decode_lenient(resp.compile_output.as_deref()),
            message: payload::decode_lenient(resp.message.as_deref()),
            time: resp.time_seconds(),
            memory_kb: resp.memory,
            status_code: code,
            status_description,
        }
    }
}

/// Result of a single status fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Still queued or running; carries the engine status code.
    Pending { code: u32 },
    Done(JudgeResult),
}

#[derive(Clone)]
pub struct Client {
    config: Arc<EngineConfig>,
    transport: reqwest::Client,
}

impl Client {
    pub fn new(config: EngineConfig) -> Result<Client, EngineError> {
        let transport = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(EngineError::Setup)?;
        Ok(Client {
            config: Arc::new(config),
            transport,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut req = req;
        if !self.config.auth_token.is_empty() {
            req = req.header(AUTH_TOKEN_HEADER, &self.config.auth_token);
        }
        if !self.config.auth_user.is_empty() {
            req = req.header(AUTH_USER_HEADER, &self.config.auth_user);
        }
        req
    }

    /// Sends a submission without waiting for it to be judged.
    /// Returns the engine token.
    pub async fn submit(
        &self,
        source_code: &str,
        language_name: &str,
        stdin: &str,
        expected_output: &str,
    ) -> Result<String, EngineError> {
        let language_id =
            language::language_id(language_name).ok_or_else(|| EngineError::UnsupportedLanguage {
                language: language_name.to_string(),
            })?;
        let body = EngineSubmission {
            source_code: payload::encode(source_code),
            language_id,
            stdin: payload::encode(stdin),
            expected_output: payload::encode(expected_output),
            cpu_time_limit: self.config.cpu_time_limit,
            memory_limit: self.config.memory_limit,
            max_file_size: self.config.max_file_size,
        };
        let resp = self
            .authorized(self.transport.post(self.url("/submissions")))
            .query(&[("base64_encoded", "true"), ("wait", "false")])
            .json(&body)
            .send()
            .await
            .map_err(EngineError::SubmitTransport)?;
        let http_status = resp.status();
        if !http_status.is_success() {
            return Err(EngineError::SubmitRejected {
                status: http_status.as_u16(),
            });
        }
        let resp: EngineSubmissionResponse = resp.json().await.map_err(EngineError::Decode)?;
        let token = resp
            .token
            .filter(|t| !t.is_empty())
            .ok_or(EngineError::MissingToken)?;
        tracing::debug!(token = %token, language = language_name, "submission accepted by engine");
        Ok(token)
    }

    /// Fetches submission status once.
    pub async fn poll(&self, token: &str) -> Result<PollOutcome, EngineError> {
        let resp = self
            .authorized(self.transport.get(self.url(&format!("/submissions/{}", token))))
            .query(&[("base64_encoded", "true"), ("fields", "*")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| EngineError::PollTransport {
                token: token.to_string(),
                source,
            })?;
        let resp: EngineSubmissionResponse = resp.json().await.map_err(EngineError::Decode)?;
        let code = resp.status_code();
        if !status::is_terminal(code) {
            return Ok(PollOutcome::Pending { code });
        }
        let result = JudgeResult::from_response(&resp);
        tracing::info!(
            token,
            status = %result.status_description,
            verdict = %result.verdict,
            "engine finished submission"
        );
        if !result.stderr.is_empty() {
            tracing::debug!(token, stderr = %result.stderr);
        }
        if !result.compile_output.is_empty() {
            tracing::debug!(token, compile_output = %result.compile_output);
        }
        if !result.message.is_empty() {
            tracing::debug!(token, message = %result.message);
        }
        Ok(PollOutcome::Done(result))
    }

    /// Submits and polls until a terminal status is reported or
    /// `max_retries` status checks have been spent.
    ///
    /// Failed status checks count as attempts and are retried.
    #[tracing::instrument(skip(self, source_code, stdin, expected_output))]
    pub async fn judge(
        &self,
        source_code: &str,
        language_name: &str,
        stdin: &str,
        expected_output: &str,
    ) -> Result<JudgeResult, EngineError> {
        let token = self
            .submit(source_code, language_name, stdin, expected_output)
            .await?;
        let attempts = self.config.max_retries;
        for attempt in 1..=attempts {
            match self.poll(&token).await {
                Ok(PollOutcome::Done(result)) => return Ok(result),
                Ok(PollOutcome::Pending { code }) => {
                    tracing::debug!(token = %token, attempt, code, "still running");
                }
                Err(err) => {
                    tracing::warn!(token = %token, attempt, error = %err, "status check failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
        }
        tracing::warn!(token = %token, attempts, "gave up waiting for engine");
        Err(EngineError::PollTimeout { token, attempts })
    }

    /// Returns whether the engine answers its `/about` endpoint.
    pub async fn check_status(&self) -> bool {
        let res = self
            .authorized(self.transport.get(self.url("/about")))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match res {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "execution engine is unavailable");
                false
            }
        }
    }
}
