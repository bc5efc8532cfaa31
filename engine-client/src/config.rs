use std::time::Duration;

/// Connection settings and resource limits for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Sent as `X-Auth-Token` when non-empty
    pub auth_token: String,
    /// Sent as `X-Auth-User` when non-empty
    pub auth_user: String,
    /// Seconds
    pub cpu_time_limit: f64,
    /// Kilobytes
    pub memory_limit: u64,
    /// Kilobytes
    pub max_file_size: u64,
    /// Number of status fetches before giving up on a submission
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Timeout of a single HTTP request
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_url: "http://localhost:2358".to_string(),
            auth_token: String::new(),
            auth_user: String::new(),
            cpu_time_limit: 5.0,
            memory_limit: 262_144,
            max_file_size: 1024,
            max_retries: 10,
            retry_delay_ms: 1000,
            request_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
