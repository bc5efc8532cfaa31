//! Wire format of the external execution engine.
//! All free-form text fields travel base64-encoded.
use serde::{Deserialize, Serialize};

/// Body of the asynchronous submit request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineSubmission {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    pub expected_output: String,
    /// Seconds
    pub cpu_time_limit: f64,
    /// Kilobytes
    pub memory_limit: u64,
    /// Kilobytes
    pub max_file_size: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Response to both submit (only `token` is set) and poll requests.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineSubmissionResponse {
    pub token: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub message: Option<String>,
    /// Seconds, as a decimal string
    pub time: Option<String>,
    /// Kilobytes
    pub memory: Option<u64>,
    pub status: Option<EngineStatus>,
}

impl EngineSubmissionResponse {
    /// Status code, with a missing status read as 0 (not yet terminal).
    pub fn status_code(&self) -> u32 {
        self.status.as_ref().map_or(0, |s| s.id)
    }

    /// Execution time in seconds; absent or unparsable values yield `None`.
    pub fn time_seconds(&self) -> Option<f64> {
        self.time.as_deref().and_then(|t| t.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_poll_response() {
        let body = r#"{
            "stdout": "SGVsbG8K",
            "time": "0.012",
            "memory": 3456,
            "status": {"id": 3, "description": "Accepted"},
            "extra_field": true
        }"#;
        let resp: EngineSubmissionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.status_code(), 3);
        assert_eq!(resp.time_seconds(), Some(0.012));
        assert_eq!(resp.memory, Some(3456));
        assert!(resp.stderr.is_none());
    }

    #[test]
    fn missing_status_is_pending() {
        let resp: EngineSubmissionResponse =
            serde_json::from_str(r#"{"token": "abc", "time": "n/a"}"#).unwrap();
        assert_eq!(resp.status_code(), 0);
        assert_eq!(resp.time_seconds(), None);
    }
}
