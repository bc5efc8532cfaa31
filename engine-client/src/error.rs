use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Raised before any request is sent.
    #[error("language `{language}` is not supported")]
    UnsupportedLanguage { language: String },
    #[error("failed to send submission")]
    SubmitTransport(#[source] reqwest::Error),
    #[error("engine rejected submission with HTTP status {status}")]
    SubmitRejected { status: u16 },
    #[error("engine did not return a submission token")]
    MissingToken,
    #[error("failed to fetch status of submission {token}")]
    PollTransport {
        token: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("submission {token} did not finish after {attempts} status checks")]
    PollTimeout { token: String, attempts: u32 },
    #[error("failed to decode engine response")]
    Decode(#[source] reqwest::Error),
    #[error("failed to initialize HTTP client")]
    Setup(#[source] reqwest::Error),
}
