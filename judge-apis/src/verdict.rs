use serde::{Deserialize, Serialize};
use std::fmt;

/// Judging outcome of a submission or of a single test case.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Waiting,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompileError,
}

impl Verdict {
    /// Human-readable name, as shown to contestants.
    pub fn display_name(self) -> &'static str {
        match self {
            Verdict::Waiting => "Waiting",
            Verdict::Judging => "Judging",
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit",
            Verdict::MemoryLimitExceeded => "Memory Limit",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::CompileError => "Compile Error",
        }
    }

    /// Returns false while the submission is still queued or being judged.
    pub fn is_final(self) -> bool {
        !matches!(self, Verdict::Waiting | Verdict::Judging)
    }

    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finality() {
        assert!(!Verdict::Waiting.is_final());
        assert!(!Verdict::Judging.is_final());
        for v in [
            Verdict::Accepted,
            Verdict::WrongAnswer,
            Verdict::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded,
            Verdict::RuntimeError,
            Verdict::CompileError,
        ] {
            assert!(v.is_final(), "{:?}", v);
        }
    }

    #[test]
    fn wire_names() {
        let s = serde_json::to_string(&Verdict::TimeLimitExceeded).unwrap();
        assert_eq!(s, "\"TIME_LIMIT_EXCEEDED\"");
        let v: Verdict = serde_json::from_str("\"WRONG_ANSWER\"").unwrap();
        assert_eq!(v, Verdict::WrongAnswer);
        assert_eq!(Verdict::WrongAnswer.to_string(), "Wrong Answer");
    }
}
