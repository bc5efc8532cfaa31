//! Engine status vocabulary.
//!
//! Codes below [`FIRST_TERMINAL_CODE`] mean the submission is still queued or
//! running. Several engine failure codes collapse onto `RuntimeError`.
use crate::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRow {
    pub code: u32,
    pub verdict: Verdict,
    pub description: &'static str,
}

const fn row(code: u32, verdict: Verdict, description: &'static str) -> StatusRow {
    StatusRow {
        code,
        verdict,
        description,
    }
}

pub const FIRST_TERMINAL_CODE: u32 = 3;

pub const STATUS_TABLE: &[StatusRow] = &[
    row(1, Verdict::Waiting, "In Queue"),
    row(2, Verdict::Judging, "Processing"),
    row(3, Verdict::Accepted, "Accepted"),
    row(4, Verdict::WrongAnswer, "Wrong Answer"),
    row(5, Verdict::TimeLimitExceeded, "Time Limit Exceeded"),
    row(6, Verdict::CompileError, "Compilation Error"),
    row(7, Verdict::RuntimeError, "Runtime Error (SIGSEGV)"),
    row(8, Verdict::RuntimeError, "Runtime Error (SIGXFSZ)"),
    row(9, Verdict::RuntimeError, "Runtime Error (SIGFPE)"),
    row(10, Verdict::RuntimeError, "Runtime Error (SIGABRT)"),
    row(11, Verdict::RuntimeError, "Runtime Error (NZEC)"),
    row(12, Verdict::RuntimeError, "Runtime Error (Other)"),
    row(13, Verdict::RuntimeError, "Internal Error"),
    row(14, Verdict::RuntimeError, "Exec Format Error"),
];

fn lookup(code: u32) -> Option<&'static StatusRow> {
    STATUS_TABLE.iter().find(|r| r.code == code)
}

/// Maps an engine status code onto a verdict. Unknown codes are runtime errors.
pub fn classify(code: u32) -> Verdict {
    lookup(code).map_or(Verdict::RuntimeError, |r| r.verdict)
}

pub fn is_terminal(code: u32) -> bool {
    code >= FIRST_TERMINAL_CODE
}

pub fn describe(code: u32) -> &'static str {
    lookup(code).map_or("Unknown status", |r| r.description)
}
