//! Types shared between the judge server, its clients and the engine client.
pub mod engine;
pub mod judge_log;
pub mod language;
pub mod live;
pub mod payload;
pub mod rest;
pub mod status;
pub mod verdict;

pub use verdict::Verdict;
