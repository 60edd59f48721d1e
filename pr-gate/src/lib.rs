//! Core workflow engine for the PR comprehension gate.
//!
//! One pipeline per webhook event:
//!
//! 1) **Credentials** — exchange a signed app assertion for a scoped
//!    installation token, cached per installation (`auth`).
//! 2) **Diff extraction** — turn the PR's changed files into a bounded
//!    transcript, a content fingerprint, and a size classification (`diff`).
//! 3) **Orchestration** — LLM-backed question generation and answer grading
//!    with strict output-contract validation and fixed fallbacks (`review`).
//! 4) **State machine** — idempotent review-record tracking keyed by diff
//!    content, outbound comments and commit statuses (`review`, `store`).
//!
//! The crate uses `tracing` for logging and avoids `async-trait` and heap
//! trait objects. Provider and LLM dispatch are enum-based.

pub mod answers;
pub mod auth;
pub mod diff;
pub mod errors;
pub mod github;
pub mod metrics;
pub mod review;
pub mod store;

pub use review::{GateContext, handle_issue_comment_event, handle_pull_request_event};
