#![forbid(unsafe_code)]

//! Workspace Quota Monitor (wqm) — watches a workspace directory tree and
//! raises escalating alerts before an upload or export would be rejected by a
//! third-party size cap.
//!
//! Pipeline, leaves first:
//! 1. **Resolver** — picks the root to scan (explicit path, current project,
//!    or plugin working directory)
//! 2. **Scanner** — best-effort recursive walk producing a size [`Inventory`]
//! 3. **Evaluator** — classifies the inventory against a byte threshold and
//!    warning bands
//! 4. **Escalator** — per-identity state machine that repeats and eventually
//!    suppresses notifications
//!
//! [`Inventory`]: scanner::Inventory

pub mod alerts;
#[cfg(feature = "cli")]
pub mod cli_app;
pub mod core;
pub mod evaluator;
pub mod resolver;
pub mod scanner;
