//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Confirmations, choices and the `Prompter` seam
//! - [`output`] - Failure summaries and verbatim output
//!
//! # Design
//!
//! All operator interaction goes through this module so workflows can run
//! unchanged against a terminal, a fixed policy or a test script.

pub mod output;
pub mod prompts;
