//! Core types, state machine and gateway for the moderation queue.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::SubmissionStore`]; transports wrap
//! [`gateway::ModerationGateway`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod caller;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod stats;
pub mod store;
pub mod submission;
pub mod transition;

pub use error::{Error, Result};
