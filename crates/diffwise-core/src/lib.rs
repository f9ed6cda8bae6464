//! Core types, configuration, and error handling for diffwise.
//!
//! This crate provides the shared foundation used by the review crate and
//! the `diffwise` binary:
//! - [`DiffwiseError`] — unified error type using `thiserror` and `miette`
//! - [`DiffwiseConfig`] — optional settings loaded from `.diffwise.toml`
//! - [`ActionConfig`] — the resolved inputs of one action run
//! - Shared types: [`IssueComment`], [`CommentAuthor`], [`PublishOutcome`],
//!   [`RunOutcome`]

mod config;
pub mod constants;
mod error;
mod types;

pub use config::{parse_branch_ref, ActionConfig, ActionInputs, DiffwiseConfig, LlmConfig};
pub use error::DiffwiseError;
pub use types::{AccountKind, CommentAuthor, IssueComment, PublishOutcome, RunOutcome};

/// A convenience `Result` type for diffwise operations.
pub type Result<T> = std::result::Result<T, DiffwiseError>;
