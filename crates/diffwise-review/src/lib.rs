//! Review orchestration for diffwise.
//!
//! Provides the stages of a run: git diffing, the completion client and
//! prompt, pull request lookup and comment publishing on GitHub, the Actions
//! runner integration, and the pipeline wiring them together.

pub mod actions;
pub mod git;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod publish;
