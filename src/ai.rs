//! Language model integration.
//!
//! [`client`] wraps the OpenAI chat API behind the [`Completion`] trait;
//! [`suggest`] turns column metadata into prompts and cleans the replies.

#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod suggest;

pub use client::{Completion, CompletionClient};
pub use suggest::{PromptTemplate, clean_completion, suggest_comment, suggest_table_description};
