//! # Catalog Assistant - LLM-assisted column documentation for PostgreSQL
//!
//! Reads a table's column metadata, asks a language model to draft a one-line
//! description for every undocumented column, lets the user review the drafts,
//! writes the approved texts back as `COMMENT ON COLUMN` statements and
//! exports a Markdown catalog page.
//!
//! ## Core Modules
//!
//! - [`workflow`]: the five-step wizard and the per-user [`workflow::Session`]
//! - [`catalog`]: column metadata, SQL comment statements, Markdown export
//! - [`ai`]: prompt templates and the OpenAI completion client
//! - [`config`]: settings from the environment and the audit log
//! - [`error`]: error kinds surfaced to the user
//! - [`logging`]: tracing setup
//!
//! ## Seams
//!
//! The workflow never talks to PostgreSQL or OpenAI directly. It goes through
//! two traits, [`catalog::CatalogSource`] and [`ai::Completion`], so the whole
//! wizard can be driven against in-memory fakes:
//!
//! ```
//! use catalog_assistant::ai::Completion;
//! use catalog_assistant::error::Result;
//!
//! struct Canned;
//!
//! impl Completion for Canned {
//!     async fn complete(&self, _prompt: &str) -> Result<String> {
//!         Ok("Primary key of the row".to_owned())
//!     }
//! }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod ai;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod workflow;
