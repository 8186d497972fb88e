//! Table catalog: column metadata, comment statements, and the Markdown page.
//!
//! ## Usage
//!
//! ```no_run
//! use catalog_assistant::catalog::{CatalogSource as _, DbClient, WorkingSet};
//! use catalog_assistant::config::AppSettings;
//!
//! # async fn example() -> catalog_assistant::error::Result<()> {
//! let settings = AppSettings::from_env()?;
//! let db = DbClient::connect(&settings.database).await?;
//!
//! let columns = db.fetch_columns("public", "users").await?;
//! let working_set = WorkingSet::new(columns)?;
//! println!("{} columns lack a description", working_set.missing_descriptions());
//! # Ok(())
//! # }
//! ```

pub mod comments;
pub mod markdown;
pub mod model;
pub mod reader;

pub use comments::{build_comment_statements, comment_statement, quote_identifier, quote_literal};
pub use markdown::{export_file_name, render_catalog_markdown};
pub use model::{ColumnRecord, WorkingSet};
pub use reader::{CatalogSource, DbClient};
