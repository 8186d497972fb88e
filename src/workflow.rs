//! Guided documentation workflow.
//!
//! A [`Session`] holds the settings, the loaded working set and the audit
//! trail; the [`WorkflowController`] moves it through the [`WizardStep`]s:
//!
//! ```no_run
//! use catalog_assistant::ai::CompletionClient;
//! use catalog_assistant::catalog::DbClient;
//! use catalog_assistant::config::AppSettings;
//! use catalog_assistant::workflow::{Session, WorkflowController};
//!
//! # async fn example() -> catalog_assistant::error::Result<()> {
//! let mut session = Session::new(AppSettings::from_env()?);
//! let db = DbClient::connect(&session.settings.database).await?;
//! let llm = CompletionClient::new(session.settings.ai.clone())?;
//! let wizard = WorkflowController::default();
//!
//! wizard.test_connection(&mut session, &db).await?;
//! wizard.load_table(&mut session, &db, "public", "users").await?;
//! wizard.continue_to_suggestions(&mut session)?;
//! wizard.generate_suggestions(&mut session, &llm).await?;
//! wizard.confirm_suggestions(&mut session)?;
//! wizard.continue_to_sql(&mut session)?;
//! wizard.execute_sql(&mut session, &db).await?;
//! wizard.continue_to_export(&mut session)?;
//! let path = wizard.export_markdown(&mut session, &llm, ".".as_ref()).await?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod session;
pub mod step;

pub use controller::{GenerationReport, RegenerationPolicy, WorkflowController};
pub use session::Session;
pub use step::WizardStep;
