//! The five-step documentation wizard.
//!
//! ```text
//! Unloaded ──load──> TableLoaded ──continue──> SuggestionsGenerated
//!                                               │  generate (repeatable)
//!                                               └─next──> CommentsConfirmed
//!                                                          │  edit (repeatable)
//!                                                          └─continue──> SqlReviewed
//!                                                                         │  sql / execute
//!                                                                         └─continue──> Exported
//!                                                                                        describe / export
//! ```
//!
//! Every action is triggered explicitly by the user. Steps only move forward;
//! a reload goes back to `TableLoaded` and the session resets go back to
//! `Unloaded`. Actions remain available once their step has been reached, so
//! suggestions can still be regenerated while reviewing SQL.

use super::session::Session;
use super::step::WizardStep;
use crate::ai::{Completion, PromptTemplate, suggest_comment, suggest_table_description};
use crate::catalog::{
    CatalogSource, WorkingSet, build_comment_statements, export_file_name,
    render_catalog_markdown,
};
use crate::error::{CatalogError, Result, ResultExt as _};
use std::path::{Path, PathBuf};

/// Which rows a repeated "generate" sends to the model again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegenerationPolicy {
    /// Skip rows that already hold a suggestion.
    #[default]
    SkipSuggested,
    /// Recompute every row that still lacks a stored description.
    Recompute,
}

/// Outcome of one "generate" action.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Columns that received a new suggestion
    pub generated: Vec<String>,
    /// Columns left alone because they already had a suggestion
    pub skipped: Vec<String>,
    /// Columns whose model call failed; they stay unset and can be retried
    pub failed: Vec<(String, CatalogError)>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowController {
    template: PromptTemplate,
    policy: RegenerationPolicy,
}

impl WorkflowController {
    pub fn new(template: PromptTemplate, policy: RegenerationPolicy) -> Self {
        Self { template, policy }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn set_template(&mut self, template: PromptTemplate) {
        self.template = template;
    }

    pub fn policy(&self) -> RegenerationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RegenerationPolicy) {
        self.policy = policy;
    }

    /// "Test Connection": ping the database and remember the outcome.
    ///
    /// # Errors
    ///
    /// Returns the ping error, after recording it.
    pub async fn test_connection<S: CatalogSource>(
        &self,
        session: &mut Session,
        source: &S,
    ) -> Result<()> {
        match source.ping().await {
            Ok(()) => {
                session.set_connection_verified(true);
                session.log_event("Database connection successful");
                Ok(())
            }
            Err(e) => {
                session.set_connection_verified(false);
                session.log_event(format!("Database connection error: {e}"));
                Err(e)
            }
        }
    }

    /// Step 1: read the table's columns into a fresh working set.
    ///
    /// Reloading discards any previous suggestions and edits. On failure the
    /// session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] without an API key,
    /// [`CatalogError::Connection`] before a successful connection test, and
    /// [`CatalogError::Query`] for empty names or a failed read.
    pub async fn load_table<S: CatalogSource>(
        &self,
        session: &mut Session,
        source: &S,
        schema: &str,
        table: &str,
    ) -> Result<usize> {
        let checked = Self::check_ready(session).and_then(|()| {
            let schema = schema.trim();
            let table = table.trim();
            if schema.is_empty() || table.is_empty() {
                Err(CatalogError::Query(
                    "schema and table names are required".to_owned(),
                ))
            } else {
                Ok((schema, table))
            }
        });
        let (schema, table) = logged(session, checked)?;

        let fetched = source
            .fetch_columns(schema, table)
            .await
            .and_then(WorkingSet::new);
        let working_set = match fetched {
            Ok(ws) => ws,
            Err(e) => {
                session.log_event(format!("Failed to load {schema}.{table}: {e}"));
                return Err(e);
            }
        };

        let count = working_set.len();
        let flow = session.flow_mut();
        flow.step = WizardStep::TableLoaded;
        flow.schema = Some(schema.to_owned());
        flow.table = Some(table.to_owned());
        flow.working_set = working_set;
        flow.table_description = None;
        session.log_event(format!("Table loaded: {schema}.{table}"));
        Ok(count)
    }

    /// "Continue with suggestions".
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before a table is loaded.
    pub fn continue_to_suggestions(&self, session: &mut Session) -> Result<()> {
        let moved = Self::advance(session, WizardStep::SuggestionsGenerated);
        if logged(session, moved)? {
            session.log_event("Move to step 2: suggestions");
        }
        Ok(())
    }

    /// Draft descriptions for columns without a stored comment.
    ///
    /// A failing model call is recorded in the report and the remaining
    /// columns are still processed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 2. Model failures
    /// for single columns are reported in [`GenerationReport::failed`] instead.
    pub async fn generate_suggestions<C: Completion>(
        &self,
        session: &mut Session,
        completion: &C,
    ) -> Result<GenerationReport> {
        let allowed = Self::require(
            session,
            WizardStep::SuggestionsGenerated,
            "generate suggestions",
        );
        logged(session, allowed)?;

        let mut report = GenerationReport::default();
        let mut pending = Vec::new();
        for column in session.working_set().iter().filter(|c| c.lacks_description()) {
            if self.policy == RegenerationPolicy::SkipSuggested && column.llm_suggestion.is_some()
            {
                report.skipped.push(column.column_name.clone());
            } else {
                pending.push((column.column_name.clone(), column.data_type.clone()));
            }
        }

        let seed_final = session.step() >= WizardStep::CommentsConfirmed;
        for (name, data_type) in pending {
            session.log_event(format!("Getting LLM comments for column: {name}"));
            match suggest_comment(&name, &data_type, &self.template, completion).await {
                Ok(suggestion) => {
                    session.log_event(format!("LLM response: {suggestion}"));
                    if let Some(column) = session.flow_mut().working_set.get_mut(&name) {
                        column.llm_suggestion = Some(suggestion);
                        if seed_final && column.final_comment.is_none() {
                            let seeded = column.default_comment().map(ToOwned::to_owned);
                            column.final_comment = seeded;
                        }
                    }
                    report.generated.push(name);
                }
                Err(e) => {
                    tracing::warn!("Suggestion failed for {name}: {e}");
                    session.log_event(format!("LLM error for column {name}: {e}"));
                    report.failed.push((name, e));
                }
            }
        }

        session.log_event(format!(
            "Descriptions generated: {} new, {} skipped, {} failed",
            report.generated.len(),
            report.skipped.len(),
            report.failed.len()
        ));
        Ok(report)
    }

    /// "Next": open the comment editor, pre-filled with the stored description
    /// or the suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 2.
    pub fn confirm_suggestions(&self, session: &mut Session) -> Result<()> {
        let moved = Self::advance(session, WizardStep::CommentsConfirmed);
        let moved = logged(session, moved)?;

        for column in &mut session.flow_mut().working_set {
            if column.final_comment.is_none() {
                column.final_comment = column.default_comment().map(ToOwned::to_owned);
            }
        }
        if moved {
            session.log_event("Move to step 3: comments edition");
        }
        Ok(())
    }

    /// Replace the final comment of one column. An empty text means "no
    /// comment" and produces no statement.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 3 and
    /// [`CatalogError::UnknownColumn`] for a name not in the working set.
    pub fn edit_comment(&self, session: &mut Session, column: &str, text: &str) -> Result<()> {
        let allowed = Self::require(session, WizardStep::CommentsConfirmed, "edit comments");
        logged(session, allowed)?;

        let found = match session.flow_mut().working_set.get_mut(column) {
            Some(record) => {
                record.final_comment = Some(text.to_owned());
                Ok(())
            }
            None => Err(CatalogError::UnknownColumn(column.to_owned())),
        };
        logged(session, found)?;
        session.log_event(format!("Comment edited for column: {column}"));
        Ok(())
    }

    /// "Continue with SQL sentence".
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 3.
    pub fn continue_to_sql(&self, session: &mut Session) -> Result<()> {
        let moved = Self::advance(session, WizardStep::SqlReviewed);
        if logged(session, moved)? {
            session.log_event("Move to step 4: SQL script");
        }
        Ok(())
    }

    /// Render the `COMMENT ON COLUMN` statements for review.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 4.
    pub fn review_sql(&self, session: &mut Session) -> Result<Vec<String>> {
        let allowed = Self::require(session, WizardStep::SqlReviewed, "review SQL");
        logged(session, allowed)?;

        let (flow, log) = session.flow_and_log_mut();
        if let (Some(schema), Some(table)) = (flow.schema.as_deref(), flow.table.as_deref()) {
            return Ok(build_comment_statements(
                &flow.working_set,
                schema,
                table,
                log,
            ));
        }
        let missing = Err(CatalogError::InvalidState("no table loaded".to_owned()));
        logged(session, missing)
    }

    /// "Execute on db": apply all statements in one transaction. Returns the
    /// number of statements applied.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 4 and the source's
    /// [`CatalogError::Execution`] when the transaction fails.
    pub async fn execute_sql<S: CatalogSource>(
        &self,
        session: &mut Session,
        source: &S,
    ) -> Result<usize> {
        let statements = self.review_sql(session)?;
        if statements.is_empty() {
            session.log_event("No new comments to apply");
            return Ok(0);
        }

        match source.apply_statements(&statements).await {
            Ok(()) => {
                session.log_event("SQL executed");
                Ok(statements.len())
            }
            Err(e) => {
                session.log_event(format!("SQL error: {e}"));
                Err(e)
            }
        }
    }

    /// "Continue with file export".
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 4.
    pub fn continue_to_export(&self, session: &mut Session) -> Result<()> {
        let moved = Self::advance(session, WizardStep::Exported);
        if logged(session, moved)? {
            session.log_event("Move to step 5: Markdown export");
        }
        Ok(())
    }

    /// Table-level description, asked from the model once per load.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 5 or the completion
    /// error.
    pub async fn table_description<C: Completion>(
        &self,
        session: &mut Session,
        completion: &C,
    ) -> Result<String> {
        let allowed = Self::require(session, WizardStep::Exported, "describe the table");
        logged(session, allowed)?;

        if let Some(existing) = session.table_description() {
            return Ok(existing.to_owned());
        }

        let table = Self::loaded_table(session);
        let table = logged(session, table)?;
        let names: Vec<String> = session
            .working_set()
            .column_names()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        match suggest_table_description(&table, &name_refs, completion).await {
            Ok(description) => {
                session.flow_mut().table_description = Some(description.clone());
                session.log_event("Get description from LLM");
                Ok(description)
            }
            Err(e) => {
                session.log_event(format!("LLM error for table description: {e}"));
                Err(e)
            }
        }
    }

    /// Replace the table description with user-supplied text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidState`] before step 5.
    pub fn set_table_description(&self, session: &mut Session, text: &str) -> Result<()> {
        let allowed = Self::require(session, WizardStep::Exported, "edit the table description");
        logged(session, allowed)?;
        session.flow_mut().table_description = Some(text.trim().to_owned());
        session.log_event("Table description edited");
        Ok(())
    }

    /// Render the catalog page, fetching the table description if needed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::table_description`].
    pub async fn render_markdown<C: Completion>(
        &self,
        session: &mut Session,
        completion: &C,
    ) -> Result<String> {
        let description = self.table_description(session, completion).await?;
        let table = Self::loaded_table(session);
        let table = logged(session, table)?;
        Ok(render_catalog_markdown(
            &table,
            &description,
            session.working_set(),
        ))
    }

    /// Write `<table>_catalog.md` into `dir` and return its path.
    ///
    /// # Errors
    ///
    /// Same as [`Self::render_markdown`], plus an error if the file cannot be
    /// written.
    pub async fn export_markdown<C: Completion>(
        &self,
        session: &mut Session,
        completion: &C,
        dir: &Path,
    ) -> Result<PathBuf> {
        let markdown = self.render_markdown(session, completion).await?;
        let table = Self::loaded_table(session);
        let table = logged(session, table)?;
        let path = dir.join(export_file_name(&table));

        let written = std::fs::write(&path, markdown)
            .with_context(|| format!("Failed to write {}", path.display()));
        logged(session, written)?;
        session.log_event(format!("Markdown exported to {}", path.display()));
        Ok(path)
    }

    fn check_ready(session: &Session) -> Result<()> {
        if !session.settings.ai.has_api_key() {
            return Err(CatalogError::Config(
                "load an OpenAI API key before loading a table".to_owned(),
            ));
        }
        if !session.connection_verified() {
            return Err(CatalogError::Connection(
                "test the database connection before loading a table".to_owned(),
            ));
        }
        Ok(())
    }

    fn loaded_table(session: &Session) -> Result<String> {
        session
            .table()
            .map(ToOwned::to_owned)
            .ok_or_else(|| CatalogError::InvalidState("no table loaded".to_owned()))
    }

    fn require(session: &Session, at_least: WizardStep, action: &str) -> Result<()> {
        if session.step() >= at_least {
            Ok(())
        } else {
            Err(CatalogError::InvalidState(format!(
                "cannot {action} at step {}; reach step {at_least} first",
                session.step()
            )))
        }
    }

    /// Move forward one step and report whether the step changed. Targets at
    /// or behind the current step are a no-op so steps never go backwards.
    fn advance(session: &mut Session, target: WizardStep) -> Result<bool> {
        let current = session.step();
        if current >= target {
            tracing::debug!("Already at step {current}, not moving to {target}");
            return Ok(false);
        }
        if !current.can_advance_to(target) {
            return Err(CatalogError::InvalidState(format!(
                "cannot move from step {current} to step {target}"
            )));
        }
        session.flow_mut().step = target;
        Ok(true)
    }
}

/// Mirror an error into the session's audit trail before returning it.
fn logged<T>(session: &mut Session, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::warn!("{e}");
        session.log_event(format!("Error: {e}"));
    }
    result
}
