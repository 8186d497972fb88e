//! Interactive terminal wizard.
//!
//! Each input line is one user action. The commands mirror the steps of the
//! workflow; `help` lists them.

use anyhow::Result;
use catalog_assistant::ai::{CompletionClient, PromptTemplate};
use catalog_assistant::catalog::DbClient;
use catalog_assistant::config::{AppSettings, SETTING_KEYS};
use catalog_assistant::error::CatalogError;
use catalog_assistant::workflow::{Session, WizardStep, WorkflowController};
use std::io::{BufRead as _, Write as _};
use std::path::PathBuf;

const HELP: &str = "\
Configuration
  config                   show current settings (secrets masked)
  env                      load settings from .env and the environment
  set <key> <value>        change a setting
  connect                  connect to the database and test it
Workflow
  load [schema] <table>    step 1: load column metadata (schema defaults to public)
  preview                  show the loaded columns
  continue | next          move to the next step
  template [text]          show or replace the prompt template (\\n for newlines)
  generate                 step 2: draft descriptions for undocumented columns
  show                     list columns with current, suggested and final text
  edit <column> [text]     step 3: set a column's final comment (empty clears it)
  sql                      step 4: show the COMMENT ON statements
  execute                  step 4: apply the statements in one transaction
  describe [text]          step 5: show, generate or replace the table description
  markdown                 step 5: print the catalog page
  export [dir]             step 5: write <table>_catalog.md
Session
  log                      show recent audit entries
  status                   show the current step
  reset                    clear everything, settings included
  reset-flow               clear the workflow, keep settings
  quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Help,
    Config,
    Env,
    Set { key: String, value: String },
    Connect,
    Load { schema: String, table: String },
    Preview,
    Continue,
    Template(Option<String>),
    Generate,
    Show,
    Edit { column: String, text: String },
    Sql,
    Execute,
    Describe(Option<String>),
    Markdown,
    Export(Option<PathBuf>),
    Log,
    Status,
    Reset,
    ResetFlow,
    Quit,
}

impl WizardCommand {
    /// Parse a line; blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let optional = |text: &str| (!text.is_empty()).then(|| text.to_owned());

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "config" => Self::Config,
            "env" => Self::Env,
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(k, v)| (k, v.trim()));
                if key.is_empty() {
                    return Err(format!("usage: set <{}> <value>", SETTING_KEYS.join("|")));
                }
                Self::Set {
                    key: key.to_owned(),
                    value: value.to_owned(),
                }
            }
            "connect" => Self::Connect,
            "load" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let (schema, table) = match parts.as_slice() {
                    [qualified] => qualified.split_once('.').unwrap_or(("public", *qualified)),
                    [schema, table] => (*schema, *table),
                    _ => return Err("usage: load [schema] <table>".to_owned()),
                };
                Self::Load {
                    schema: schema.to_owned(),
                    table: table.to_owned(),
                }
            }
            "preview" => Self::Preview,
            "continue" | "next" => Self::Continue,
            "template" => Self::Template(optional(rest).map(|t| t.replace("\\n", "\n"))),
            "generate" => Self::Generate,
            "show" => Self::Show,
            "edit" => {
                let (column, text) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(c, t)| (c, t.trim()));
                if column.is_empty() {
                    return Err("usage: edit <column> [text]".to_owned());
                }
                Self::Edit {
                    column: column.to_owned(),
                    text: text.to_owned(),
                }
            }
            "sql" => Self::Sql,
            "execute" => Self::Execute,
            "describe" => Self::Describe(optional(rest)),
            "markdown" => Self::Markdown,
            "export" => Self::Export(optional(rest).map(PathBuf::from)),
            "log" => Self::Log,
            "status" => Self::Status,
            "reset" => Self::Reset,
            "reset-flow" => Self::ResetFlow,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{other}' (try 'help')")),
        };
        Ok(Some(command))
    }
}

struct Wizard {
    session: Session,
    controller: WorkflowController,
    db: Option<DbClient>,
    llm: Option<CompletionClient>,
}

fn ensure_llm<'a>(
    slot: &'a mut Option<CompletionClient>,
    settings: &AppSettings,
) -> Result<&'a CompletionClient, CatalogError> {
    if slot.is_none() {
        *slot = Some(CompletionClient::new(settings.ai.clone())?);
    }
    slot.as_ref()
        .ok_or_else(|| CatalogError::Config("completion client unavailable".to_owned()))
}

fn connected(slot: Option<&DbClient>) -> Result<&DbClient, CatalogError> {
    slot.ok_or_else(|| CatalogError::Connection("not connected; run 'connect' first".to_owned()))
}

/// Record a wizard-level failure in the audit trail. Controller errors are
/// recorded by the controller itself.
fn audited<T>(session: &mut Session, result: Result<T, CatalogError>) -> Result<T, CatalogError> {
    if let Err(e) = &result {
        session.log_event(format!("Error: {e}"));
    }
    result
}

impl Wizard {
    fn new(settings: AppSettings) -> Self {
        Self {
            session: Session::new(settings),
            controller: WorkflowController::default(),
            db: None,
            llm: None,
        }
    }

    async fn dispatch(&mut self, command: WizardCommand) -> Result<(), CatalogError> {
        match command {
            WizardCommand::Help => println!("{HELP}"),
            WizardCommand::Config => println!("{}", self.session.settings),
            WizardCommand::Env => self.reload_env()?,
            WizardCommand::Set { key, value } => self.set(&key, &value)?,
            WizardCommand::Connect => self.connect().await?,
            WizardCommand::Load { schema, table } => self.load(&schema, &table).await?,
            WizardCommand::Preview => self.print_preview(),
            WizardCommand::Continue => self.advance()?,
            WizardCommand::Template(text) => self.template(text)?,
            WizardCommand::Generate => self.generate().await?,
            WizardCommand::Show => self.print_comments(),
            WizardCommand::Edit { column, text } => {
                self.controller
                    .edit_comment(&mut self.session, &column, &text)?;
                println!("Comment for {column} updated");
            }
            WizardCommand::Sql => {
                let statements = self.controller.review_sql(&mut self.session)?;
                print_statements(&statements);
            }
            WizardCommand::Execute => self.execute().await?,
            WizardCommand::Describe(text) => self.describe(text).await?,
            WizardCommand::Markdown => {
                let llm = ensure_llm(&mut self.llm, &self.session.settings);
                let llm = audited(&mut self.session, llm)?;
                let markdown = self
                    .controller
                    .render_markdown(&mut self.session, llm)
                    .await?;
                println!("{markdown}");
            }
            WizardCommand::Export(dir) => self.export(dir).await?,
            WizardCommand::Log => {
                for entry in self.session.log().recent() {
                    println!("{entry}");
                }
            }
            WizardCommand::Status => self.print_status(),
            WizardCommand::Reset => self.reset(),
            WizardCommand::ResetFlow => {
                self.session.reset_flow();
                println!("Workflow cleared; settings kept.");
            }
            WizardCommand::Quit => {}
        }
        Ok(())
    }

    fn reload_env(&mut self) -> Result<(), CatalogError> {
        let settings = AppSettings::from_env();
        let settings = audited(&mut self.session, settings)?;
        self.session.settings = settings;
        self.db = None;
        self.llm = None;
        self.session.log_event("Config loaded from .env");
        println!("Config loaded from .env; run 'connect' to reconnect");
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        let updated = self.session.settings.set(key, value);
        audited(&mut self.session, updated)?;
        self.session.log_event(format!("Setting changed: {key}"));
        if key.starts_with("db_") {
            self.db = None;
            println!("{key} updated; run 'connect' to reconnect");
        } else {
            self.llm = None;
            println!("{key} updated");
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), CatalogError> {
        let db = match DbClient::connect(&self.session.settings.database).await {
            Ok(db) => db,
            Err(e) => {
                self.session
                    .log_event(format!("Database connection error: {e}"));
                return Err(e);
            }
        };
        self.controller
            .test_connection(&mut self.session, &db)
            .await?;
        self.db = Some(db);
        println!("Database connection successful");
        Ok(())
    }

    async fn load(&mut self, schema: &str, table: &str) -> Result<(), CatalogError> {
        let db = audited(&mut self.session, connected(self.db.as_ref()))?;
        let count = self
            .controller
            .load_table(&mut self.session, db, schema, table)
            .await?;
        println!("Loaded {count} columns from {schema}.{table}");
        self.print_preview();
        print_step_hint(self.session.step());
        Ok(())
    }

    fn template(&mut self, text: Option<String>) -> Result<(), CatalogError> {
        let Some(text) = text else {
            println!("{}", self.controller.template().as_str());
            return Ok(());
        };
        let template = audited(&mut self.session, PromptTemplate::new(text))?;
        self.controller.set_template(template);
        self.session.log_event("Prompt template updated");
        println!("Prompt template updated");
        Ok(())
    }

    async fn generate(&mut self) -> Result<(), CatalogError> {
        let llm = ensure_llm(&mut self.llm, &self.session.settings);
        let llm = audited(&mut self.session, llm)?;
        let report = self
            .controller
            .generate_suggestions(&mut self.session, llm)
            .await?;
        for (column, error) in &report.failed {
            println!("  {column}: {error}");
        }
        println!(
            "Descriptions generated: {} new, {} already suggested, {} failed",
            report.generated.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(())
    }

    async fn execute(&mut self) -> Result<(), CatalogError> {
        let db = audited(&mut self.session, connected(self.db.as_ref()))?;
        let applied = self.controller.execute_sql(&mut self.session, db).await?;
        if applied == 0 {
            println!("No new comments to apply.");
        } else {
            println!("{applied} comments successfully applied.");
        }
        Ok(())
    }

    async fn describe(&mut self, text: Option<String>) -> Result<(), CatalogError> {
        if let Some(text) = text {
            self.controller
                .set_table_description(&mut self.session, &text)?;
            println!("Table description updated");
            return Ok(());
        }
        let llm = ensure_llm(&mut self.llm, &self.session.settings);
        let llm = audited(&mut self.session, llm)?;
        let description = self
            .controller
            .table_description(&mut self.session, llm)
            .await?;
        println!("{description}");
        Ok(())
    }

    async fn export(&mut self, dir: Option<PathBuf>) -> Result<(), CatalogError> {
        let dir = dir.unwrap_or_else(|| PathBuf::from("."));
        let llm = ensure_llm(&mut self.llm, &self.session.settings);
        let llm = audited(&mut self.session, llm)?;
        let path = self
            .controller
            .export_markdown(&mut self.session, llm, &dir)
            .await?;
        println!("Markdown written to {}", path.display());
        Ok(())
    }

    fn reset(&mut self) {
        self.session.full_reset();
        self.controller = WorkflowController::default();
        self.db = None;
        self.llm = None;
        println!("Session cleared. Run 'env' or 'set' to configure.");
    }

    /// The "continue" button of whichever step is active.
    fn advance(&mut self) -> Result<(), CatalogError> {
        let session = &mut self.session;
        match session.step() {
            WizardStep::Unloaded => {
                let refused = Err(CatalogError::InvalidState("load a table first".to_owned()));
                return audited(session, refused);
            }
            WizardStep::TableLoaded => self.controller.continue_to_suggestions(session)?,
            WizardStep::SuggestionsGenerated => self.controller.confirm_suggestions(session)?,
            WizardStep::CommentsConfirmed => self.controller.continue_to_sql(session)?,
            WizardStep::SqlReviewed => self.controller.continue_to_export(session)?,
            WizardStep::Exported => println!("Already at the last step."),
        }
        print_step_hint(self.session.step());
        Ok(())
    }

    fn print_preview(&self) {
        let Some(qualified) = self.session.qualified_table() else {
            println!("No table loaded.");
            return;
        };
        println!("Preview table: {qualified}");
        for column in self.session.working_set() {
            println!(
                "  {:<28} {:<28} {}",
                column.column_name,
                column.data_type,
                column.current_description.as_deref().unwrap_or("-")
            );
        }
    }

    fn print_comments(&self) {
        for column in self.session.working_set() {
            println!("{} ({})", column.column_name, column.data_type);
            println!(
                "  Current:    {}",
                column.current_description.as_deref().unwrap_or_default()
            );
            if let Some(suggestion) = &column.llm_suggestion {
                println!("  Suggestion: {suggestion}");
            }
            if self.session.step() >= WizardStep::CommentsConfirmed {
                println!(
                    "  Comment:    {}",
                    column.final_comment.as_deref().unwrap_or_default()
                );
            }
        }
    }

    fn print_status(&self) {
        let session = &self.session;
        println!("Step:       {}", session.step());
        println!(
            "Table:      {}",
            session.qualified_table().as_deref().unwrap_or("-")
        );
        println!(
            "Columns:    {} ({} without description)",
            session.working_set().len(),
            session.working_set().missing_descriptions()
        );
        println!(
            "Database:   {}",
            if self.db.is_some() && session.connection_verified() {
                "connected"
            } else {
                "not connected"
            }
        );
        println!(
            "OpenAI key: {}",
            if session.settings.ai.has_api_key() {
                "set"
            } else {
                "missing"
            }
        );
        println!("Model:      {}", session.settings.ai.model);
    }
}

fn print_statements(statements: &[String]) {
    if statements.is_empty() {
        println!("No new comments to apply.");
    } else {
        println!("{}", statements.join("\n"));
    }
}

fn print_step_hint(step: WizardStep) {
    let hint = match step {
        WizardStep::Unloaded => "Step 1: load a table with 'load [schema] <table>'.",
        WizardStep::TableLoaded => "Step 1 done: 'continue' to draft suggestions.",
        WizardStep::SuggestionsGenerated => {
            "Step 2: 'generate' descriptions for columns without one (edit the prompt with \
             'template'), then 'next'."
        }
        WizardStep::CommentsConfirmed => {
            "Step 3: review with 'show', change with 'edit <column> <text>', then 'continue'."
        }
        WizardStep::SqlReviewed => {
            "Step 4: review with 'sql', apply with 'execute', then 'continue' to export."
        }
        WizardStep::Exported => {
            "Step 5: 'describe' the table, preview with 'markdown', save with 'export [dir]'."
        }
    };
    println!("{hint}");
}

fn print_readiness(session: &Session) {
    if !session.settings.ai.has_api_key() {
        println!("Please load your OpenAI key ('env' or 'set openai_api_key <key>').");
    }
    println!("Please test your database connection with 'connect'.");
}

pub async fn run(settings: AppSettings) -> Result<()> {
    let mut wizard = Wizard::new(settings);
    println!("Table Column Data Catalog Assistant. Type 'help' for commands.");
    print_readiness(&wizard.session);

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("[step {}] > ", wizard.session.step().number());
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match WizardCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(WizardCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = wizard.dispatch(command).await {
                    println!("error: {e}");
                    tracing::debug!("Command failed: {e}");
                }
            }
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}
