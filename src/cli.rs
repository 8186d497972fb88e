use anyhow::{Context as _, Result};
use catalog_assistant::ai::{CompletionClient, PromptTemplate};
use catalog_assistant::catalog::{CatalogSource as _, DbClient, WorkingSet};
use catalog_assistant::config::AppSettings;
use catalog_assistant::workflow::{RegenerationPolicy, Session, WorkflowController};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "catalog-assistant",
    about = "Document PostgreSQL columns with LLM-drafted comments"
)]
pub struct Cli {
    /// Chat model for suggestions (gpt-4o or gpt-4o-mini); overrides LLM_MODEL
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Console log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive step-by-step wizard (default when no command is given)
    Wizard,
    /// Check that the configured database is reachable
    TestConnection,
    /// Print a table's columns with their stored comments
    Columns {
        /// Schema containing the table
        #[arg(long, default_value = "public")]
        schema: String,

        /// Table to inspect
        #[arg(short, long)]
        table: String,

        /// Print the columns as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the whole workflow non-interactively, accepting every suggestion
    Document {
        /// Schema containing the table
        #[arg(long, default_value = "public")]
        schema: String,

        /// Table to document
        #[arg(short, long)]
        table: String,

        /// File with a custom prompt template ({column_name} and {data_type} required)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Directory for the exported <table>_catalog.md
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Execute the COMMENT ON statements instead of only printing them
        #[arg(long)]
        apply: bool,

        /// Ask the model again for columns that already have a suggestion
        #[arg(long)]
        recompute: bool,
    },
}

/// Settings from `.env` and the environment, with command-line overrides.
pub fn load_settings(model: Option<&str>) -> Result<AppSettings> {
    let mut settings = AppSettings::from_env().context("Failed to load configuration")?;
    if let Some(model) = model {
        settings.set("llm_model", model)?;
    }
    Ok(settings)
}

pub async fn run_command(command: Commands, settings: AppSettings) -> Result<()> {
    match command {
        Commands::Wizard => crate::wizard::run(settings).await,
        Commands::TestConnection => handle_test_connection(settings).await,
        Commands::Columns {
            schema,
            table,
            json,
        } => handle_columns(settings, &schema, &table, json).await,
        Commands::Document {
            schema,
            table,
            template,
            output,
            apply,
            recompute,
        } => {
            let policy = if recompute {
                RegenerationPolicy::Recompute
            } else {
                RegenerationPolicy::SkipSuggested
            };
            handle_document(
                settings,
                &schema,
                &table,
                template.as_deref(),
                &output,
                apply,
                policy,
            )
            .await
        }
    }
}

async fn handle_test_connection(settings: AppSettings) -> Result<()> {
    let mut session = Session::new(settings);
    let db = DbClient::connect(&session.settings.database).await?;
    WorkflowController::default()
        .test_connection(&mut session, &db)
        .await?;
    println!("Database connection successful");
    Ok(())
}

async fn handle_columns(
    settings: AppSettings,
    schema: &str,
    table: &str,
    json: bool,
) -> Result<()> {
    let db = DbClient::connect(&settings.database).await?;
    let working_set = WorkingSet::new(db.fetch_columns(schema, table).await?)?;

    if json {
        let rendered = serde_json::to_string_pretty(working_set.columns())
            .context("Failed to serialize columns")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{schema}.{table}");
    for column in &working_set {
        println!(
            "{:>4}  {:<28} {:<28} {}",
            column.ordinal_position,
            column.column_name,
            column.data_type,
            column.current_description.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn handle_document(
    settings: AppSettings,
    schema: &str,
    table: &str,
    template_path: Option<&Path>,
    output: &Path,
    apply: bool,
    policy: RegenerationPolicy,
) -> Result<()> {
    let template = match template_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            PromptTemplate::new(text)?
        }
        None => PromptTemplate::default(),
    };

    let mut session = Session::new(settings);
    let db = DbClient::connect(&session.settings.database).await?;
    let llm = CompletionClient::new(session.settings.ai.clone())?;
    let wizard = WorkflowController::new(template, policy);

    wizard.test_connection(&mut session, &db).await?;
    let count = wizard.load_table(&mut session, &db, schema, table).await?;
    println!("Loaded {count} columns from {schema}.{table}");

    wizard.continue_to_suggestions(&mut session)?;
    let report = wizard.generate_suggestions(&mut session, &llm).await?;
    println!(
        "Generated {} suggestions ({} columns already documented)",
        report.generated.len(),
        count - session.working_set().missing_descriptions()
    );
    for (column, error) in &report.failed {
        tracing::warn!("No suggestion for {column}: {error}");
    }

    wizard.confirm_suggestions(&mut session)?;
    wizard.continue_to_sql(&mut session)?;
    let statements = wizard.review_sql(&mut session)?;
    if statements.is_empty() {
        println!("No new comments to apply.");
    } else {
        println!("{}", statements.join("\n"));
    }

    if apply {
        let applied = wizard.execute_sql(&mut session, &db).await?;
        println!("Applied {applied} comments.");
    }

    wizard.continue_to_export(&mut session)?;
    let path = wizard.export_markdown(&mut session, &llm, output).await?;
    println!("Markdown written to {}", path.display());
    Ok(())
}
