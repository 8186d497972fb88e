//! End-to-end wizard scenarios against in-memory database and model fakes.
//!
//! These tests drive [`WorkflowController`] through the same sequence of
//! actions a user performs in the wizard and check the resulting SQL, audit
//! trail and exported Markdown.

use catalog_assistant::ai::Completion;
use catalog_assistant::catalog::{CatalogSource, ColumnRecord};
use catalog_assistant::config::AppSettings;
use catalog_assistant::error::{CatalogError, Result};
use catalog_assistant::workflow::{RegenerationPolicy, Session, WizardStep, WorkflowController};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

struct FakeCatalog {
    columns: Vec<ColumnRecord>,
    reachable: bool,
    fail_apply: bool,
    fetches: Cell<usize>,
    applied: RefCell<Vec<String>>,
}

impl FakeCatalog {
    fn new(columns: Vec<ColumnRecord>) -> Self {
        Self {
            columns,
            reachable: true,
            fail_apply: false,
            fetches: Cell::new(0),
            applied: RefCell::new(Vec::new()),
        }
    }
}

impl CatalogSource for FakeCatalog {
    async fn ping(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(CatalogError::Connection("connection refused".to_owned()))
        }
    }

    async fn fetch_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnRecord>> {
        self.fetches.set(self.fetches.get() + 1);
        if schema == "public" && table == "users" {
            Ok(self.columns.clone())
        } else {
            Err(CatalogError::Query(format!(
                "table {schema}.{table} does not exist or has no columns"
            )))
        }
    }

    async fn apply_statements(&self, statements: &[String]) -> Result<()> {
        if self.fail_apply {
            return Err(CatalogError::Execution(
                "permission denied for table users".to_owned(),
            ));
        }
        self.applied.borrow_mut().extend_from_slice(statements);
        Ok(())
    }
}

/// Answers column prompts by the quoted column name they mention.
struct ScriptedModel {
    replies: Vec<(&'static str, &'static str)>,
    table_reply: &'static str,
    failing: RefCell<HashSet<&'static str>>,
    calls: Cell<usize>,
}

impl ScriptedModel {
    fn new(replies: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            replies,
            table_reply: "Registered users of the application.",
            failing: RefCell::new(HashSet::new()),
            calls: Cell::new(0),
        }
    }
}

impl Completion for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        if prompt.contains("table named") {
            return Ok(self.table_reply.to_owned());
        }
        for (column, reply) in &self.replies {
            if prompt.contains(&format!("column named '{column}'")) {
                if self.failing.borrow().contains(column) {
                    return Err(CatalogError::Completion("rate limited".to_owned()));
                }
                return Ok((*reply).to_owned());
            }
        }
        Err(CatalogError::Completion(format!("unexpected prompt: {prompt}")))
    }
}

fn users_columns() -> Vec<ColumnRecord> {
    vec![
        ColumnRecord::new("id", "integer", 1, None),
        ColumnRecord::new("email", "character varying(255)", 2, None),
    ]
}

fn users_model() -> ScriptedModel {
    ScriptedModel::new(vec![
        ("id", "Unique identifier for the user"),
        ("email", "\"User's email address\""),
        ("created_at", "Time the account was created"),
    ])
}

fn configured_session() -> Session {
    let mut settings = AppSettings::default();
    settings.set("openai_api_key", "sk-test").unwrap();
    settings.set("db_name", "shop").unwrap();
    Session::new(settings)
}

async fn loaded_session(controller: &WorkflowController, db: &FakeCatalog) -> Session {
    let mut session = configured_session();
    controller.test_connection(&mut session, db).await.unwrap();
    controller
        .load_table(&mut session, db, "public", "users")
        .await
        .unwrap();
    session
}

fn log_messages(session: &Session) -> Vec<String> {
    session
        .log()
        .entries()
        .iter()
        .map(|entry| entry.message.clone())
        .collect()
}

#[tokio::test]
async fn test_users_scenario_produces_escaped_sql() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;
    assert_eq!(session.step(), WizardStep::TableLoaded);

    controller.continue_to_suggestions(&mut session).unwrap();
    let report = controller
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap();
    assert_eq!(report.generated, ["id", "email"]);
    assert!(report.is_complete());

    controller.confirm_suggestions(&mut session).unwrap();
    controller.continue_to_sql(&mut session).unwrap();
    let statements = controller.review_sql(&mut session).unwrap();

    assert_eq!(
        statements,
        [
            "COMMENT ON COLUMN public.users.id IS 'Unique identifier for the user';",
            "COMMENT ON COLUMN public.users.email IS 'User''s email address';",
        ]
    );

    let applied = controller.execute_sql(&mut session, &db).await.unwrap();
    assert_eq!(applied, 2);
    assert_eq!(db.applied.borrow().as_slice(), statements.as_slice());

    let messages = log_messages(&session);
    assert!(messages.contains(&"Database connection successful".to_owned()));
    assert!(messages.contains(&"Table loaded: public.users".to_owned()));
    assert!(messages.contains(&"Getting LLM comments for column: id".to_owned()));
    assert!(messages.contains(&"SQL executed".to_owned()));
}

#[tokio::test]
async fn test_existing_descriptions_are_kept() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(vec![
        ColumnRecord::new("id", "integer", 1, Some("Primary key".to_owned())),
        ColumnRecord::new("email", "character varying(255)", 2, None),
    ]);
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    let report = controller
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap();
    assert_eq!(report.generated, ["email"]);
    assert_eq!(model.calls.get(), 1);

    let id = session.working_set().get("id").unwrap();
    assert_eq!(id.llm_suggestion, None);
    assert_eq!(id.current_description.as_deref(), Some("Primary key"));

    controller.confirm_suggestions(&mut session).unwrap();
    let id = session.working_set().get("id").unwrap();
    assert_eq!(id.final_comment.as_deref(), Some("Primary key"));
}

#[tokio::test]
async fn test_repeated_generation_policies() {
    let db = FakeCatalog::new(users_columns());

    let skipping = WorkflowController::default();
    let model = users_model();
    let mut session = loaded_session(&skipping, &db).await;
    skipping.continue_to_suggestions(&mut session).unwrap();
    skipping.generate_suggestions(&mut session, &model).await.unwrap();
    let second = skipping.generate_suggestions(&mut session, &model).await.unwrap();
    assert!(second.generated.is_empty());
    assert_eq!(second.skipped, ["id", "email"]);
    assert_eq!(model.calls.get(), 2);

    let mut recomputing = WorkflowController::default();
    recomputing.set_policy(RegenerationPolicy::Recompute);
    let model = users_model();
    let mut session = loaded_session(&recomputing, &db).await;
    recomputing.continue_to_suggestions(&mut session).unwrap();
    recomputing.generate_suggestions(&mut session, &model).await.unwrap();
    let second = recomputing
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap();
    assert_eq!(second.generated, ["id", "email"]);
    assert_eq!(model.calls.get(), 4);
}

#[tokio::test]
async fn test_failed_row_can_be_retried() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    model.failing.borrow_mut().insert("email");
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    let report = controller
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap();
    assert_eq!(report.generated, ["id"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "email");
    assert!(!report.is_complete());
    assert_eq!(session.working_set().get("email").unwrap().llm_suggestion, None);

    model.failing.borrow_mut().clear();
    let retry = controller
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap();
    assert_eq!(retry.generated, ["email"]);
    assert_eq!(retry.skipped, ["id"]);
    assert_eq!(
        session
            .working_set()
            .get("email")
            .unwrap()
            .llm_suggestion
            .as_deref(),
        Some("User's email address")
    );
}

#[tokio::test]
async fn test_actions_are_gated_by_step() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    let err = controller
        .generate_suggestions(&mut session, &model)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidState(_)));
    assert!(matches!(
        controller.review_sql(&mut session),
        Err(CatalogError::InvalidState(_))
    ));
    assert!(matches!(
        controller.continue_to_sql(&mut session),
        Err(CatalogError::InvalidState(_))
    ));
    assert_eq!(session.step(), WizardStep::TableLoaded);
    assert_eq!(model.calls.get(), 0);

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.continue_to_suggestions(&mut session).unwrap();
    assert_eq!(session.step(), WizardStep::CommentsConfirmed);

    let messages = log_messages(&session);
    assert!(messages.iter().any(|m| m.starts_with("Error: Invalid step")));
}

#[tokio::test]
async fn test_repeated_continue_logs_one_move() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.continue_to_suggestions(&mut session).unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.continue_to_suggestions(&mut session).unwrap();

    let messages = log_messages(&session);
    let moves: Vec<&str> = messages
        .iter()
        .map(String::as_str)
        .filter(|m| m.starts_with("Move to step"))
        .collect();
    assert_eq!(moves, ["Move to step 2: suggestions", "Move to step 3: comments edition"]);
}

#[tokio::test]
async fn test_reload_discards_edits() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.generate_suggestions(&mut session, &model).await.unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller
        .edit_comment(&mut session, "id", "Surrogate key")
        .unwrap();
    assert!(matches!(
        controller.edit_comment(&mut session, "emial", "typo"),
        Err(CatalogError::UnknownColumn(_))
    ));

    controller
        .load_table(&mut session, &db, "public", "users")
        .await
        .unwrap();

    assert_eq!(session.step(), WizardStep::TableLoaded);
    assert_eq!(db.fetches.get(), 2);
    for column in session.working_set() {
        assert_eq!(column.final_comment, None);
        assert_eq!(column.llm_suggestion, None);
    }
}

#[tokio::test]
async fn test_failed_load_leaves_session_untouched() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let mut session = loaded_session(&controller, &db).await;

    let err = controller
        .load_table(&mut session, &db, "public", "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Query(_)));
    assert_eq!(session.step(), WizardStep::TableLoaded);
    assert_eq!(session.table(), Some("users"));
    assert_eq!(session.working_set().len(), 2);

    let messages = log_messages(&session);
    assert!(messages.iter().any(|m| m.starts_with("Failed to load public.missing")));
}

#[tokio::test]
async fn test_load_requires_key_and_connection() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());

    let mut session = Session::new(AppSettings::default());
    let err = controller
        .load_table(&mut session, &db, "public", "users")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Config(_)));

    let mut session = configured_session();
    let err = controller
        .load_table(&mut session, &db, "public", "users")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Connection(_)));

    let mut unreachable = FakeCatalog::new(users_columns());
    unreachable.reachable = false;
    assert!(controller.test_connection(&mut session, &unreachable).await.is_err());
    assert!(!session.connection_verified());
    assert_eq!(db.fetches.get(), 0);
}

#[tokio::test]
async fn test_execution_failure_is_reported() {
    let controller = WorkflowController::default();
    let mut db = FakeCatalog::new(users_columns());
    db.fail_apply = true;
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.generate_suggestions(&mut session, &model).await.unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.continue_to_sql(&mut session).unwrap();

    let err = controller.execute_sql(&mut session, &db).await.unwrap_err();
    assert!(matches!(err, CatalogError::Execution(_)));
    assert!(db.applied.borrow().is_empty());
    assert_eq!(session.step(), WizardStep::SqlReviewed);

    let messages = log_messages(&session);
    assert!(messages.iter().any(|m| m.starts_with("SQL error:")));
}

#[tokio::test]
async fn test_cleared_comments_produce_no_statements() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.generate_suggestions(&mut session, &model).await.unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.edit_comment(&mut session, "id", "").unwrap();
    controller.edit_comment(&mut session, "email", "").unwrap();
    controller.continue_to_sql(&mut session).unwrap();

    assert!(controller.review_sql(&mut session).unwrap().is_empty());
    assert_eq!(controller.execute_sql(&mut session, &db).await.unwrap(), 0);
    assert!(db.applied.borrow().is_empty());
    assert!(log_messages(&session).contains(&"No new comments to apply".to_owned()));
}

#[tokio::test]
async fn test_export_writes_catalog_page() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let model = users_model();
    let mut session = loaded_session(&controller, &db).await;

    controller.continue_to_suggestions(&mut session).unwrap();
    controller.generate_suggestions(&mut session, &model).await.unwrap();
    controller.confirm_suggestions(&mut session).unwrap();
    controller.continue_to_sql(&mut session).unwrap();
    controller.continue_to_export(&mut session).unwrap();
    assert_eq!(session.step(), WizardStep::Exported);

    let dir = tempfile::tempdir().unwrap();
    let path = controller
        .export_markdown(&mut session, &model, dir.path())
        .await
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "users_catalog.md");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with(
        "## Table: `users`\n\n**Description:** Registered users of the application."
    ));
    assert!(written.contains("| `id` | `integer` | Unique identifier for the user |"));
    assert!(written.contains("| `email` | `character varying(255)` | User's email address |"));

    // Description is memoized: two column calls plus one table call.
    controller.render_markdown(&mut session, &model).await.unwrap();
    assert_eq!(model.calls.get(), 3);
}

#[tokio::test]
async fn test_reset_flow_keeps_configuration() {
    let controller = WorkflowController::default();
    let db = FakeCatalog::new(users_columns());
    let mut session = loaded_session(&controller, &db).await;

    session.reset_flow();
    assert_eq!(session.step(), WizardStep::Unloaded);
    assert!(session.working_set().is_empty());
    assert!(session.log().is_empty());
    assert!(session.settings.ai.has_api_key());
    assert!(session.connection_verified());

    controller
        .load_table(&mut session, &db, "public", "users")
        .await
        .unwrap();
    assert_eq!(session.step(), WizardStep::TableLoaded);
}
