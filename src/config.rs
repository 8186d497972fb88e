//! Session configuration and the audit trail.
//!
//! Settings come from the environment (optionally seeded from a `.env` file) or
//! are typed in during a wizard session. Secrets are kept in [`SecretString`]
//! and never printed.

use crate::error::{CatalogError, Result};
use chrono::{DateTime, Local};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::str::FromStr;

/// Number of audit entries shown by [`AuditLog::recent`].
pub const RECENT_LOG_WINDOW: usize = 50;

/// Configuration keys accepted by [`AppSettings::set`].
pub const SETTING_KEYS: [&str; 7] = [
    "openai_api_key",
    "llm_model",
    "db_host",
    "db_port",
    "db_name",
    "db_user",
    "db_password",
];

/// Chat models offered for drafting descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmModel {
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl LlmModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for LlmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmModel {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "gpt-4o" => Ok(Self::Gpt4o),
            "gpt-4o-mini" => Ok(Self::Gpt4oMini),
            other => Err(CatalogError::Config(format!(
                "unsupported model '{other}' (expected gpt-4o or gpt-4o-mini)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AIConfig {
    pub api_key: SecretString,
    pub model: LlmModel,
    pub temperature: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::default(),
            model: LlmModel::default(),
            temperature: 0.0,
        }
    }
}

impl AIConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
    pub password: SecretString,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: "5432".to_owned(),
            database: String::new(),
            user: String::new(),
            password: SecretString::default(),
        }
    }
}

impl DbSettings {
    /// Build sqlx connect options. Credentials are passed as fields, not
    /// spliced into a URL, so special characters in the password are safe.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the port is not a number or no
    /// database name is set.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| CatalogError::Config(format!("invalid port '{}'", self.port)))?;
        if self.database.trim().is_empty() {
            return Err(CatalogError::Config("database name is not set".to_owned()));
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(port)
            .database(&self.database);
        if !self.user.is_empty() {
            options = options.username(&self.user);
        }
        let password = self.password.expose_secret();
        if !password.is_empty() {
            options = options.password(password);
        }
        Ok(options)
    }
}

/// Everything the session needs to reach the database and the model.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub ai: AIConfig,
    pub database: DbSettings,
}

impl AppSettings {
    /// Load `.env` (overriding already-set variables) and read the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if `.env` exists but cannot be read or
    /// `LLM_MODEL` names an unsupported model.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv_override() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => return Err(CatalogError::Config(format!("failed to read .env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if `LLM_MODEL` is not a supported model.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = match lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => LlmModel::default(),
        };
        let defaults = DbSettings::default();

        Ok(Self {
            ai: AIConfig {
                api_key: SecretString::from(lookup("OPENAI_API_KEY").unwrap_or_default()),
                model,
                ..AIConfig::default()
            },
            database: DbSettings {
                host: lookup("DB_HOST").unwrap_or(defaults.host),
                port: lookup("DB_PORT").unwrap_or(defaults.port),
                database: lookup("DB_NAME").unwrap_or_default(),
                user: lookup("DB_USER").unwrap_or_default(),
                password: SecretString::from(lookup("DB_PASSWORD").unwrap_or_default()),
            },
        })
    }

    /// Set one field by its configuration key (see [`SETTING_KEYS`]).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] for an unknown key or model name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "openai_api_key" => self.ai.api_key = SecretString::from(value.to_owned()),
            "llm_model" => self.ai.model = value.parse()?,
            "db_host" => value.clone_into(&mut self.database.host),
            "db_port" => value.clone_into(&mut self.database.port),
            "db_name" => value.clone_into(&mut self.database.database),
            "db_user" => value.clone_into(&mut self.database.user),
            "db_password" => self.database.password = SecretString::from(value.to_owned()),
            other => {
                return Err(CatalogError::Config(format!(
                    "unknown setting '{other}' (expected one of: {})",
                    SETTING_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |secret: &SecretString| {
            if secret.expose_secret().is_empty() {
                "(not set)"
            } else {
                "********"
            }
        };
        writeln!(f, "openai_api_key = {}", mask(&self.ai.api_key))?;
        writeln!(f, "llm_model      = {}", self.ai.model)?;
        writeln!(f, "db_host        = {}", self.database.host)?;
        writeln!(f, "db_port        = {}", self.database.port)?;
        writeln!(f, "db_name        = {}", self.database.database)?;
        writeln!(f, "db_user        = {}", self.database.user)?;
        write!(f, "db_password    = {}", mask(&self.database.password))
    }
}

/// One audit trail line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Append-only audit trail for one session.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<LogEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "audit", "{message}");
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The last [`RECENT_LOG_WINDOW`] entries, oldest first.
    pub fn recent(&self) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(RECENT_LOG_WINDOW);
        self.entries.get(start..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_settings_from_lookup_defaults() {
        let settings = AppSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, "5432");
        assert_eq!(settings.ai.model, LlmModel::Gpt4o);
        assert!(!settings.ai.has_api_key());
    }

    #[test]
    fn test_settings_from_lookup_values() {
        let settings = AppSettings::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "warehouse"),
            ("DB_USER", "analyst"),
            ("DB_PASSWORD", "p@ss:word"),
        ]))
        .unwrap();

        assert!(settings.ai.has_api_key());
        assert_eq!(settings.ai.model, LlmModel::Gpt4oMini);
        assert_eq!(settings.database.host, "db.internal");
        assert_eq!(settings.database.database, "warehouse");
        assert_eq!(settings.database.password.expose_secret(), "p@ss:word");
        assert!(settings.database.connect_options().is_ok());
    }

    #[test]
    fn test_unsupported_model_is_rejected() {
        let result = AppSettings::from_lookup(lookup_from(&[("LLM_MODEL", "davinci")]));
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_set_by_key() {
        let mut settings = AppSettings::default();
        settings.set("db_name", "shop").unwrap();
        settings.set("llm_model", "gpt-4o-mini").unwrap();
        settings.set("openai_api_key", "sk-live").unwrap();

        assert_eq!(settings.database.database, "shop");
        assert_eq!(settings.ai.model, LlmModel::Gpt4oMini);
        assert!(settings.ai.has_api_key());
        assert!(settings.set("db_colour", "blue").is_err());
    }

    #[test]
    fn test_invalid_port() {
        let mut settings = AppSettings::default();
        settings.set("db_name", "shop").unwrap();
        settings.set("db_port", "five").unwrap();
        assert!(matches!(
            settings.database.connect_options(),
            Err(CatalogError::Config(_))
        ));
    }

    #[test]
    fn test_display_masks_secrets() {
        let mut settings = AppSettings::default();
        settings.set("db_password", "hunter2").unwrap();
        let shown = settings.to_string();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("db_password    = ********"));
        assert!(shown.contains("openai_api_key = (not set)"));
    }

    #[test]
    fn test_audit_log_recent_window() {
        let mut log = AuditLog::new();
        for i in 0..(RECENT_LOG_WINDOW + 7) {
            log.push(format!("event {i}"));
        }

        assert_eq!(log.len(), RECENT_LOG_WINDOW + 7);
        let recent = log.recent();
        assert_eq!(recent.len(), RECENT_LOG_WINDOW);
        assert_eq!(recent[0].message, "event 7");
        assert_eq!(recent[RECENT_LOG_WINDOW - 1].message, "event 56");
    }

    #[test]
    fn test_log_entry_format() {
        let mut log = AuditLog::new();
        log.push("Table loaded: public.users");
        let line = log.entries()[0].to_string();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Table loaded: public.users"));
        assert_eq!(line.len(), "[00:00:00] Table loaded: public.users".len());
    }
}
