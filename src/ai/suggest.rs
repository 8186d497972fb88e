//! Prompt assembly and reply cleanup for column suggestions.

use super::client::Completion;
use crate::error::{CatalogError, Result};

const COLUMN_NAME_PLACEHOLDER: &str = "{column_name}";
const DATA_TYPE_PLACEHOLDER: &str = "{data_type}";

/// Prompt used when the user has not edited the template.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are helping document a PostgreSQL table.\n\
Write a short and clear description (one sentence) for a column named '{column_name}' of type '{data_type}'.\n\
- Do NOT include the column name.\n\
- Do NOT include the table name.\n\
- Do NOT use quotation marks.\n\
Output only the sentence.";

/// User-editable prompt with `{column_name}` and `{data_type}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Validate a user-supplied template.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] unless both `{column_name}` and
    /// `{data_type}` appear in `text`.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        for placeholder in [COLUMN_NAME_PLACEHOLDER, DATA_TYPE_PLACEHOLDER] {
            if !text.contains(placeholder) {
                return Err(CatalogError::Config(format!(
                    "prompt template must contain {placeholder}"
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Fill both placeholders in a single pass, so substituted values are
    /// never scanned again. Other braces are copied as they are.
    pub fn render(&self, column_name: &str, data_type: &str) -> String {
        let mut rendered =
            String::with_capacity(self.text.len() + column_name.len() + data_type.len());
        let mut rest = self.text.as_str();
        while let Some(start) = rest.find('{') {
            let (literal, tail) = rest.split_at(start);
            rendered.push_str(literal);
            if let Some(after) = tail.strip_prefix(COLUMN_NAME_PLACEHOLDER) {
                rendered.push_str(column_name);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(DATA_TYPE_PLACEHOLDER) {
                rendered.push_str(data_type);
                rest = after;
            } else {
                rendered.push('{');
                rest = tail.strip_prefix('{').unwrap_or_default();
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_PROMPT_TEMPLATE.to_owned(),
        }
    }
}

/// Trim the reply and drop one layer of enclosing straight quotes.
pub fn clean_completion(raw: &str) -> String {
    let text = raw.trim();
    let text = text.strip_prefix(['"', '\'']).unwrap_or(text);
    let text = text.strip_suffix(['"', '\'']).unwrap_or(text);
    text.trim().to_owned()
}

/// Ask the model for a one-sentence description of a column.
///
/// # Errors
///
/// Propagates the completion error.
pub async fn suggest_comment<C: Completion>(
    column_name: &str,
    data_type: &str,
    template: &PromptTemplate,
    completion: &C,
) -> Result<String> {
    let prompt = template.render(column_name, data_type);
    let reply = completion.complete(&prompt).await?;
    Ok(clean_completion(&reply))
}

pub fn table_description_prompt(table: &str, column_names: &[&str]) -> String {
    let listed = column_names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are helping document a PostgreSQL table named '{table}'. \
         Here are the columns: [{listed}]. \
         Write a short description for this table. Do not include column names. \
         No more than 3 sentences, only if needed."
    )
}

/// Ask the model for a short table-level description.
///
/// # Errors
///
/// Propagates the completion error.
pub async fn suggest_table_description<C: Completion>(
    table: &str,
    column_names: &[&str],
    completion: &C,
) -> Result<String> {
    let reply = completion
        .complete(&table_description_prompt(table, column_names))
        .await?;
    Ok(reply.trim().to_owned())
}
