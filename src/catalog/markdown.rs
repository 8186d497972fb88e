//! Markdown rendering for the table catalog page.

use super::model::WorkingSet;

/// File name offered for the exported page.
pub fn export_file_name(table: &str) -> String {
    format!("{table}_catalog.md")
}

/// Render the catalog page: heading, description paragraph, and one table row
/// per column in catalog order.
pub fn render_catalog_markdown(table: &str, description: &str, working_set: &WorkingSet) -> String {
    let mut lines = vec![
        format!("## Table: `{table}`"),
        String::new(),
        format!("**Description:** {}", single_line(description)),
        String::new(),
        "| Column | Data Type | Description |".to_owned(),
        "|--------|-----------|-------------|".to_owned(),
    ];

    for column in working_set {
        let comment = column.final_comment.as_deref().unwrap_or_default();
        lines.push(format!(
            "| `{}` | `{}` | {} |",
            column.column_name,
            column.data_type,
            table_cell(comment)
        ));
    }

    lines.join("\n")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Keeps a cell from breaking the table layout.
fn table_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}
