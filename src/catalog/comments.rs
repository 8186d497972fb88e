//! `COMMENT ON COLUMN` statement rendering.

use super::model::WorkingSet;
use crate::config::AuditLog;

/// Keywords `quote_ident` always quotes in PostgreSQL 17: every keyword that
/// is not unreserved (reserved, column-name and type/function-name ones).
const QUOTED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "bigint", "binary", "bit", "boolean", "both", "case", "cast",
    "char", "character", "check", "coalesce", "collate", "collation", "column", "concurrently",
    "constraint", "create", "cross", "current_catalog", "current_date", "current_role",
    "current_schema", "current_time", "current_timestamp", "current_user", "dec", "decimal",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "exists",
    "extract", "false", "fetch", "float", "for", "foreign", "freeze", "from", "full", "grant",
    "greatest", "group", "grouping", "having", "ilike", "in", "initially", "inner", "inout",
    "int", "integer", "intersect", "interval", "into", "is", "isnull", "join", "json",
    "json_array", "json_arrayagg", "json_exists", "json_object", "json_objectagg", "json_query",
    "json_scalar", "json_serialize", "json_table", "json_value", "lateral", "leading", "least",
    "left", "like", "limit", "localtime", "localtimestamp", "merge_action", "national",
    "natural", "nchar", "none", "normalize", "not", "notnull", "null", "nullif", "numeric",
    "offset", "on", "only", "or", "order", "out", "outer", "overlaps", "overlay", "placing",
    "position", "precision", "primary", "real", "references", "returning", "right", "row",
    "select", "session_user", "setof", "similar", "smallint", "some", "substring", "symmetric",
    "system_user", "table", "tablesample", "then", "time", "timestamp", "to", "trailing",
    "treat", "trim", "true", "union", "unique", "user", "using", "values", "varchar",
    "variadic", "verbose", "when", "where", "window", "with", "xmlattributes", "xmlconcat",
    "xmlelement", "xmlexists", "xmlforest", "xmlnamespaces", "xmlparse", "xmlpi", "xmlroot",
    "xmlserialize", "xmltable",
];

/// Quote an identifier the way PostgreSQL's `quote_ident` does: bare when it
/// is made of lower-case letters, digits and underscores, does not start with
/// a digit and is not a quoted keyword; double-quoted otherwise.
pub fn quote_identifier(ident: &str) -> String {
    let mut chars = ident.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !QUOTED_KEYWORDS.contains(&ident);

    if plain {
        ident.to_owned()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Render a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub fn comment_statement(schema: &str, table: &str, column: &str, comment: &str) -> String {
    format!(
        "COMMENT ON COLUMN {}.{}.{} IS {};",
        quote_identifier(schema),
        quote_identifier(table),
        quote_identifier(column),
        quote_literal(comment)
    )
}

/// One statement per column with a non-empty final comment, in working-set
/// order. Each statement is also written to the audit log.
pub fn build_comment_statements(
    working_set: &WorkingSet,
    schema: &str,
    table: &str,
    log: &mut AuditLog,
) -> Vec<String> {
    let mut statements = Vec::new();
    for column in working_set {
        if let Some(comment) = column.approved_comment() {
            let statement = comment_statement(schema, table, &column.column_name, comment);
            log.push(format!("Generated SQL: {statement}"));
            statements.push(statement);
        }
    }
    statements
}
