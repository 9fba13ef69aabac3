//! SQL text helpers shared by the DuckDB store.

use sb_core::{Column, ColumnKind, TableName};

/// Quote an identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified table name.
pub(crate) fn quote_table(name: &TableName) -> String {
    match name.parts() {
        (Some(schema), table) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
        (None, table) => quote_ident(table),
    }
}

/// Quote a string literal.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Expression used to read a column back.
///
/// Fixed-point columns are read as DOUBLE and anything without a scalar
/// mapping (dates, enums, nested types) as VARCHAR.
pub(crate) fn read_expr(column: &Column) -> String {
    let ident = quote_ident(&column.name);
    match column.kind() {
        ColumnKind::Float => format!("CAST({ident} AS DOUBLE)"),
        ColumnKind::Other => format!("CAST({ident} AS VARCHAR)"),
        _ => ident,
    }
}

/// Placeholder that casts a bound parameter to the column's declared type.
pub(crate) fn param_expr(column: &Column) -> String {
    format!("CAST(? AS {})", column.data_type)
}

/// Extract the sequence name from a `nextval('...')` column default.
pub(crate) fn parse_sequence_default(default: &str) -> Option<String> {
    let lower = default.to_ascii_lowercase();
    let start = lower.find("nextval(")? + "nextval(".len();
    let rest = &default[start..];
    let open = rest.find('\'')?;
    let after = &rest[open + 1..];
    let close = after.find('\'')?;
    let name = &after[..close];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
