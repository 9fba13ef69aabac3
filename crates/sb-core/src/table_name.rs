//! Strongly-typed table name.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// A table name, optionally schema-qualified (`schema.table`).
    pub struct TableName;
}

impl TableName {
    /// Build a name from an optional schema and a bare table name.
    pub fn qualified(schema: Option<&str>, table: &str) -> Self {
        match schema {
            Some(s) => Self::new(format!("{s}.{table}")),
            None => Self::new(table),
        }
    }

    /// Split into `(schema, table)`; the schema is `None` for bare names.
    pub fn parts(&self) -> (Option<&str>, &str) {
        match self.as_str().rsplit_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, self.as_str()),
        }
    }

    /// The bare table name without any schema prefix.
    pub fn table(&self) -> &str {
        self.parts().1
    }
}
