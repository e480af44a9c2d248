use crate::PostgresFormatter;
use quarry_core::{Dialect, FormatterSettings, SqlFormatter, register_dialect};
use std::sync::Arc;

/// PostgreSQL folds unquoted identifiers to lower case, so keywords are written
/// in lower case too unless configured otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn create_sql_formatter(&self, settings: FormatterSettings) -> Box<dyn SqlFormatter> {
        Box::new(PostgresFormatter::new(settings))
    }

    fn stores_upper_case_identifiers(&self) -> bool {
        false
    }

    fn stores_lower_case_identifiers(&self) -> bool {
        true
    }

    fn sql_keywords(&self) -> &'static [&'static str] {
        POSTGRES_KEYWORDS
    }

    fn max_column_name_length(&self) -> usize {
        63
    }
}

pub fn register() {
    register_dialect(Arc::new(PostgresDialect));
}

/// Reserved words of PostgreSQL that are not SQL:2003 reserved words.
pub const POSTGRES_KEYWORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "ASC", "CONCURRENTLY", "DEFERRABLE", "DESC", "DO", "FREEZE", "ILIKE",
    "INITIALLY", "ISNULL", "LIMIT", "NOTNULL", "OFFSET", "PLACING", "RETURNING", "VARIADIC",
    "VERBOSE",
];
