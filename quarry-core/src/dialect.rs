use crate::{
    ANSI_SQL_2003_KEYWORDS, ConnectionMetadata, GenericSqlFormatter, Result, SqlError,
    SqlFormatter,
};
use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

/// Settings the formatter is created with.
#[derive(Debug, Clone)]
pub struct FormatterSettings {
    pub metadata: Arc<DatabaseMetadata>,
    /// Break lines before clauses and indent nested queries.
    pub beautify: bool,
    /// Spaces per nesting level when beautifying.
    pub indent_size: usize,
}

/// Database specific behavior: how SQL is rendered and how identifiers are treated.
///
/// Every method has a default describing a standard SQL database, a dialect
/// overrides what differs. The identifier flags follow the JDBC / R2DBC
/// `DatabaseMetaData` naming.
pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn create_sql_formatter(&self, settings: FormatterSettings) -> Box<dyn SqlFormatter> {
        Box::new(GenericSqlFormatter::new(settings))
    }

    fn identifier_quote_string(&self) -> &'static str {
        "\""
    }

    /// Characters other than letters, digits and `_` allowed in unquoted identifiers.
    fn extra_name_characters(&self) -> &'static str {
        ""
    }

    fn supports_mixed_case_identifiers(&self) -> bool {
        false
    }
    fn stores_mixed_case_identifiers(&self) -> bool {
        false
    }
    fn stores_upper_case_identifiers(&self) -> bool {
        true
    }
    fn stores_lower_case_identifiers(&self) -> bool {
        false
    }
    fn supports_mixed_case_quoted_identifiers(&self) -> bool {
        true
    }
    fn stores_mixed_case_quoted_identifiers(&self) -> bool {
        false
    }
    fn stores_upper_case_quoted_identifiers(&self) -> bool {
        false
    }
    fn stores_lower_case_quoted_identifiers(&self) -> bool {
        false
    }

    /// Keywords specific to this database, added to the SQL:2003 reserved words.
    fn sql_keywords(&self) -> &'static [&'static str] {
        &[]
    }

    /// Zero means unbounded.
    fn max_column_name_length(&self) -> usize {
        0
    }
}

/// Dialect without any database specific feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDialect;

impl Dialect for StandardDialect {
    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Everything the formatter needs to know about the database, resolved once
/// when the `Database` is created.
#[derive(Debug, Clone)]
pub struct DatabaseMetadata {
    pub product_name: String,
    pub product_version: String,
    pub dialect_name: &'static str,
    /// Upper case.
    pub keywords: HashSet<String>,
    pub identifier_quote_string: String,
    pub extra_name_characters: String,
    pub supports_mixed_case_identifiers: bool,
    pub stores_mixed_case_identifiers: bool,
    pub stores_upper_case_identifiers: bool,
    pub stores_lower_case_identifiers: bool,
    pub supports_mixed_case_quoted_identifiers: bool,
    pub stores_mixed_case_quoted_identifiers: bool,
    pub stores_upper_case_quoted_identifiers: bool,
    pub stores_lower_case_quoted_identifiers: bool,
    pub max_column_name_length: usize,
    pub always_quote_identifiers: bool,
    /// `None` lets the identifier storage flags decide.
    pub generate_sql_in_upper_case: Option<bool>,
}

impl DatabaseMetadata {
    pub fn new(dialect: &dyn Dialect) -> Self {
        Self {
            product_name: String::new(),
            product_version: String::new(),
            dialect_name: dialect.name(),
            keywords: ANSI_SQL_2003_KEYWORDS
                .iter()
                .chain(dialect.sql_keywords())
                .map(|v| v.to_uppercase())
                .collect(),
            identifier_quote_string: dialect.identifier_quote_string().into(),
            extra_name_characters: dialect.extra_name_characters().into(),
            supports_mixed_case_identifiers: dialect.supports_mixed_case_identifiers(),
            stores_mixed_case_identifiers: dialect.stores_mixed_case_identifiers(),
            stores_upper_case_identifiers: dialect.stores_upper_case_identifiers(),
            stores_lower_case_identifiers: dialect.stores_lower_case_identifiers(),
            supports_mixed_case_quoted_identifiers: dialect
                .supports_mixed_case_quoted_identifiers(),
            stores_mixed_case_quoted_identifiers: dialect.stores_mixed_case_quoted_identifiers(),
            stores_upper_case_quoted_identifiers: dialect.stores_upper_case_quoted_identifiers(),
            stores_lower_case_quoted_identifiers: dialect.stores_lower_case_quoted_identifiers(),
            max_column_name_length: dialect.max_column_name_length(),
            always_quote_identifiers: false,
            generate_sql_in_upper_case: None,
        }
    }

    pub fn with_connection_metadata(mut self, metadata: ConnectionMetadata) -> Self {
        self.product_name = metadata.product_name;
        self.product_version = metadata.product_version;
        self
    }

    pub fn with_always_quote_identifiers(mut self, always_quote_identifiers: bool) -> Self {
        self.always_quote_identifiers = always_quote_identifiers;
        self
    }

    pub fn with_generate_sql_in_upper_case(mut self, upper_case: Option<bool>) -> Self {
        self.generate_sql_in_upper_case = upper_case;
        self
    }

    pub fn is_keyword(&self, identifier: &str) -> bool {
        self.keywords.contains(&identifier.to_uppercase())
    }

    /// Whether keywords are written in upper case.
    pub fn upper_case_keywords(&self) -> bool {
        self.generate_sql_in_upper_case
            .unwrap_or(!self.stores_lower_case_identifiers)
    }

    /// Whether the identifier can be written without quotes, ignoring keywords and case.
    pub fn is_valid_identifier(&self, identifier: &str) -> bool {
        let extra = self.extra_name_characters.as_str();
        let mut chars = identifier.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_alphabetic() || first == '_' || extra.contains(first))
            && chars.all(|c| c.is_alphanumeric() || c == '_' || extra.contains(c))
    }
}

static DIALECTS: LazyLock<RwLock<Vec<Arc<dyn Dialect>>>> = LazyLock::new(Default::default);

/// Add a dialect to the process wide registry used by [`detect_dialect_implementation`].
/// Registering the same dialect name twice keeps the first one.
pub fn register_dialect(dialect: Arc<dyn Dialect>) {
    let mut dialects = DIALECTS.write().unwrap_or_else(PoisonError::into_inner);
    if dialects.iter().all(|v| v.name() != dialect.name()) {
        log::debug!("Registered dialect {}", dialect.name());
        dialects.push(dialect);
    }
}

pub fn registered_dialects() -> Vec<Arc<dyn Dialect>> {
    DIALECTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The dialect to use when none is configured explicitly.
pub fn detect_dialect_implementation() -> Result<Arc<dyn Dialect>> {
    select_dialect(&registered_dialects())
}

/// Standard dialect for no candidate, the candidate if there is exactly one, an error otherwise.
pub fn select_dialect(candidates: &[Arc<dyn Dialect>]) -> Result<Arc<dyn Dialect>> {
    match candidates {
        [] => Ok(Arc::new(StandardDialect)),
        [dialect] => Ok(dialect.clone()),
        _ => Err(SqlError::AmbiguousDialect(
            candidates.iter().map(|v| v.name().to_string()).collect(),
        )
        .into()),
    }
}
