use crate::MySqlFormatter;
use quarry_core::{Dialect, FormatterSettings, SqlFormatter, register_dialect};
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn create_sql_formatter(&self, settings: FormatterSettings) -> Box<dyn SqlFormatter> {
        Box::new(MySqlFormatter::new(settings))
    }

    fn identifier_quote_string(&self) -> &'static str {
        "`"
    }

    fn extra_name_characters(&self) -> &'static str {
        "#@"
    }

    fn supports_mixed_case_identifiers(&self) -> bool {
        true
    }

    fn stores_mixed_case_identifiers(&self) -> bool {
        true
    }

    fn stores_upper_case_identifiers(&self) -> bool {
        false
    }

    fn supports_mixed_case_quoted_identifiers(&self) -> bool {
        true
    }

    fn stores_mixed_case_quoted_identifiers(&self) -> bool {
        true
    }

    fn sql_keywords(&self) -> &'static [&'static str] {
        MYSQL_KEYWORDS
    }

    fn max_column_name_length(&self) -> usize {
        64
    }
}

/// Make [`MySqlDialect`] the dialect detected by databases created without an explicit one.
pub fn register() {
    register_dialect(Arc::new(MySqlDialect));
}

/// Reserved words of MySQL that are not SQL:2003 reserved words.
pub const MYSQL_KEYWORDS: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "ASC", "BEFORE", "CASCADE", "CHANGE", "DATABASE", "DATABASES",
    "DAY_HOUR", "DAY_MICROSECOND", "DAY_MINUTE", "DAY_SECOND", "DELAYED", "DESC", "DISTINCTROW",
    "DIV", "DUAL", "ELSEIF", "EMPTY", "ENCLOSED", "ESCAPED", "EXIT", "EXPLAIN", "FIRST_VALUE",
    "FLOAT4", "FLOAT8", "FORCE", "FULLTEXT", "GENERATED", "GROUPS", "HIGH_PRIORITY",
    "HOUR_MICROSECOND", "HOUR_MINUTE", "HOUR_SECOND", "IF", "IGNORE", "INDEX", "INFILE", "INT1",
    "INT2", "INT3", "INT4", "INT8", "ITERATE", "KEY", "KEYS", "KILL", "LAG", "LAST_VALUE", "LEAD",
    "LEAVE", "LIMIT", "LINEAR", "LINES", "LOAD", "LOCK", "LONG", "LONGBLOB", "LONGTEXT", "LOOP",
    "LOW_PRIORITY", "MASTER_BIND", "MASTER_SSL_VERIFY_SERVER_CERT", "MAXVALUE", "MEDIUMBLOB",
    "MEDIUMINT", "MEDIUMTEXT", "MIDDLEINT", "MINUTE_MICROSECOND", "MINUTE_SECOND",
    "NO_WRITE_TO_BINLOG", "NTH_VALUE", "NTILE", "OPTIMIZE", "OPTIMIZER_COSTS", "OPTION",
    "OPTIONALLY", "OUTFILE", "PURGE", "READ", "READ_WRITE", "REGEXP", "RENAME", "REPEAT",
    "REPLACE", "REQUIRE", "RESIGNAL", "RESTRICT", "RLIKE", "SCHEMA", "SCHEMAS",
    "SECOND_MICROSECOND", "SEPARATOR", "SHOW", "SIGNAL", "SPATIAL", "SQL_BIG_RESULT",
    "SQL_CALC_FOUND_ROWS", "SQL_SMALL_RESULT", "SSL", "STARTING", "STORED", "STRAIGHT_JOIN",
    "TERMINATED", "TINYBLOB", "TINYINT", "TINYTEXT", "UNDO", "UNLOCK", "UNSIGNED", "USAGE", "USE",
    "UTC_DATE", "UTC_TIME", "UTC_TIMESTAMP", "VARBINARY", "VARCHARACTER", "VIRTUAL", "WHILE",
    "WRITE", "XOR", "YEAR_MONTH", "ZEROFILL",
];
