use thiserror::Error;

/// Errors raised by quarry itself, as opposed to errors coming from a driver.
///
/// They travel inside [`crate::Error`] and can be recovered with
/// `error.downcast_ref::<SqlError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// The active dialect cannot render the requested construct.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    /// An item of a batch rendered to a SQL text different from the first item.
    #[error("Every item in a batch operation must generate the same SQL, found: {sql}")]
    BatchStructureMismatch { sql: String },
    /// The driver reported a number of results different from the number of batch items.
    #[error("The batch contained {expected} items but the driver returned {actual} results")]
    BatchSizeMismatch { expected: usize, actual: usize },
    #[error("{0}")]
    TransactionState(String),
    #[error("Identifier `{identifier}` is longer than the maximum of {max} characters")]
    IdentifierTooLong { identifier: String, max: usize },
    #[error("More than one dialect implementation found: {}", .0.join(", "))]
    AmbiguousDialect(Vec<String>),
    #[error("Column `{0}` was not found in the result row")]
    ColumnNotFound(String),
    #[error("Confused column name `{name}`, there are {count} columns with the same name in the result row")]
    AmbiguousColumn { name: String, count: usize },
    #[error("Column value {found} cannot be read as {expected}")]
    TypeMismatch { expected: String, found: String },
}
