use crate::{ColumnDeclaring, DeclaredColumn};
use quarry_core::{Expression, Result, Row, SqlError, Value};
use std::ops::Deref;

/// A row returned by a [`crate::Query`], read through the columns of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    row: Row,
}

impl QueryRow {
    pub fn new(row: Row) -> Self {
        Self { row }
    }

    pub fn into_row(self) -> Row {
        self.row
    }

    /// Value of a column of the query, `None` when it is NULL or not part of the result.
    ///
    /// Labelled expressions are looked up by label, columns by name ignoring case.
    /// A name matching more than one result column is an error, and so is any other
    /// expression without a label: it has no name to be found by.
    pub fn get<T>(&self, column: &impl ColumnDeclaring<T>) -> Result<Option<T>> {
        if let Some(label) = column.label() {
            return match self.row.index_of(&label) {
                Some(index) => column.sql_type().get_result(&self.row, index),
                None => Ok(None),
            };
        }
        let Expression::Column(reference) = column.as_expression() else {
            return Err(SqlError::ColumnNotFound(
                "unlabelled expression, declare it with `aliased(...)` to read it".into(),
            )
            .into());
        };
        let indices = self
            .row
            .labels
            .iter()
            .enumerate()
            .filter(|(_, v)| v.eq_ignore_ascii_case(&reference.name))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        match indices.as_slice() {
            [] => Ok(None),
            [index] => column.sql_type().get_result(&self.row, *index),
            _ => Err(SqlError::AmbiguousColumn {
                name: reference.name.to_string(),
                count: indices.len(),
            }
            .into()),
        }
    }

    /// Value of a labelled expression, looked up by its label only.
    pub fn get_declared<T>(&self, column: &DeclaredColumn<T>) -> Result<Option<T>> {
        match self.row.index_of(column.declared_name()) {
            Some(index) => column.sql_type().get_result(&self.row, index),
            None => Ok(None),
        }
    }

    /// Raw value at the given position.
    pub fn get_value(&self, index: usize) -> Result<&Value> {
        self.row.get(index)
    }
}

impl Deref for QueryRow {
    type Target = Row;
    fn deref(&self) -> &Self::Target {
        &self.row
    }
}

impl From<Row> for QueryRow {
    fn from(value: Row) -> Self {
        Self::new(value)
    }
}
