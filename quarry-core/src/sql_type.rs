use crate::{AsValue, Bind, Result, Row, SqlError, Value};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::Arc,
};

/// Maps a Rust type to a SQL type: how values are bound to statements and how
/// they are read back from result rows.
pub trait SqlType<T>: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Typed NULL describing the SQL kind of this type.
    fn prototype(&self) -> Value;

    fn bind_parameter(&self, statement: &mut dyn Bind, index: usize, value: Option<T>) -> Result<()>;

    fn get_result(&self, row: &Row, index: usize) -> Result<Option<T>>;

    fn get_result_by_name(&self, row: &Row, name: &str) -> Result<Option<T>> {
        let index = row
            .index_of(name)
            .ok_or_else(|| SqlError::ColumnNotFound(name.to_string()))?;
        self.get_result(row, index)
    }
}

impl<T> Debug for dyn SqlType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

fn bind_as_value<T: AsValue>(
    statement: &mut dyn Bind,
    index: usize,
    value: Option<T>,
) -> Result<()> {
    statement.bind(
        index,
        match value {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        },
    )
}

/// Binds and reads the exact [`Value`] variant of `T`.
pub struct SimpleSqlType<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> SimpleSqlType<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }
}

impl<T> Clone for SimpleSqlType<T> {
    fn clone(&self) -> Self {
        Self::new(self.name)
    }
}

impl<T> Debug for SimpleSqlType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleSqlType({})", self.name)
    }
}

impl<T: AsValue> SqlType<T> for SimpleSqlType<T> {
    fn type_name(&self) -> &'static str {
        self.name
    }
    fn prototype(&self) -> Value {
        T::as_empty_value()
    }
    fn bind_parameter(&self, statement: &mut dyn Bind, index: usize, value: Option<T>) -> Result<()> {
        bind_as_value(statement, index, value)
    }
    fn get_result(&self, row: &Row, index: usize) -> Result<Option<T>> {
        let value = row.get(index)?;
        if value.is_null() {
            return Ok(None);
        }
        if !value.same_type(&T::as_empty_value()) {
            return Err(SqlError::TypeMismatch {
                expected: self.name.to_string(),
                found: format!("{value:?}"),
            }
            .into());
        }
        T::try_from_value(value.clone()).map(Some)
    }
}

/// Accepts whatever variant the driver returned and converts it into `T`.
///
/// Drivers do not agree on the native representation of some types (a MySQL
/// `COUNT(*)` is a `BIGINT`, the same in PostgreSQL may come back as a
/// `NUMERIC`), columns declared with a convertible type normalize them.
pub struct ConvertibleSqlType<T> {
    name: &'static str,
    convert: Option<fn(Value) -> Result<T>>,
}

impl<T> ConvertibleSqlType<T> {
    /// Converts using [`AsValue::try_from_value`].
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            convert: None,
        }
    }
    pub const fn with_converter(name: &'static str, convert: fn(Value) -> Result<T>) -> Self {
        Self {
            name,
            convert: Some(convert),
        }
    }
}

impl<T> Clone for ConvertibleSqlType<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            convert: self.convert,
        }
    }
}

impl<T> Debug for ConvertibleSqlType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ConvertibleSqlType({})", self.name)
    }
}

impl<T: AsValue> SqlType<T> for ConvertibleSqlType<T> {
    fn type_name(&self) -> &'static str {
        self.name
    }
    fn prototype(&self) -> Value {
        T::as_empty_value()
    }
    fn bind_parameter(&self, statement: &mut dyn Bind, index: usize, value: Option<T>) -> Result<()> {
        bind_as_value(statement, index, value)
    }
    fn get_result(&self, row: &Row, index: usize) -> Result<Option<T>> {
        let value = row.get(index)?;
        if value.is_null() {
            return Ok(None);
        }
        let value = value.clone();
        match self.convert {
            Some(convert) => convert(value),
            None => T::try_from_value(value),
        }
        .map(Some)
    }
}

/// A [`SqlType`] for `R` stored through an underlying `SqlType<T>`.
pub struct TransformedSqlType<T, R> {
    underlying: Arc<dyn SqlType<T>>,
    from_underlying: Arc<dyn Fn(T) -> R + Send + Sync>,
    to_underlying: Arc<dyn Fn(R) -> T + Send + Sync>,
}

impl<T, R> TransformedSqlType<T, R> {
    pub fn new(
        underlying: Arc<dyn SqlType<T>>,
        from_underlying: impl Fn(T) -> R + Send + Sync + 'static,
        to_underlying: impl Fn(R) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            underlying,
            from_underlying: Arc::new(from_underlying),
            to_underlying: Arc::new(to_underlying),
        }
    }
}

impl<T, R> Clone for TransformedSqlType<T, R> {
    fn clone(&self) -> Self {
        Self {
            underlying: self.underlying.clone(),
            from_underlying: self.from_underlying.clone(),
            to_underlying: self.to_underlying.clone(),
        }
    }
}

impl<T, R> Debug for TransformedSqlType<T, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TransformedSqlType({})", self.underlying.type_name())
    }
}

impl<T, R> SqlType<R> for TransformedSqlType<T, R> {
    fn type_name(&self) -> &'static str {
        self.underlying.type_name()
    }
    fn prototype(&self) -> Value {
        self.underlying.prototype()
    }
    fn bind_parameter(&self, statement: &mut dyn Bind, index: usize, value: Option<R>) -> Result<()> {
        self.underlying
            .bind_parameter(statement, index, value.map(|v| (self.to_underlying)(v)))
    }
    fn get_result(&self, row: &Row, index: usize) -> Result<Option<R>> {
        Ok(self
            .underlying
            .get_result(row, index)?
            .map(|v| (self.from_underlying)(v)))
    }
}

pub trait SqlTypeExt<T>: SqlType<T> + Sized + 'static {
    /// Build a type for `R` stored as this type.
    ///
    /// ```rust
    /// use quarry_core::{SqlTypeExt, sql_types};
    /// #[derive(Debug, Clone, Copy, PartialEq)]
    /// enum Gender { Male, Female }
    /// let gender = sql_types::INT.transform(
    ///     |v| if v == 0 { Gender::Male } else { Gender::Female },
    ///     |v| v as i32,
    /// );
    /// # let _ = gender;
    /// ```
    fn transform<R>(
        self,
        from_underlying: impl Fn(T) -> R + Send + Sync + 'static,
        to_underlying: impl Fn(R) -> T + Send + Sync + 'static,
    ) -> TransformedSqlType<T, R> {
        TransformedSqlType::new(Arc::new(self), from_underlying, to_underlying)
    }
}

impl<T, S: SqlType<T> + 'static> SqlTypeExt<T> for S {}

/// Built-in SQL types.
pub mod sql_types {
    use super::{ConvertibleSqlType, SimpleSqlType};
    use rust_decimal::Decimal;
    use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
    use uuid::Uuid;

    pub const BOOLEAN: SimpleSqlType<bool> = SimpleSqlType::new("boolean");
    pub const SHORT: ConvertibleSqlType<i16> = ConvertibleSqlType::new("smallint");
    pub const INT: ConvertibleSqlType<i32> = ConvertibleSqlType::new("int");
    pub const LONG: ConvertibleSqlType<i64> = ConvertibleSqlType::new("bigint");
    pub const FLOAT: ConvertibleSqlType<f32> = ConvertibleSqlType::new("float");
    pub const DOUBLE: ConvertibleSqlType<f64> = ConvertibleSqlType::new("double");
    pub const DECIMAL: ConvertibleSqlType<Decimal> = ConvertibleSqlType::new("decimal");
    pub const VARCHAR: SimpleSqlType<String> = SimpleSqlType::new("varchar");
    pub const TEXT: SimpleSqlType<String> = SimpleSqlType::new("text");
    pub const BLOB: SimpleSqlType<Box<[u8]>> = SimpleSqlType::new("blob");
    pub const BYTES: SimpleSqlType<Vec<u8>> = SimpleSqlType::new("bytes");
    pub const DATE: ConvertibleSqlType<Date> = ConvertibleSqlType::new("date");
    pub const TIME: SimpleSqlType<Time> = SimpleSqlType::new("time");
    pub const DATETIME: ConvertibleSqlType<PrimitiveDateTime> =
        ConvertibleSqlType::new("datetime");
    pub const TIMESTAMP: ConvertibleSqlType<OffsetDateTime> =
        ConvertibleSqlType::new("timestamp");
    pub const UUID: ConvertibleSqlType<Uuid> = ConvertibleSqlType::new("uuid");
}
