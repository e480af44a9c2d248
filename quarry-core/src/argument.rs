use crate::{Bind, Result, SqlType, Value};
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// A value paired with the [`SqlType`] that knows how to bind it, with the
/// Rust type erased.
pub trait BindArgument: Send + Sync {
    fn bind(&self, statement: &mut dyn Bind, index: usize) -> Result<()>;
    fn type_name(&self) -> &'static str;
    fn prototype(&self) -> Value;
}

struct TypedArgument<T> {
    value: Option<T>,
    sql_type: Arc<dyn SqlType<T>>,
}

impl<T: Clone + Send + Sync> BindArgument for TypedArgument<T> {
    fn bind(&self, statement: &mut dyn Bind, index: usize) -> Result<()> {
        self.sql_type
            .bind_parameter(statement, index, self.value.clone())
    }
    fn type_name(&self) -> &'static str {
        self.sql_type.type_name()
    }
    fn prototype(&self) -> Value {
        self.sql_type.prototype()
    }
}

impl BindArgument for Value {
    fn bind(&self, statement: &mut dyn Bind, index: usize) -> Result<()> {
        statement.bind(index, self.clone())
    }
    fn type_name(&self) -> &'static str {
        Value::type_name(self)
    }
    fn prototype(&self) -> Value {
        self.as_null()
    }
}

/// Captures the value a binding would send to the driver.
#[derive(Default)]
struct CapturedValue(Option<Value>);

impl Bind for CapturedValue {
    fn bind(&mut self, _index: usize, value: Value) -> Result<()> {
        self.0 = Some(value);
        Ok(())
    }
}

/// A parameter collected while formatting an expression. Cheap to clone.
#[derive(Clone)]
pub struct ArgumentBinding {
    argument: Arc<dyn BindArgument>,
}

impl ArgumentBinding {
    pub fn new<T: Clone + Send + Sync + 'static>(
        value: Option<T>,
        sql_type: Arc<dyn SqlType<T>>,
    ) -> Self {
        Self {
            argument: Arc::new(TypedArgument { value, sql_type }),
        }
    }
    /// Binding for an already dynamic value, the type is the value variant.
    pub fn from_value(value: Value) -> Self {
        Self {
            argument: Arc::new(value),
        }
    }
    pub fn bind(&self, statement: &mut dyn Bind, index: usize) -> Result<()> {
        self.argument.bind(statement, index)
    }
    /// The value sent to the driver.
    pub fn value(&self) -> Value {
        let mut captured = CapturedValue::default();
        match self.argument.bind(&mut captured, 0) {
            Ok(()) => captured.0.unwrap_or_else(|| self.prototype()),
            Err(e) => {
                log::warn!("Could not compute the value of a {} argument: {e:#}", self.type_name());
                self.prototype()
            }
        }
    }
    pub fn type_name(&self) -> &'static str {
        self.argument.type_name()
    }
    pub fn prototype(&self) -> Value {
        self.argument.prototype()
    }
}

impl PartialEq for ArgumentBinding {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.value() == other.value()
    }
}

impl Debug for ArgumentBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.value(), self.type_name())
    }
}
