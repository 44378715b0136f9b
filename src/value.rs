//! Guest value model shared across the global surface.
//!
//! `Value` is an engine-agnostic representation of the script values that
//! cross the host boundary: log arguments, op-call arguments, and op results.
//! Containers are shared mutable cells, so aliasing and reference cycles can
//! exist just as they can in the guest language.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::rc::Rc;

/// A tagged guest script value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absent value.
    Undefined,
    /// The null value.
    Null,
    /// A boolean primitive.
    Bool(bool),
    /// A number (IEEE 754 double precision).
    Number(f64),
    /// A string value (UTF-8).
    Text(String),
    /// An ordered sequence; shared so aliasing and cycles can exist.
    Array(Rc<RefCell<Vec<Value>>>),
    /// A keyed record; shared so aliasing and cycles can exist.
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    /// An opaque callable owned by the host or ambient environment.
    Function(FunctionRef),
}

/// Opaque handle to a host-defined callable or constructor.
///
/// The runtime copies these verbatim and never looks inside; identity is the
/// only observable property.
#[derive(Clone)]
pub struct FunctionRef {
    name: Option<String>,
    handle: Rc<dyn Any>,
}

impl FunctionRef {
    /// Wrap an anonymous host callable.
    pub fn new(handle: Rc<dyn Any>) -> Self {
        Self { name: None, handle }
    }

    /// Wrap a host callable with a display name for diagnostics.
    pub fn named(name: impl Into<String>, handle: Rc<dyn Any>) -> Self {
        Self {
            name: Some(name.into()),
            handle,
        }
    }

    /// Display name, when the host supplied one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The underlying host handle.
    pub fn handle(&self) -> &Rc<dyn Any> {
        &self.handle
    }

    /// Identity comparison: two refs are the same iff they share a handle.
    pub fn ptr_eq(&self, other: &FunctionRef) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl Debug for FunctionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.name {
            Some(name) => write!(f, "[function {name}]"),
            None => write!(f, "[function]"),
        }
    }
}

/// Error raised when a value cannot be rendered in the canonical
/// structured-data encoding.
#[derive(Debug, PartialEq, Eq)]
pub enum SerializationError {
    /// The value graph references one of its own ancestors.
    Cyclic,
    /// The value kind has no structured-data representation.
    Unsupported(&'static str),
}

impl Display for SerializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SerializationError::Cyclic => write!(f, "cannot serialize cyclic value"),
            SerializationError::Unsupported(kind) => {
                write!(f, "cannot serialize value of type {kind}")
            }
        }
    }
}

impl Error for SerializationError {}

impl Value {
    /// A text value.
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    /// A number value.
    pub fn number(number: f64) -> Self {
        Value::Number(number)
    }

    /// An array value holding the given items.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// An object value holding the given fields.
    pub fn object(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    /// A function value wrapping the given opaque reference.
    pub fn function(reference: FunctionRef) -> Self {
        Value::Function(reference)
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Render this value in the canonical structured-data encoding (JSON).
    ///
    /// `Undefined` encodes as `null`, matching what the interchange encoding
    /// does to absent values inside containers. Integral finite numbers print
    /// without a fractional part; non-finite numbers encode as `null`.
    ///
    /// # Errors
    ///
    /// [`SerializationError::Cyclic`] if the value graph contains a reference
    /// back to an ancestor, [`SerializationError::Unsupported`] for function
    /// values. Never substitutes a placeholder.
    pub fn to_canonical_json(&self) -> Result<String, SerializationError> {
        let mut path = Vec::new();
        let json = self.to_json_value(&mut path)?;
        Ok(json.to_string())
    }

    /// Recursive conversion to `serde_json::Value`, tracking the container
    /// path by pointer identity to detect cycles. Sharing that is not cyclic
    /// (the same container reachable twice as a sibling) is allowed.
    fn to_json_value(&self, path: &mut Vec<usize>) -> Result<serde_json::Value, SerializationError> {
        match self {
            Value::Undefined | Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(value) => Ok(serde_json::Value::Bool(*value)),
            Value::Number(value) => Ok(encode_number(*value)),
            Value::Text(value) => Ok(serde_json::Value::String(value.clone())),
            Value::Array(items) => {
                let address = Rc::as_ptr(items) as usize;
                if path.contains(&address) {
                    return Err(SerializationError::Cyclic);
                }
                path.push(address);
                let mut encoded = Vec::with_capacity(items.borrow().len());
                for item in items.borrow().iter() {
                    encoded.push(item.to_json_value(path)?);
                }
                path.pop();
                Ok(serde_json::Value::Array(encoded))
            }
            Value::Object(fields) => {
                let address = Rc::as_ptr(fields) as usize;
                if path.contains(&address) {
                    return Err(SerializationError::Cyclic);
                }
                path.push(address);
                let mut encoded = serde_json::Map::with_capacity(fields.borrow().len());
                for (key, field) in fields.borrow().iter() {
                    encoded.insert(key.clone(), field.to_json_value(path)?);
                }
                path.pop();
                Ok(serde_json::Value::Object(encoded))
            }
            Value::Function(_) => Err(SerializationError::Unsupported("function")),
        }
    }
}

/// Encode a double the way the interchange encoding does: integral values
/// without a fractional part, non-finite values as `null`.
fn encode_number(number: f64) -> serde_json::Value {
    if !number.is_finite() {
        return serde_json::Value::Null;
    }
    if number.fract() == 0.0 && number >= i64::MIN as f64 && number <= i64::MAX as f64 {
        return serde_json::Value::from(number as i64);
    }
    serde_json::Number::from_f64(number)
        .map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
