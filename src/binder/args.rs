use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;

/// A bound, type-coerced handler argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Structured(Value),
}

impl ArgValue {
    /// JSON form, used when logging or echoing arguments.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Str(s) => Value::String(s.clone()),
            ArgValue::Int(i) => Value::from(*i),
            ArgValue::Long(l) => Value::from(*l),
            ArgValue::Double(d) => Value::from(*d),
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Structured(v) => v.clone(),
        }
    }
}

/// Bound arguments in declaration order.
///
/// A slot is `None` when an optional parameter had no value, or when a body
/// was absent or could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: SmallVec<[Option<ArgValue>; 4]>,
}

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = Option<ArgValue>>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn push(&mut self, value: Option<ArgValue>) {
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ArgValue>> {
        self.values.iter().map(Option::as_ref)
    }

    /// String argument at `index`. Returns `None` for any other variant.
    #[must_use]
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.get(index)? {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn int(&self, index: usize) -> Option<i32> {
        match self.get(index)? {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Accepts `Int` as well, widening it.
    #[must_use]
    pub fn long(&self, index: usize) -> Option<i64> {
        match self.get(index)? {
            ArgValue::Long(l) => Some(*l),
            ArgValue::Int(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    #[must_use]
    pub fn double(&self, index: usize) -> Option<f64> {
        match self.get(index)? {
            ArgValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, index: usize) -> Option<bool> {
        match self.get(index)? {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn structured(&self, index: usize) -> Option<&Value> {
        match self.get(index)? {
            ArgValue::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Deserialize the argument at `index` into a typed value.
    ///
    /// `Ok(None)` when the slot is empty.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> serde_json::Result<Option<T>> {
        self.get(index)
            .map(|v| serde_json::from_value(v.to_json()))
            .transpose()
    }
}
