//! Positional parameters

use serde_json::Value;
use std::fmt;

/// Reference to a bound parameter, rendered as `$n` (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRef(usize);

impl ParamRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Values bound to a query, in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and get the placeholder that refers to it
    pub fn push(&mut self, value: Value) -> ParamRef {
        self.values.push(value);
        ParamRef(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn contains(&self, param: ParamRef) -> bool {
        param.0 >= 1 && param.0 <= self.values.len()
    }
}
