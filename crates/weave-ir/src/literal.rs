//! Host-level literal values.

use serde_json::{Map, Value};

use crate::Node;

/// A value folded out of literal source syntax at compile time.
///
/// `Map` keeps its entries in source order as a list of pairs, since keys
/// may be any literal (including floats, which are not hashable).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(String),
    List(Vec<LiteralValue>),
    Map(Vec<(LiteralValue, LiteralValue)>),
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a String or Symbol.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) | LiteralValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, LiteralValue::Map(_))
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Nil => "nil",
            LiteralValue::Bool(_) => "bool",
            LiteralValue::Int(_) => "int",
            LiteralValue::Float(_) => "float",
            LiteralValue::String(_) => "string",
            LiteralValue::Symbol(_) => "symbol",
            LiteralValue::List(_) => "list",
            LiteralValue::Map(_) => "map",
        }
    }

    /// Converts to JSON. Symbols become strings and map keys are rendered
    /// with [`LiteralValue::key_text`].
    pub fn to_json(&self) -> Value {
        match self {
            LiteralValue::Nil => Value::Null,
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Int(n) => Value::from(*n),
            LiteralValue::Float(n) => Value::from(*n),
            LiteralValue::String(s) | LiteralValue::Symbol(s) => Value::from(s.as_str()),
            LiteralValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            LiteralValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.key_text(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }

    fn key_text(&self) -> String {
        match self {
            LiteralValue::String(s) | LiteralValue::Symbol(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }

    /// Returns the literal syntax that encodes this value.
    pub fn to_node(&self) -> Node {
        match self {
            LiteralValue::Nil => Node::Nil,
            LiteralValue::Bool(true) => Node::True,
            LiteralValue::Bool(false) => Node::False,
            LiteralValue::Int(n) => Node::Int(*n),
            LiteralValue::Float(n) => Node::Float(*n),
            LiteralValue::String(s) => Node::str(s.as_str()),
            LiteralValue::Symbol(s) => Node::sym(s.as_str()),
            LiteralValue::List(items) => Node::array(items.iter().map(Self::to_node).collect()),
            LiteralValue::Map(entries) => Node::hash(
                entries
                    .iter()
                    .map(|(key, value)| Node::pair(key.to_node(), value.to_node()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}
