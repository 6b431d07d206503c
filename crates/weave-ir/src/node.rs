//! Syntax node types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// A syntax node as produced by the front end.
///
/// Literal shapes get their own variants; anything else is kept as
/// [`Node::Other`] with its original kind name.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Str(String),
    Sym(String),
    Int(i64),
    Float(f64),
    Nil,
    True,
    False,
    Array(Vec<Node>),
    /// Hash literal. Entries are usually [`Node::Pair`], but the front end
    /// may also produce `kwsplat` and similar entries.
    Hash(Vec<Node>),
    Pair(Box<Node>, Box<Node>),
    /// Any non-literal construct (`send`, `lvar`, `dstr`, ...).
    Other {
        kind: String,
        value: Option<Value>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn str(value: impl Into<String>) -> Self {
        Node::Str(value.into())
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Node::Sym(name.into())
    }

    pub fn array(children: Vec<Node>) -> Self {
        Node::Array(children)
    }

    pub fn hash(entries: Vec<Node>) -> Self {
        Node::Hash(entries)
    }

    pub fn pair(key: Node, value: Node) -> Self {
        Node::Pair(Box::new(key), Box::new(value))
    }

    /// Creates a non-literal node of the given kind.
    pub fn other(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Other {
            kind: kind.into(),
            value: None,
            children,
        }
    }

    /// Returns the front-end kind name of this node.
    pub fn kind(&self) -> &str {
        match self {
            Node::Str(_) => "str",
            Node::Sym(_) => "sym",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::Nil => "nil",
            Node::True => "true",
            Node::False => "false",
            Node::Array(_) => "array",
            Node::Hash(_) => "hash",
            Node::Pair(..) => "pair",
            Node::Other { kind, .. } => kind,
        }
    }
}

/// A JSON node whose payload does not match its declared kind.
#[derive(Debug, Error)]
#[error("malformed `{kind}` node: {reason}")]
pub struct NodeFormatError {
    kind: String,
    reason: &'static str,
}

/// Wire shape shared by every node kind.
#[derive(Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<RawNode>,
}

impl TryFrom<RawNode> for Node {
    type Error = NodeFormatError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let malformed = |reason| NodeFormatError {
            kind: raw.kind.clone(),
            reason,
        };
        let node = match raw.kind.as_str() {
            "str" => match &raw.value {
                Some(Value::String(s)) => Node::Str(s.clone()),
                _ => return Err(malformed("expected a string value")),
            },
            "sym" => match &raw.value {
                Some(Value::String(s)) => Node::Sym(s.clone()),
                _ => return Err(malformed("expected a string value")),
            },
            "int" => match raw.value.as_ref().and_then(Value::as_i64) {
                Some(n) => Node::Int(n),
                None => return Err(malformed("expected an integer value")),
            },
            "float" => match raw.value.as_ref().and_then(Value::as_f64) {
                Some(n) => Node::Float(n),
                None => return Err(malformed("expected a numeric value")),
            },
            "nil" => Node::Nil,
            "true" => Node::True,
            "false" => Node::False,
            "array" | "hash" => {
                let is_array = raw.kind == "array";
                let children = raw
                    .children
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                if is_array {
                    Node::Array(children)
                } else {
                    Node::Hash(children)
                }
            }
            "pair" => {
                if raw.children.len() != 2 {
                    return Err(malformed("expected exactly two children"));
                }
                let mut children = raw.children.into_iter();
                match (children.next(), children.next()) {
                    (Some(key), Some(value)) => {
                        Node::pair(Node::try_from(key)?, Node::try_from(value)?)
                    }
                    _ => return Err(malformed("expected exactly two children")),
                }
            }
            _ => Node::Other {
                children: raw
                    .children
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
                kind: raw.kind.clone(),
                value: raw.value.clone(),
            },
        };
        Ok(node)
    }
}

impl From<&Node> for RawNode {
    fn from(node: &Node) -> Self {
        let leaf = |value: Value| RawNode {
            kind: node.kind().to_string(),
            value: Some(value),
            children: Vec::new(),
        };
        let branch = |children: Vec<RawNode>| RawNode {
            kind: node.kind().to_string(),
            value: None,
            children,
        };
        match node {
            Node::Str(s) | Node::Sym(s) => leaf(Value::from(s.as_str())),
            Node::Int(n) => leaf(Value::from(*n)),
            Node::Float(n) => leaf(Value::from(*n)),
            Node::Nil | Node::True | Node::False => branch(Vec::new()),
            Node::Array(items) | Node::Hash(items) => {
                branch(items.iter().map(RawNode::from).collect())
            }
            Node::Pair(key, value) => branch(vec![
                RawNode::from(key.as_ref()),
                RawNode::from(value.as_ref()),
            ]),
            Node::Other {
                kind,
                value,
                children,
            } => RawNode {
                kind: kind.clone(),
                value: value.clone(),
                children: children.iter().map(RawNode::from).collect(),
            },
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RawNode::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawNode::deserialize(deserializer)?;
        Node::try_from(raw).map_err(serde::de::Error::custom)
    }
}
