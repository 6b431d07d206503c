//! Compile-time decoding of literal syntax.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{LiteralValue, Node};

/// Errors that can occur while decoding literal syntax.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("type {0} is not supported for a literal macro argument")]
    UnsupportedLiteral(String),

    #[error("only key/value pairs are supported in a literal hash, got {0}")]
    MalformedMap(String),

    #[error("keyword argument keys must be strings or symbols, got {0}")]
    InvalidKeyword(String),

    #[error("keyword argument {0} is given more than once")]
    DuplicateKeyword(String),
}

/// Decode a literal syntax node into a host value.
///
/// Arrays and hashes are decoded recursively; any other node kind fails
/// with [`DecodeError::UnsupportedLiteral`] naming the kind.
pub fn decode(node: &Node) -> Result<LiteralValue, DecodeError> {
    let value = match node {
        Node::Str(s) => LiteralValue::String(s.clone()),
        Node::Sym(s) => LiteralValue::Symbol(s.clone()),
        Node::Int(n) => LiteralValue::Int(*n),
        Node::Float(n) => LiteralValue::Float(*n),
        Node::Nil => LiteralValue::Nil,
        Node::True => LiteralValue::Bool(true),
        Node::False => LiteralValue::Bool(false),
        Node::Array(items) => {
            LiteralValue::List(items.iter().map(decode).collect::<Result<_, _>>()?)
        }
        Node::Hash(entries) => {
            let mut pairs = Vec::with_capacity(entries.len());
            for entry in entries {
                let Node::Pair(key, value) = entry else {
                    return Err(DecodeError::MalformedMap(entry.kind().to_string()));
                };
                pairs.push((decode(key)?, decode(value)?));
            }
            LiteralValue::Map(pairs)
        }
        other => return Err(DecodeError::UnsupportedLiteral(other.kind().to_string())),
    };
    Ok(value)
}

/// Decoded macro arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<LiteralValue>,
    pub keyword: BTreeMap<String, LiteralValue>,
}

impl Arguments {
    /// Returns the positional argument at `index`, if given.
    pub fn get(&self, index: usize) -> Option<&LiteralValue> {
        self.positional.get(index)
    }
}

/// Decode every argument of a call site.
///
/// A trailing hash literal is taken as the keyword arguments; otherwise the
/// keyword set is empty. Symbol and string keys share one namespace, so
/// `{a: 1, "a" => 2}` fails with [`DecodeError::DuplicateKeyword`].
pub fn decode_arguments(args: &[Node]) -> Result<Arguments, DecodeError> {
    let mut positional = args.iter().map(decode).collect::<Result<Vec<_>, _>>()?;

    let mut keyword = BTreeMap::new();
    if positional.last().is_some_and(LiteralValue::is_map) {
        if let Some(LiteralValue::Map(entries)) = positional.pop() {
            for (key, value) in entries {
                let name = key
                    .as_name()
                    .ok_or_else(|| DecodeError::InvalidKeyword(key.type_name().to_string()))?;
                if keyword.insert(name.to_string(), value).is_some() {
                    return Err(DecodeError::DuplicateKeyword(name.to_string()));
                }
            }
        }
    }

    Ok(Arguments {
        positional,
        keyword,
    })
}
