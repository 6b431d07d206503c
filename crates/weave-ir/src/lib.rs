//! Syntax nodes and compile-time literal decoding for Weave.
//!
//! This crate defines the seam between a source front end and the Weave
//! JavaScript back end: the syntax [`Node`] tree a front end hands over,
//! and the [`LiteralValue`]s that macro arguments are folded into at
//! compile time.
//!
//! # Node format
//!
//! Nodes are exchanged as JSON objects tagged by their front-end kind:
//!
//! ```json
//! {"type": "array", "children": [
//!   {"type": "str", "value": "glob"},
//!   {"type": "sym", "value": "default"}
//! ]}
//! ```
//!
//! Only literal kinds (`str`, `sym`, `int`, `float`, `nil`, `true`, `false`,
//! `array`, `hash`, `pair`) can be decoded. Every other kind is carried as
//! an opaque [`Node::Other`] so decode failures can name it.

mod decode;
mod literal;
mod node;

pub use decode::{Arguments, DecodeError, decode, decode_arguments};
pub use literal::LiteralValue;
pub use node::{Node, NodeFormatError};
