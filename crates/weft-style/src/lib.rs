//! Weft Style
//!
//! Parses the contents of a component's `<style>` block into a rule tree.
//! Tokenizing is done by `cssparser`; this crate keeps preludes and values
//! as source text and attaches a [`Location`] to every node.
//!
//! # Example
//!
//! ```
//! use weft_style::{parse_stylesheet, Node};
//!
//! let sheet = parse_stylesheet("p { color: red }", 7).unwrap();
//! let Node::Rule(rule) = &sheet.children[0] else { panic!() };
//! assert_eq!(rule.prelude, "p");
//! assert_eq!(rule.location.start.offset, 7);
//! ```

pub mod ast;
mod parser;

pub use ast::{Atrule, Declaration, Location, Node, Position, Rule, Stylesheet};
pub use parser::parse_stylesheet;

/// Stylesheet error at an absolute byte offset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct StyleError {
    pub message: String,
    pub pos: usize,
}
