//! Weft Parser
//!
//! Front-end for Weft component templates. Two entry points produce the same
//! [`Ast`]:
//!
//! - [`parse`] scans template source with a character-driven state machine:
//!   markup, `{expression}` tags, `{#if}` blocks, and the component's
//!   top-level `<script>` and `<style>` blocks.
//! - [`convert`] builds the tree from a pre-built [`StructuralSchema`].
//!
//! Embedded code goes through `weft-script` and styles through `weft-style`.
//! Every failure aborts the parse with a single [`ParseError`].
//!
//! # Example
//!
//! ```
//! use weft_parser::{parse, ParseOptions, TemplateNode};
//!
//! let ast = parse("<h1>Hello {name}!</h1>", &ParseOptions::default()).unwrap();
//! let TemplateNode::Element(h1) = &ast.html.children[0] else {
//!     panic!("expected an element");
//! };
//! assert_eq!(h1.name, "h1");
//! assert_eq!(h1.children.len(), 3);
//! ```

pub mod ast;
pub mod convert;
mod cursor;
pub mod entities;
pub mod error;
pub mod options;
pub mod parser;
mod read;
pub mod stack;
mod state;

pub use ast::{
    Ast, AttributeNode, AttributeValue, Element, Fragment, Script, ScriptContext, Style,
    StyleNode, TemplateNode, Text,
};
pub use convert::{convert, StructuralAttribute, StructuralNode, StructuralSchema};
pub use error::{ErrorCode, ParseError};
pub use options::{CssMode, ParseOptions};
pub use parser::{parse, Parser};
