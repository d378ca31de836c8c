//! Output tree for Weft components.
//!
//! Both front-ends produce an [`Ast`]: the markup tree in `html`, plus the
//! component's top-level `<style>` and `<script>` blocks. Every node carries
//! a half-open `[start, end)` byte span into the source; nodes built by the
//! structural converter use `0, 0`.

use serde::Serialize;
use weft_script::{Expression, Program};

/// Result of parsing one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ast {
    pub html: Fragment,
    pub css: Option<Style>,
    pub instance: Option<Script>,
    pub module: Option<Script>,
}

/// Root of the markup tree.
///
/// `start`/`end` are `None` when the fragment has no children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Fragment {
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TemplateNode {
    Element(Element),
    Text(Text),
    MustacheTag(MustacheTag),
    Comment(Comment),
    IfBlock(IfBlock),
    Options(OptionsNode),
}

impl TemplateNode {
    pub fn start(&self) -> usize {
        match self {
            TemplateNode::Element(node) => node.start,
            TemplateNode::Text(node) => node.start,
            TemplateNode::MustacheTag(node) => node.start,
            TemplateNode::Comment(node) => node.start,
            TemplateNode::IfBlock(node) => node.start,
            TemplateNode::Options(node) => node.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            TemplateNode::Element(node) => node.end,
            TemplateNode::Text(node) => node.end,
            TemplateNode::MustacheTag(node) => node.end,
            TemplateNode::Comment(node) => node.end,
            TemplateNode::IfBlock(node) => node.end,
            TemplateNode::Options(node) => node.end,
        }
    }
}

/// `<div class="a">...</div>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub attributes: Vec<AttributeNode>,
    pub children: Vec<TemplateNode>,
}

/// Literal text. `data` has character references decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub start: usize,
    pub end: usize,
    pub raw: String,
    pub data: String,
}

/// `{expression}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MustacheTag {
    pub start: usize,
    pub end: usize,
    pub expression: Expression,
}

/// `<!-- data -->`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub start: usize,
    pub end: usize,
    pub data: String,
}

/// `{#if expression}...{:else}...{/if}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub start: usize,
    pub end: usize,
    pub expression: Expression,
    pub children: Vec<TemplateNode>,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_block: Option<ElseBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ElseBlock {
    pub start: usize,
    pub end: usize,
    pub children: Vec<TemplateNode>,
}

/// `<weft:options tag="my-element" />`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionsNode {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub attributes: Vec<AttributeNode>,
    pub children: Vec<TemplateNode>,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AttributeNode {
    /// `class="a {b}"`, `disabled`, `{value}`
    Attribute {
        start: usize,
        end: usize,
        name: String,
        value: AttributeValue,
    },
    /// `on:click|once={handler}`
    EventHandler {
        start: usize,
        end: usize,
        name: String,
        modifiers: Vec<String>,
        expression: Option<Expression>,
    },
    /// `bind:value={name}`
    Binding {
        start: usize,
        end: usize,
        name: String,
        expression: Expression,
    },
    /// `{...props}`
    Spread {
        start: usize,
        end: usize,
        expression: Expression,
    },
}

impl AttributeNode {
    pub fn name(&self) -> Option<&str> {
        match self {
            AttributeNode::Attribute { name, .. }
            | AttributeNode::EventHandler { name, .. }
            | AttributeNode::Binding { name, .. } => Some(name),
            AttributeNode::Spread { .. } => None,
        }
    }
}

/// `true` for a bare boolean attribute, otherwise a list of chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Parts(Vec<ValuePart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ValuePart {
    Text(Text),
    MustacheTag(MustacheTag),
}

impl ValuePart {
    pub fn start(&self) -> usize {
        match self {
            ValuePart::Text(node) => node.start,
            ValuePart::MustacheTag(node) => node.start,
        }
    }
}

// ---------------------------------------------------------------------------
// Style and script blocks
// ---------------------------------------------------------------------------

/// A top-level `<style>` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Style {
    pub start: usize,
    pub end: usize,
    pub attributes: Vec<AttributeNode>,
    pub children: Vec<StyleNode>,
    pub content: StyleContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleContent {
    pub start: usize,
    pub end: usize,
    pub styles: String,
}

/// Stylesheet node with its location flattened to byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StyleNode {
    Rule {
        prelude: String,
        children: Vec<StyleNode>,
        start: usize,
        end: usize,
    },
    Atrule {
        name: String,
        prelude: String,
        children: Option<Vec<StyleNode>>,
        start: usize,
        end: usize,
    },
    Declaration {
        property: String,
        value: String,
        important: bool,
        start: usize,
        end: usize,
    },
}

impl StyleNode {
    pub fn start(&self) -> usize {
        match self {
            StyleNode::Rule { start, .. }
            | StyleNode::Atrule { start, .. }
            | StyleNode::Declaration { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            StyleNode::Rule { end, .. }
            | StyleNode::Atrule { end, .. }
            | StyleNode::Declaration { end, .. } => *end,
        }
    }
}

/// A top-level `<script>` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Script {
    pub start: usize,
    pub end: usize,
    pub context: ScriptContext,
    pub content: Program,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptContext {
    Default,
    Module,
}
