//! Rule tree produced by the stylesheet parser.

use serde::Serialize;

/// A point in the source text.
///
/// `offset` is a byte offset into the whole document. `line` is 1-based and
/// `column` counts characters from the start of the line, both relative to
/// the stylesheet text that was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Start and end of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "StyleSheet")]
pub struct Stylesheet {
    pub children: Vec<Node>,
    #[serde(rename = "loc")]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    Rule(Rule),
    Atrule(Atrule),
    Declaration(Declaration),
}

impl Node {
    pub fn location(&self) -> Location {
        match self {
            Node::Rule(rule) => rule.location,
            Node::Atrule(atrule) => atrule.location,
            Node::Declaration(decl) => decl.location,
        }
    }
}

/// `h1, .title { color: red }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    /// Selector text, trimmed.
    pub prelude: String,
    pub children: Vec<Node>,
    #[serde(rename = "loc")]
    pub location: Location,
}

/// `@media (min-width: 600px) { ... }` or `@import 'reset.css';`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atrule {
    pub name: String,
    pub prelude: String,
    /// `None` for statement at-rules ending in `;`.
    pub children: Option<Vec<Node>>,
    #[serde(rename = "loc")]
    pub location: Location,
}

/// `color: red !important`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
    #[serde(rename = "loc")]
    pub location: Location,
}
