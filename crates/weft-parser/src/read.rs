//! Readers for the top-level `<script>` and `<style>` blocks.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use weft_style::Node;

use crate::ast::{
    AttributeNode, AttributeValue, Script, ScriptContext, Style, StyleContent, StyleNode,
    ValuePart,
};
use crate::error::{ErrorCode, ParseError};
use crate::parser::Parser;

pub(crate) static CLOSING_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</script[ \t\r\n]*>").unwrap());
pub(crate) static CLOSING_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</style[ \t\r\n]*>").unwrap());

/// Read a `<script>` body; the opening tag has been consumed.
pub fn read_script(
    parser: &mut Parser<'_>,
    start: usize,
    attributes: &[AttributeNode],
) -> Result<Script, ParseError> {
    const UNCLOSED: &str = "<script> must have a closing tag";

    let content_start = parser.index;
    let data = parser.read_until_or(&CLOSING_SCRIPT, ErrorCode::UnclosedScript, UNCLOSED)?;
    if parser.at_end() {
        return Err(parser.error(ErrorCode::UnclosedScript, UNCLOSED));
    }

    // Blank out everything before the script so positions stay absolute
    let mut program_source = blank(&parser.source[..content_start]);
    program_source.push_str(data);

    parser.read(&CLOSING_SCRIPT);

    let mut content = weft_script::parse_program(&program_source)
        .map_err(|err| ParseError::from_script(&err, parser.source, parser.filename))?;
    content.span.start = content_start;

    let context = script_context(parser, attributes, start)?;
    debug!(?context, start, "read script");

    Ok(Script {
        start,
        end: parser.index,
        context,
        content,
    })
}

/// Read a `<style>` body; the opening tag has been consumed.
pub fn read_style(
    parser: &mut Parser<'_>,
    start: usize,
    attributes: Vec<AttributeNode>,
) -> Result<Style, ParseError> {
    const UNCLOSED: &str = "<style> must have a closing tag";

    let content_start = parser.index;
    let styles = parser.read_until_or(&CLOSING_STYLE, ErrorCode::UnclosedStyle, UNCLOSED)?;
    if parser.at_end() {
        return Err(parser.error(ErrorCode::UnclosedStyle, UNCLOSED));
    }
    let content_end = parser.index;

    let sheet = weft_style::parse_stylesheet(styles, content_start)
        .map_err(|err| ParseError::from_style(&err, parser.source, parser.filename))?;

    parser.read(&CLOSING_STYLE);
    debug!(start, rules = sheet.children.len(), "read style");

    Ok(Style {
        start,
        end: parser.index,
        attributes,
        children: flatten(sheet.children),
        content: StyleContent {
            start: content_start,
            end: content_end,
            styles: styles.to_string(),
        },
    })
}

/// Replace rich stylesheet locations with plain byte offsets.
pub fn flatten(nodes: Vec<Node>) -> Vec<StyleNode> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Rule(rule) => StyleNode::Rule {
                prelude: rule.prelude,
                children: flatten(rule.children),
                start: rule.location.start.offset,
                end: rule.location.end.offset,
            },
            Node::Atrule(atrule) => StyleNode::Atrule {
                name: atrule.name,
                prelude: atrule.prelude,
                children: atrule.children.map(flatten),
                start: atrule.location.start.offset,
                end: atrule.location.end.offset,
            },
            Node::Declaration(decl) => StyleNode::Declaration {
                property: decl.property,
                value: decl.value,
                important: decl.important,
                start: decl.location.start.offset,
                end: decl.location.end.offset,
            },
        })
        .collect()
}

/// Same byte length as `text`, with every byte but newlines turned to spaces.
fn blank(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' => "\n".to_string(),
            c => " ".repeat(c.len_utf8()),
        })
        .collect()
}

/// `default` unless a static `context="module"` attribute is present.
fn script_context(
    parser: &Parser<'_>,
    attributes: &[AttributeNode],
    start: usize,
) -> Result<ScriptContext, ParseError> {
    let context = attributes.iter().find_map(|attribute| match attribute {
        AttributeNode::Attribute {
            name, start, value, ..
        } if name == "context" => Some((*start, value)),
        _ => None,
    });

    let Some((attribute_start, value)) = context else {
        return Ok(ScriptContext::Default);
    };

    let AttributeValue::Parts(parts) = value else {
        return Err(parser.error_at(
            ErrorCode::InvalidScriptContextAttribute,
            "context attribute must be static",
            start,
        ));
    };
    let [ValuePart::Text(text)] = parts.as_slice() else {
        return Err(parser.error_at(
            ErrorCode::InvalidScriptContextAttribute,
            "context attribute must be static",
            start,
        ));
    };

    if text.data != "module" {
        return Err(parser.error_at(
            ErrorCode::InvalidScriptContextValue,
            r#"If the context attribute is supplied, its value must be "module""#,
            attribute_start,
        ));
    }

    Ok(ScriptContext::Module)
}
