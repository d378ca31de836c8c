//! Tags: elements, closing tags, comments and their attributes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use weft_script::ast::ExprKind;
use weft_script::{Expression, Span};

use super::State;
use crate::ast::{
    AttributeNode, AttributeValue, Comment, Element, MustacheTag, OptionsNode, TemplateNode, Text,
    ValuePart,
};
use crate::entities::decode_character_references;
use crate::error::{ErrorCode, ParseError};
use crate::parser::Parser;
use crate::read::{read_script, read_style, CLOSING_SCRIPT, CLOSING_STYLE};
use crate::stack::{AutoCloseMemo, Current, OpenNode};

/// Name of the component options tag.
pub const OPTIONS_TAG: &str = "weft:options";

static VALID_TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!?[a-zA-Z]+:?[a-zA-Z0-9-]*$").unwrap());
static TAG_NAME_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\n/>]").unwrap());
static ATTRIBUTE_NAME_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[ \t\r\n=/>"']"#).unwrap());
static COMMENT_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-->").unwrap());
static QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']"#).unwrap());
static UNQUOTED_VALUE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/>|[ \t\r\n"'=<>`]"#).unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Whether an open `current` element ends implicitly when `next` opens.
///
/// With no `next`, whether `current` may end without a closing tag at all.
pub fn closing_tag_omitted(current: &str, next: Option<&str>) -> bool {
    let disallowed: &[&str] = match current {
        "li" => &["li"],
        "dt" | "dd" => &["dt", "dd"],
        "p" => &[
            "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer",
            "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "menu",
            "nav", "ol", "p", "pre", "section", "table", "ul",
        ],
        "rt" | "rp" => &["rt", "rp"],
        "optgroup" => &["optgroup"],
        "option" => &["option", "optgroup"],
        "thead" | "tbody" => &["tbody", "tfoot"],
        "tfoot" => &["tbody"],
        "tr" => &["tr", "tbody"],
        "td" | "th" => &["td", "th", "tr"],
        _ => return false,
    };

    match next {
        Some(next) => disallowed.contains(&next),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    EventHandler,
    Binding,
}

impl Directive {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "on" => Some(Directive::EventHandler),
            "bind" => Some(Directive::Binding),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Directive::EventHandler => "Event handler",
            Directive::Binding => "Binding",
        }
    }
}

pub fn tag(parser: &mut Parser<'_>) -> Result<Option<State>, ParseError> {
    let start = parser.index;
    parser.index += 1;

    if parser.eat("!--", false)? {
        comment(parser, start)?;
        return Ok(None);
    }

    let is_closing_tag = parser.eat("/", false)?;
    let name = read_tag_name(parser)?;

    if is_closing_tag {
        close_element(parser, name, start)?;
        return Ok(None);
    }

    if name == OPTIONS_TAG {
        if parser.seen_options {
            return Err(parser.error_at(
                ErrorCode::DuplicateOptions,
                format!("A component can only have one <{OPTIONS_TAG}> tag"),
                start,
            ));
        }
        if !parser.stack.is_top_level() {
            return Err(parser.error_at(
                ErrorCode::InvalidOptionsPlacement,
                format!("<{OPTIONS_TAG}> tags cannot be inside elements or blocks"),
                start,
            ));
        }
        parser.seen_options = true;
    }

    let parent = parser
        .stack
        .top()
        .and_then(OpenNode::name)
        .filter(|parent| closing_tag_omitted(parent, Some(name)))
        .map(str::to_string);
    if let Some(parent) = parent {
        parser.stack.close(start);
        debug!(tag = %parent, reason = name, "closed element implicitly");
        parser.last_auto_closed = Some(AutoCloseMemo {
            tag: parent,
            reason: name.to_string(),
            depth: parser.stack.depth(),
        });
    }

    let mut unique_names = HashSet::new();
    let mut attributes = Vec::new();
    parser.allow_whitespace();
    while let Some(attribute) = read_attribute(parser, &mut unique_names)? {
        attributes.push(attribute);
        parser.allow_whitespace();
    }

    if parser.stack.is_top_level() && (name == "script" || name == "style") {
        parser.eat(">", true)?;
        if name == "script" {
            let script = read_script(parser, start, &attributes)?;
            parser.js.push(script);
        } else {
            let style = read_style(parser, start, attributes)?;
            parser.css.push(style);
        }
        return Ok(None);
    }

    let self_closing = parser.eat("/", false)? || is_void(name);
    parser.eat(">", true)?;

    if name == OPTIONS_TAG {
        let node = OptionsNode {
            start,
            end: parser.index,
            name: name.to_string(),
            attributes,
            children: Vec::new(),
        };
        if self_closing {
            parser.stack.push(TemplateNode::Options(node));
        } else {
            parser.stack.open(OpenNode::Options(node));
        }
        return Ok(None);
    }

    let mut element = Element {
        start,
        end: parser.index,
        name: name.to_string(),
        attributes,
        children: Vec::new(),
    };

    if self_closing {
        parser.stack.push(TemplateNode::Element(element));
    } else if name == "script" || name == "style" {
        read_raw_text(parser, &mut element)?;
        parser.stack.push(TemplateNode::Element(element));
    } else {
        parser.stack.open(OpenNode::Element(element));
    }

    Ok(None)
}

fn comment(parser: &mut Parser<'_>, start: usize) -> Result<(), ParseError> {
    const UNCLOSED: &str = "comment was left open, expected -->";

    let data = parser.read_until_or(&COMMENT_END, ErrorCode::UnclosedComment, UNCLOSED)?;
    parser.eat_or("-->", ErrorCode::UnclosedComment, UNCLOSED)?;

    parser.stack.push(TemplateNode::Comment(Comment {
        start,
        end: parser.index,
        data: data.to_string(),
    }));
    Ok(())
}

fn read_tag_name<'a>(parser: &mut Parser<'a>) -> Result<&'a str, ParseError> {
    let start = parser.index;
    let name = parser.read_until(&TAG_NAME_END)?;

    if name == OPTIONS_TAG {
        return Ok(name);
    }
    if name.starts_with("weft:") {
        return Err(parser.error_at(
            ErrorCode::InvalidTagName,
            format!("Valid <weft:...> tag names are {OPTIONS_TAG}"),
            start,
        ));
    }
    if !VALID_TAG_NAME.is_match(name) {
        return Err(parser.error_at(ErrorCode::InvalidTagName, "Expected valid tag name", start));
    }

    Ok(name)
}

/// Handle `</name>`, closing any elements left open inside it.
fn close_element(parser: &mut Parser<'_>, name: &str, start: usize) -> Result<(), ParseError> {
    if is_void(name) {
        return Err(parser.error_at(
            ErrorCode::InvalidVoidContent,
            format!("<{name}> is a void element and cannot have children, or a closing tag"),
            start,
        ));
    }

    parser.allow_whitespace();
    parser.eat(">", true)?;

    loop {
        let (matches, implicit) = match parser.stack.current() {
            Current::Open(open) => {
                (open.name() == Some(name), matches!(open, OpenNode::Element(_)))
            }
            Current::Root(_) => (false, false),
        };
        if matches {
            break;
        }
        if !implicit {
            return Err(unopened_closing_tag(parser, name, start));
        }
        parser.stack.close(start);
    }

    parser.stack.close(parser.index);

    let depth = parser.stack.depth();
    if parser
        .last_auto_closed
        .as_ref()
        .is_some_and(|memo| depth < memo.depth)
    {
        parser.last_auto_closed = None;
    }

    Ok(())
}

fn unopened_closing_tag(parser: &Parser<'_>, name: &str, start: usize) -> ParseError {
    let message = match &parser.last_auto_closed {
        Some(memo) if memo.tag == name => format!(
            "</{name}> attempted to close element that was already automatically closed by <{reason}> (cannot nest <{reason}> inside <{name}>)",
            reason = memo.reason
        ),
        _ => format!("</{name}> attempted to close an element that was not open"),
    };
    parser.error_at(ErrorCode::InvalidClosingTag, message, start)
}

/// Content of a `<script>` or `<style>` that is not a component block.
fn read_raw_text(parser: &mut Parser<'_>, element: &mut Element) -> Result<(), ParseError> {
    let closing: &Regex = if element.name == "script" {
        &*CLOSING_SCRIPT
    } else {
        &*CLOSING_STYLE
    };

    let start = parser.index;
    let data = parser.read_until(closing)?;
    if parser.read(closing).is_none() {
        return Err(parser.error(ErrorCode::UnexpectedEof, "Unexpected end of input"));
    }

    if !data.is_empty() {
        element.children.push(TemplateNode::Text(Text {
            start,
            end: start + data.len(),
            raw: data.to_string(),
            data: data.to_string(),
        }));
    }
    element.end = parser.index;
    Ok(())
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

fn check_unique<'a>(
    parser: &Parser<'a>,
    unique_names: &mut HashSet<&'a str>,
    name: &'a str,
    start: usize,
) -> Result<(), ParseError> {
    if unique_names.insert(name) {
        Ok(())
    } else {
        Err(parser.error_at(ErrorCode::DuplicateAttribute, "Attributes need to be unique", start))
    }
}

fn read_attribute<'a>(
    parser: &mut Parser<'a>,
    unique_names: &mut HashSet<&'a str>,
) -> Result<Option<AttributeNode>, ParseError> {
    let start = parser.index;

    if parser.eat("{", false)? {
        parser.allow_whitespace();

        if parser.eat("...", false)? {
            let expression = parser.read_expression()?;
            parser.allow_whitespace();
            parser.eat("}", true)?;
            return Ok(Some(AttributeNode::Spread {
                start,
                end: parser.index,
                expression,
            }));
        }

        let value_start = parser.index;
        let name = parser.read_identifier(false)?;
        parser.allow_whitespace();
        parser.eat("}", true)?;

        let Some(name) = name else {
            return Err(parser.error_at(
                ErrorCode::EmptyAttributeShorthand,
                "Attribute shorthand cannot be empty",
                start,
            ));
        };
        check_unique(parser, unique_names, name, start)?;

        let span = Span::new(value_start, value_start + name.len());
        let expression = Expression::new(
            ExprKind::Identifier {
                name: name.to_string(),
            },
            span,
        );
        return Ok(Some(AttributeNode::Attribute {
            start,
            end: parser.index,
            name: name.to_string(),
            value: AttributeValue::Parts(vec![ValuePart::MustacheTag(MustacheTag {
                start: span.start,
                end: span.end,
                expression,
            })]),
        }));
    }

    let name = parser.read_until(&ATTRIBUTE_NAME_END)?;
    if name.is_empty() {
        return Ok(None);
    }

    let mut end = parser.index;
    parser.allow_whitespace();

    let value = if parser.eat("=", false)? {
        parser.allow_whitespace();
        let value = read_attribute_value(parser)?;
        end = parser.index;
        AttributeValue::Parts(value)
    } else if parser.match_regex(&QUOTE).is_some() {
        return Err(parser.error(ErrorCode::UnexpectedToken, "Expected ="));
    } else {
        AttributeValue::Flag(true)
    };

    let directive = name.split_once(':').and_then(|(prefix, rest)| {
        Directive::from_prefix(prefix).map(|directive| (directive, prefix.len() + 1, rest))
    });

    let Some((directive, name_offset, rest)) = directive else {
        check_unique(parser, unique_names, name, start)?;
        return Ok(Some(AttributeNode::Attribute {
            start,
            end,
            name: name.to_string(),
            value,
        }));
    };

    let mut segments = rest.split('|');
    let directive_name = segments.next().unwrap_or_default();
    let modifiers: Vec<String> = segments.map(str::to_string).collect();

    if directive_name.is_empty() {
        return Err(parser.error_at(
            ErrorCode::EmptyDirectiveName,
            format!("{} name cannot be empty", directive.label()),
            start + name_offset,
        ));
    }

    if directive == Directive::Binding && directive_name != "this" {
        check_unique(parser, unique_names, directive_name, start)?;
    }

    let expression = match value {
        AttributeValue::Flag(_) => None,
        AttributeValue::Parts(parts) => directive_expression(parser, parts)?,
    };

    Ok(Some(match directive {
        Directive::EventHandler => AttributeNode::EventHandler {
            start,
            end,
            name: directive_name.to_string(),
            modifiers,
            expression,
        },
        Directive::Binding => {
            let expression = expression.unwrap_or_else(|| {
                Expression::new(
                    ExprKind::Identifier {
                        name: directive_name.to_string(),
                    },
                    Span::new(start + name_offset, end),
                )
            });
            AttributeNode::Binding {
                start,
                end,
                name: directive_name.to_string(),
                expression,
            }
        }
    }))
}

/// A directive value must be exactly one `{expression}`.
fn directive_expression(
    parser: &Parser<'_>,
    parts: Vec<ValuePart>,
) -> Result<Option<Expression>, ParseError> {
    let mut parts = parts.into_iter();
    match (parts.next(), parts.next()) {
        (None, _) => Ok(None),
        (Some(ValuePart::MustacheTag(tag)), None) => Ok(Some(tag.expression)),
        (Some(first), _) => Err(parser.error_at(
            ErrorCode::InvalidDirectiveValue,
            "Directive value must be a JavaScript expression enclosed in curly braces",
            first.start(),
        )),
    }
}

fn read_attribute_value(parser: &mut Parser<'_>) -> Result<Vec<ValuePart>, ParseError> {
    let quote = if parser.eat("'", false)? {
        Some("'")
    } else if parser.eat("\"", false)? {
        Some("\"")
    } else {
        None
    };

    if let Some(quote) = quote {
        if parser.eat(quote, false)? {
            let at = parser.index - 1;
            return Ok(vec![ValuePart::Text(Text {
                start: at,
                end: at,
                raw: String::new(),
                data: String::new(),
            })]);
        }
    }

    let value = read_sequence(parser, quote)?;

    match quote {
        Some(_) => parser.index += 1,
        None if value.is_empty() => {
            return Err(parser.error(
                ErrorCode::MissingAttributeValue,
                "Expected value for the attribute",
            ));
        }
        None => {}
    }

    Ok(value)
}

/// Read text and `{expression}` chunks up to the closing quote, or to the
/// end of an unquoted value.
fn read_sequence(parser: &mut Parser<'_>, quote: Option<&str>) -> Result<Vec<ValuePart>, ParseError> {
    let mut chunks = Vec::new();
    let mut chunk_start = parser.index;

    while !parser.at_end() {
        let index = parser.index;
        let done = match quote {
            Some(quote) => parser.match_str(quote),
            None => parser.match_regex(&UNQUOTED_VALUE_END).is_some(),
        };

        if done {
            flush_text(parser, &mut chunks, chunk_start, index);
            return Ok(chunks);
        }

        if parser.eat("{", false)? {
            flush_text(parser, &mut chunks, chunk_start, index);
            parser.allow_whitespace();
            let expression = parser.read_expression()?;
            parser.allow_whitespace();
            parser.eat("}", true)?;

            chunks.push(ValuePart::MustacheTag(MustacheTag {
                start: index,
                end: parser.index,
                expression,
            }));
            chunk_start = parser.index;
        } else {
            parser.advance_char();
        }
    }

    Err(parser.error(ErrorCode::UnexpectedEof, "Unexpected end of input"))
}

fn flush_text(parser: &Parser<'_>, chunks: &mut Vec<ValuePart>, start: usize, end: usize) {
    if end > start {
        let raw = &parser.source[start..end];
        chunks.push(ValuePart::Text(Text {
            start,
            end,
            raw: raw.to_string(),
            data: decode_character_references(raw).into_owned(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;
    use crate::{parse, Ast};
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Ast {
        parse(source, &ParseOptions::default()).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        parse(source, &ParseOptions::default()).unwrap_err()
    }

    fn element(node: &TemplateNode) -> &Element {
        match node {
            TemplateNode::Element(element) => element,
            other => panic!("Expected Element, got {other:?}"),
        }
    }

    fn first_attribute(source: &str) -> AttributeNode {
        let ast = parse_ok(source);
        element(&ast.html.children[0]).attributes[0].clone()
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_void_element_needs_no_closing_tag() {
        let ast = parse_ok(r#"<img src="a.png"><p>x</p>"#);
        assert_eq!(ast.html.children.len(), 2);
        let img = element(&ast.html.children[0]);
        assert_eq!((img.start, img.end), (0, 17));
        assert!(img.children.is_empty());
    }

    #[test]
    fn test_self_closing_element() {
        let ast = parse_ok("<div/><span />");
        assert_eq!(ast.html.children.len(), 2);
        assert_eq!(element(&ast.html.children[0]).end, 6);
        assert_eq!(element(&ast.html.children[1]).end, 14);
    }

    #[test]
    fn test_closing_tag_for_void_element() {
        let err = parse_err("<br></br>");
        assert_eq!(err.code, ErrorCode::InvalidVoidContent);
        assert_eq!(err.start, 4);
    }

    #[test]
    fn test_invalid_tag_names() {
        let err = parse_err("<1div>");
        assert_eq!(err.code, ErrorCode::InvalidTagName);
        assert_eq!(err.start, 1);

        let err = parse_err("<weft:window />");
        assert_eq!(err.code, ErrorCode::InvalidTagName);
        assert!(err.message.contains(OPTIONS_TAG));
    }

    #[test]
    fn test_non_breaking_space_does_not_end_tag_name() {
        let err = parse_err("<div\u{a0}class=\"x\"></div>");
        assert_eq!(err.code, ErrorCode::InvalidTagName);
        assert_eq!(err.start, 1);
    }

    #[test]
    fn test_tag_at_end_of_input() {
        let err = parse_err("text <");
        assert_eq!(err.code, ErrorCode::UnexpectedEof);
    }

    #[test]
    fn test_nested_script_is_raw_text() {
        let ast = parse_ok("<div><script>if (a < b) {}</script></div>");
        let div = element(&ast.html.children[0]);
        let script = element(&div.children[0]);
        assert_eq!(script.name, "script");
        let TemplateNode::Text(text) = &script.children[0] else {
            panic!("Expected Text, got {:?}", script.children[0]);
        };
        assert_eq!(text.data, "if (a < b) {}");
        assert!(ast.instance.is_none());
    }

    // =========================================================================
    // Closing tags
    // =========================================================================

    #[test]
    fn test_list_items_close_implicitly() {
        let ast = parse_ok("<ul><li>a<li>b</ul>");
        let ul = element(&ast.html.children[0]);
        assert_eq!((ul.start, ul.end), (0, 19));
        assert_eq!(ul.children.len(), 2);
        assert_eq!(ul.children[0].start(), 4);
        assert_eq!(ul.children[0].end(), 9);
        assert_eq!(ul.children[1].end(), 14);
    }

    #[test]
    fn test_paragraph_closed_by_block_element() {
        let ast = parse_ok("<p>a<div>b</div>");
        assert_eq!(ast.html.children.len(), 2);
        let p = element(&ast.html.children[0]);
        assert_eq!((p.start, p.end), (0, 4));
    }

    #[test]
    fn test_table_cells_close_implicitly() {
        let ast = parse_ok("<table><tr><td>a<td>b</table>");
        let table = element(&ast.html.children[0]);
        let tr = element(&table.children[0]);
        assert_eq!(tr.children.len(), 2);
    }

    #[test]
    fn test_closing_tag_after_auto_close() {
        let err = parse_err("<p>a<ul></ul></p>");
        assert_eq!(err.code, ErrorCode::InvalidClosingTag);
        assert_eq!(err.start, 13);
        assert_eq!(
            err.message,
            "</p> attempted to close element that was already automatically closed by <ul> (cannot nest <ul> inside <p>)"
        );
    }

    #[test]
    fn test_closing_tag_never_opened() {
        let err = parse_err("<div></span></div>");
        assert_eq!(err.code, ErrorCode::InvalidClosingTag);
        assert_eq!(err.start, 5);
        assert_eq!(err.message, "</span> attempted to close an element that was not open");
    }

    #[test]
    fn test_closing_tag_does_not_cross_blocks() {
        let err = parse_err("<div>{#if a}</div>{/if}");
        assert_eq!(err.code, ErrorCode::InvalidClosingTag);
        assert_eq!(err.start, 12);
    }

    #[test]
    fn test_closing_tag_allows_whitespace() {
        let ast = parse_ok("<div>x</div >");
        assert_eq!(element(&ast.html.children[0]).end, 13);
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[test]
    fn test_comment() {
        let ast = parse_ok("<!-- hi --><p></p>");
        let TemplateNode::Comment(comment) = &ast.html.children[0] else {
            panic!("Expected Comment, got {:?}", ast.html.children[0]);
        };
        assert_eq!(comment.data, " hi ");
        assert_eq!((comment.start, comment.end), (0, 11));
    }

    #[test]
    fn test_unclosed_comment() {
        let err = parse_err("<!-- hi");
        assert_eq!(err.code, ErrorCode::UnclosedComment);
    }

    // =========================================================================
    // Options tag
    // =========================================================================

    #[test]
    fn test_options_tag() {
        let ast = parse_ok(r#"<weft:options tag="my-el"/><p></p>"#);
        let TemplateNode::Options(options) = &ast.html.children[0] else {
            panic!("Expected Options, got {:?}", ast.html.children[0]);
        };
        assert_eq!(options.name, OPTIONS_TAG);
        assert_eq!(options.attributes[0].name(), Some("tag"));
    }

    #[test]
    fn test_options_inside_element() {
        let err = parse_err("<div><weft:options /></div>");
        assert_eq!(err.code, ErrorCode::InvalidOptionsPlacement);
        assert_eq!(err.start, 5);
    }

    #[test]
    fn test_duplicate_options() {
        let err = parse_err("<weft:options /><weft:options />");
        assert_eq!(err.code, ErrorCode::DuplicateOptions);
        assert_eq!(err.start, 16);
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_kinds() {
        let ast = parse_ok(r#"<input type="text" value={name} disabled>"#);
        let input = element(&ast.html.children[0]);
        assert_eq!(input.attributes.len(), 3);

        let AttributeNode::Attribute { start, end, value, .. } = &input.attributes[0] else {
            panic!("Expected Attribute, got {:?}", input.attributes[0]);
        };
        assert_eq!((*start, *end), (7, 18));
        let AttributeValue::Parts(parts) = value else {
            panic!("Expected Parts, got {value:?}");
        };
        let [ValuePart::Text(text)] = parts.as_slice() else {
            panic!("Expected one Text, got {parts:?}");
        };
        assert_eq!((text.start, text.end), (13, 17));
        assert_eq!(text.data, "text");

        let AttributeNode::Attribute { start, end, value, .. } = &input.attributes[1] else {
            panic!("Expected Attribute, got {:?}", input.attributes[1]);
        };
        assert_eq!((*start, *end), (19, 31));
        assert!(matches!(
            value,
            AttributeValue::Parts(parts)
                if matches!(parts.as_slice(), [ValuePart::MustacheTag(MustacheTag { start: 25, end: 31, .. })])
        ));

        assert!(matches!(
            &input.attributes[2],
            AttributeNode::Attribute { start: 32, end: 40, value: AttributeValue::Flag(true), .. }
        ));
    }

    #[test]
    fn test_mixed_attribute_value() {
        let attribute = first_attribute(r#"<div class="a {b} c &amp; d"></div>"#);
        let AttributeNode::Attribute { value: AttributeValue::Parts(parts), .. } = attribute else {
            panic!("Expected Attribute with parts, got {attribute:?}");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], ValuePart::Text(text) if text.data == "a "));
        assert!(matches!(&parts[1], ValuePart::MustacheTag(_)));
        assert!(matches!(&parts[2], ValuePart::Text(text) if text.data == " c & d"));
    }

    #[test]
    fn test_unquoted_attribute_value() {
        let attribute = first_attribute("<input value=abc/>");
        let AttributeNode::Attribute { end, value: AttributeValue::Parts(parts), .. } = attribute
        else {
            panic!("Expected Attribute with parts, got {attribute:?}");
        };
        assert_eq!(end, 16);
        assert!(matches!(&parts[0], ValuePart::Text(text) if text.raw == "abc"));
    }

    #[test]
    fn test_empty_quoted_value() {
        let attribute = first_attribute(r#"<div a=""></div>"#);
        let AttributeNode::Attribute { value: AttributeValue::Parts(parts), .. } = attribute else {
            panic!("Expected Attribute with parts, got {attribute:?}");
        };
        assert_eq!(
            parts,
            vec![ValuePart::Text(Text {
                start: 8,
                end: 8,
                raw: String::new(),
                data: String::new(),
            })]
        );
    }

    #[test]
    fn test_missing_attribute_value() {
        let err = parse_err("<div a=></div>");
        assert_eq!(err.code, ErrorCode::MissingAttributeValue);
        assert_eq!(err.start, 7);
    }

    #[test]
    fn test_value_without_equals() {
        let err = parse_err(r#"<div a"b"></div>"#);
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert_eq!(err.message, "Expected =");
        assert_eq!(err.start, 6);
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse_err(r#"<div a="1" a="2"></div>"#);
        assert_eq!(err.code, ErrorCode::DuplicateAttribute);
        assert_eq!(err.start, 11);

        let err = parse_err(r#"<div id="x" {id}></div>"#);
        assert_eq!(err.code, ErrorCode::DuplicateAttribute);
    }

    #[test]
    fn test_attribute_shorthand() {
        let attribute = first_attribute("<div {id}></div>");
        let AttributeNode::Attribute { start, end, name, value } = attribute else {
            panic!("Expected Attribute, got {attribute:?}");
        };
        assert_eq!(name, "id");
        assert_eq!((start, end), (5, 9));
        let AttributeValue::Parts(parts) = value else {
            panic!("Expected Parts");
        };
        let [ValuePart::MustacheTag(tag)] = parts.as_slice() else {
            panic!("Expected one MustacheTag, got {parts:?}");
        };
        assert_eq!((tag.expression.span.start, tag.expression.span.end), (6, 8));
    }

    #[test]
    fn test_empty_attribute_shorthand() {
        let err = parse_err("<div {}></div>");
        assert_eq!(err.code, ErrorCode::EmptyAttributeShorthand);
        assert_eq!(err.start, 5);
    }

    #[test]
    fn test_spread_attribute() {
        let attribute = first_attribute("<div {...props}></div>");
        assert!(matches!(attribute, AttributeNode::Spread { start: 5, end: 15, .. }));
    }

    // =========================================================================
    // Directives
    // =========================================================================

    #[test]
    fn test_event_handler_with_modifiers() {
        let attribute = first_attribute("<form on:submit|preventDefault|once={save}></form>");
        let AttributeNode::EventHandler { name, modifiers, expression, .. } = attribute else {
            panic!("Expected EventHandler, got {attribute:?}");
        };
        assert_eq!(name, "submit");
        assert_eq!(modifiers, vec!["preventDefault", "once"]);
        assert!(expression.is_some());
    }

    #[test]
    fn test_event_handler_without_value() {
        let ast = parse_ok("<button on:click on:click={go}></button>");
        let button = element(&ast.html.children[0]);
        assert_eq!(button.attributes.len(), 2);
        assert!(matches!(
            &button.attributes[0],
            AttributeNode::EventHandler { expression: None, .. }
        ));
    }

    #[test]
    fn test_binding_defaults_to_its_name() {
        let attribute = first_attribute("<input bind:value>");
        let AttributeNode::Binding { name, expression, .. } = attribute else {
            panic!("Expected Binding, got {attribute:?}");
        };
        assert_eq!(name, "value");
        assert_eq!((expression.span.start, expression.span.end), (12, 17));
        assert!(matches!(expression.kind, ExprKind::Identifier { name } if name == "value"));
    }

    #[test]
    fn test_duplicate_binding() {
        let err = parse_err("<input bind:value bind:value={x}>");
        assert_eq!(err.code, ErrorCode::DuplicateAttribute);
        assert_eq!(err.start, 18);

        parse_ok("<div bind:this={a} bind:this={b}></div>");
    }

    #[test]
    fn test_empty_directive_name() {
        let err = parse_err("<div on:={x}></div>");
        assert_eq!(err.code, ErrorCode::EmptyDirectiveName);
        assert_eq!(err.start, 8);
    }

    #[test]
    fn test_directive_value_must_be_expression() {
        let err = parse_err(r#"<div on:click="go"></div>"#);
        assert_eq!(err.code, ErrorCode::InvalidDirectiveValue);
        assert_eq!(err.start, 15);
    }

    #[test]
    fn test_namespaced_attribute_is_plain() {
        let attribute = first_attribute(r##"<use xlink:href="#a"></use>"##);
        assert_eq!(attribute.name(), Some("xlink:href"));
        assert!(matches!(attribute, AttributeNode::Attribute { .. }));
    }

    // =========================================================================
    // Omitted closing tags
    // =========================================================================

    #[test]
    fn test_closing_tag_omitted() {
        assert!(closing_tag_omitted("li", Some("li")));
        assert!(!closing_tag_omitted("li", Some("span")));
        assert!(closing_tag_omitted("p", Some("table")));
        assert!(closing_tag_omitted("td", None));
        assert!(!closing_tag_omitted("div", None));
    }
}
