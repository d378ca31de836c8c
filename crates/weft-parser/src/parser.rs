//! Template parser: state-machine driver and top-level assembly.
//!
//! The [`Parser`] owns everything one parse needs: the source, the read
//! offset, the context stack and the side lists of `<style>`/`<script>`
//! blocks. Transitions in [`crate::state`] receive it by `&mut` and are the
//! only code that moves the offset.

use tracing::{debug, instrument, trace};

use crate::ast::{Ast, Script, ScriptContext, Style};
use crate::cursor::is_whitespace;
use crate::error::{ErrorCode, ParseError};
use crate::options::ParseOptions;
use crate::stack::{AutoCloseMemo, ContextStack, OpenNode};
use crate::state::State;

/// Parse a component template.
///
/// Trailing whitespace is ignored; all offsets in the tree and in errors
/// are UTF-8 byte offsets into `source`.
#[instrument(level = "debug", skip_all, fields(filename = ?options.filename, len = source.len()))]
pub fn parse(source: &str, options: &ParseOptions) -> Result<Ast, ParseError> {
    Parser::new(source, options).run()
}

/// Weft template parser.
pub struct Parser<'a> {
    pub(crate) source: &'a str,
    pub(crate) filename: Option<&'a str>,
    pub(crate) index: usize,
    pub(crate) stack: ContextStack,
    pub(crate) css: Vec<Style>,
    pub(crate) js: Vec<Script>,
    pub(crate) last_auto_closed: Option<AutoCloseMemo>,
    pub(crate) seen_options: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser positioned at the start of `source`.
    pub fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            source: source.trim_end_matches(is_whitespace),
            filename: options.filename.as_deref(),
            index: 0,
            stack: ContextStack::new(),
            css: Vec::new(),
            js: Vec::new(),
            last_auto_closed: None,
            seen_options: false,
        }
    }

    /// Run the state machine to the end of input and assemble the tree.
    pub fn run(mut self) -> Result<Ast, ParseError> {
        let mut state = State::Fragment;
        while self.index < self.source.len() {
            trace!(?state, index = self.index, "step");
            state = state.step(&mut self)?.unwrap_or(State::Fragment);
        }

        self.validate_end(state)?;
        self.trim_root();
        self.assemble()
    }

    /// Checks that only make sense once the input is exhausted.
    fn validate_end(&self, state: State) -> Result<(), ParseError> {
        if let Some(open) = self.stack.top() {
            return Err(match open {
                OpenNode::Element(element) => self.error_at(
                    ErrorCode::UnclosedElement,
                    format!("<{}> was left open", element.name),
                    element.start,
                ),
                OpenNode::Options(options) => self.error_at(
                    ErrorCode::UnclosedElement,
                    format!("<{}> was left open", options.name),
                    options.start,
                ),
                OpenNode::IfBlock(block) => self.error_at(
                    ErrorCode::UnclosedBlock,
                    "Block was left open",
                    block.start,
                ),
            });
        }

        if state != State::Fragment {
            return Err(self.error(ErrorCode::UnexpectedEof, "Unexpected end of input"));
        }

        Ok(())
    }

    /// Shrink the root span past leading and trailing whitespace.
    fn trim_root(&mut self) {
        let source = self.source;
        let root = self.stack.root_mut();

        let (Some(first), Some(last)) = (root.children.first(), root.children.last()) else {
            root.start = None;
            root.end = None;
            return;
        };

        let mut start = first.start();
        let mut end = last.end();
        while let Some(c) = source[start..end].chars().next().filter(|&c| is_whitespace(c)) {
            start += c.len_utf8();
        }
        while let Some(c) = source[start..end].chars().next_back().filter(|&c| is_whitespace(c)) {
            end -= c.len_utf8();
        }

        root.start = Some(start);
        root.end = Some(end);
    }

    /// Enforce one `<style>`, one instance and one module `<script>`.
    fn assemble(self) -> Result<Ast, ParseError> {
        let (source, filename) = (self.source, self.filename);

        if let Some(second) = self.css.get(1) {
            return Err(ParseError::new(
                ErrorCode::DuplicateStyle,
                "You can only have one top-level <style> tag per component",
                source,
                second.start,
                filename,
            ));
        }

        let (instance, module): (Vec<Script>, Vec<Script>) = self
            .js
            .into_iter()
            .partition(|script| script.context == ScriptContext::Default);

        if let Some(second) = instance.get(1) {
            return Err(ParseError::new(
                ErrorCode::InvalidScriptInstance,
                "A component can only have one instance-level <script> element",
                source,
                second.start,
                filename,
            ));
        }
        if let Some(second) = module.get(1) {
            return Err(ParseError::new(
                ErrorCode::InvalidScriptModule,
                r#"A component can only have one <script context="module"> element"#,
                source,
                second.start,
                filename,
            ));
        }

        debug!(
            children = self.stack.root().children.len(),
            styles = self.css.len(),
            "parsed template"
        );

        Ok(Ast {
            html: self.stack.into_root(),
            css: self.css.into_iter().next(),
            instance: instance.into_iter().next(),
            module: module.into_iter().next(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AttributeNode, TemplateNode};
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Ast {
        parse(source, &ParseOptions::default()).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        parse(source, &ParseOptions::default()).unwrap_err()
    }

    // =========================================================================
    // Driver
    // =========================================================================

    #[test]
    fn test_nested_elements_close_cleanly() {
        let ast = parse_ok("<div><p>one</p><p>two</p></div>");
        assert_eq!(ast.html.children.len(), 1);
        let TemplateNode::Element(div) = &ast.html.children[0] else {
            panic!("Expected Element, got {:?}", ast.html.children[0]);
        };
        assert_eq!(div.name, "div");
        assert_eq!((div.start, div.end), (0, 31));
        assert_eq!(div.children.len(), 2);
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_err("<div><span>text</span>");
        assert_eq!(err.code, ErrorCode::UnclosedElement);
        assert!(err.message.contains("div"));
        assert_eq!(err.start, 0);
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_err("{#if visible}<p>hi</p>");
        assert_eq!(err.code, ErrorCode::UnclosedBlock);
        assert_eq!(err.start, 0);
    }

    #[test]
    fn test_filename_in_error() {
        let options = ParseOptions {
            filename: Some("App.weft".into()),
            ..ParseOptions::default()
        };
        let err = parse("<div>", &options).unwrap_err();
        assert_eq!(err.filename.as_deref(), Some("App.weft"));
        assert_eq!(err.source_text, "<div>");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["name"], "ParseError");
        assert_eq!(json["code"], "unclosed-element");
        assert_eq!(json["filename"], "App.weft");
    }

    // =========================================================================
    // Root span
    // =========================================================================

    #[test]
    fn test_whitespace_only_input() {
        let ast = parse_ok("   \n\t  ");
        assert!(ast.html.children.is_empty());
        assert_eq!(ast.html.start, None);
        assert_eq!(ast.html.end, None);
    }

    #[test]
    fn test_empty_input() {
        let ast = parse_ok("");
        assert!(ast.html.children.is_empty());
        assert_eq!(ast.html.start, None);
        assert!(ast.css.is_none());
        assert!(ast.instance.is_none());
        assert!(ast.module.is_none());
    }

    #[test]
    fn test_root_span_is_trimmed() {
        let ast = parse_ok("  <p>x</p>  ");
        assert_eq!(ast.html.start, Some(2));
        assert_eq!(ast.html.end, Some(10));
    }

    #[test]
    fn test_root_span_keeps_non_breaking_space() {
        let ast = parse_ok("\u{a0}<p>x</p>\u{a0}");
        assert_eq!(ast.html.start, Some(0));
        assert_eq!(ast.html.end, Some(12));
        assert_eq!(ast.html.children.len(), 3);
        let TemplateNode::Text(text) = &ast.html.children[0] else {
            panic!("Expected Text, got {:?}", ast.html.children[0]);
        };
        assert_eq!(text.data, "\u{a0}");
        assert_eq!((text.start, text.end), (0, 2));
    }

    // =========================================================================
    // Top-level assembly
    // =========================================================================

    #[test]
    fn test_single_style() {
        let ast = parse_ok("<p>x</p>\n<style>p { color: red }</style>");
        let css = ast.css.unwrap();
        assert_eq!(css.start, 9);
        assert_eq!(css.content.styles, "p { color: red }");
        assert_eq!(css.content.start, 16);
        assert_eq!(css.children[0].start(), 16);
        assert_eq!(ast.html.children.len(), 2);
    }

    #[test]
    fn test_duplicate_style() {
        let source = "<style>a{}</style>\n<style>b{}</style>";
        let err = parse_err(source);
        assert_eq!(err.code, ErrorCode::DuplicateStyle);
        assert_eq!(err.start, 19);
    }

    #[test]
    fn test_duplicate_instance_script() {
        let err = parse_err("<script>let a;</script><script>let b;</script>");
        assert_eq!(err.code, ErrorCode::InvalidScriptInstance);
        assert_eq!(err.start, 23);
    }

    #[test]
    fn test_duplicate_module_script() {
        let source = r#"<script context="module">let a;</script><script context="module">let b;</script>"#;
        let err = parse_err(source);
        assert_eq!(err.code, ErrorCode::InvalidScriptModule);
        assert_eq!(err.start, 40);
    }

    #[test]
    fn test_instance_and_module_scripts() {
        let ast = parse_ok(
            "<script context=\"module\">export const x = 1;</script>\n<script>let count = 0;</script>",
        );
        let module = ast.module.unwrap();
        let instance = ast.instance.unwrap();
        assert_eq!(module.context, ScriptContext::Module);
        assert_eq!(instance.context, ScriptContext::Default);
        assert_eq!(instance.start, 54);
        assert_eq!(instance.content.span.start, 62);
    }

    #[test]
    fn test_script_offsets_are_absolute() {
        let source = "<h1>é</h1>\n<script>\nlet count = 0;\n</script>";
        let ast = parse_ok(source);
        let program = ast.instance.unwrap().content;
        let span = program.body[0].span;
        assert_eq!(&source[span.start..span.end], "let count = 0;");
    }

    #[test]
    fn test_script_error_is_positioned_in_document() {
        let source = "<p></p><script>let = 1;</script>";
        let err = parse_err(source);
        assert_eq!(err.code, ErrorCode::ParseError);
        assert_eq!(err.start, 19);
    }

    #[test]
    fn test_style_syntax_error() {
        let err = parse_err("<style>{ color: red }</style>");
        assert_eq!(err.code, ErrorCode::CssSyntaxError);
        assert_eq!(err.start, 7);
    }

    #[test]
    fn test_nested_style_is_an_element() {
        let ast = parse_ok("<div><style>p</style></div>");
        assert!(ast.css.is_none());
        let TemplateNode::Element(div) = &ast.html.children[0] else {
            panic!("Expected Element");
        };
        assert!(matches!(&div.children[0], TemplateNode::Element(e) if e.name == "style"));
    }

    #[test]
    fn test_serialized_shape() {
        let ast = parse_ok(r#"<button on:click={() => count++}>{count}</button>"#);
        let json = serde_json::to_value(&ast).unwrap();
        let button = &json["html"]["children"][0];
        assert_eq!(json["html"]["type"], "Fragment");
        assert_eq!(button["type"], "Element");
        assert_eq!(button["attributes"][0]["type"], "EventHandler");
        assert_eq!(button["attributes"][0]["name"], "click");
        assert_eq!(button["children"][0]["type"], "MustacheTag");
        assert_eq!(button["children"][0]["expression"]["type"], "Identifier");
        assert!(json["css"].is_null());

        let TemplateNode::Element(element) = &ast.html.children[0] else {
            panic!("Expected Element");
        };
        assert!(matches!(
            &element.attributes[0],
            AttributeNode::EventHandler { expression: Some(_), .. }
        ));
    }
}
