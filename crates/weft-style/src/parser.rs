//! Rule parsers driven by `cssparser`.
//!
//! `cssparser` does the tokenizing and block matching; the parsers here only
//! capture preludes and values as source text and record where each node
//! starts and ends.

use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, DeclarationParser, ParseError, ParseErrorKind,
    Parser, ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
    SourceLocation, StyleSheetParser, Token,
};

use crate::ast::{Atrule, Declaration, Location, Node, Position, Rule, Stylesheet};
use crate::StyleError;

type Failure<'i> = ParseError<'i, &'static str>;

/// Parse `source` as a stylesheet located at byte `offset` of its document.
pub fn parse_stylesheet(source: &str, offset: usize) -> Result<Stylesheet, StyleError> {
    let index = LineIndex::new(source, offset);

    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let mut rule_parser = RuleParser {
        index: &index,
        nested: true,
    };
    let mut sheet = StyleSheetParser::new(&mut parser, &mut rule_parser);

    let mut children = Vec::new();
    while let Some(result) = sheet.next() {
        let node = result.map_err(|(err, _)| index.error(err))?;
        let end = sheet.input.position().byte_index();
        children.push(index.close(node, end));
    }

    Ok(Stylesheet {
        children,
        location: Location {
            start: index.position(0),
            end: index.position(source.len()),
        },
    })
}

/// Maps local byte positions to document positions.
struct LineIndex<'a> {
    source: &'a str,
    base: usize,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str, base: usize) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            base,
            line_starts,
        }
    }

    fn position(&self, local: usize) -> Position {
        let local = local.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= local);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..local)
            .map_or(0, |text| text.chars().count());

        Position {
            offset: self.base + local,
            line,
            column,
        }
    }

    /// Local byte offset of a `cssparser` location.
    ///
    /// Lines are 0-based there and columns 1-based in UTF-16 code units.
    fn offset_of(&self, location: SourceLocation) -> usize {
        let Some(&line_start) = self.line_starts.get(location.line as usize) else {
            return self.source.len();
        };

        let target = location.column.saturating_sub(1) as usize;
        let mut units = 0;
        for (i, c) in self.source[line_start..].char_indices() {
            if units >= target || c == '\n' {
                return line_start + i;
            }
            units += c.len_utf16();
        }
        self.source.len()
    }

    /// Stamp the end of a rule once `cssparser` has moved past its `}`.
    fn close(&self, node: Node, end: usize) -> Node {
        match node {
            Node::Rule(mut rule) => {
                rule.location.end = self.position(end);
                Node::Rule(rule)
            }
            Node::Atrule(mut atrule) => {
                atrule.location.end = self.position(end);
                Node::Atrule(atrule)
            }
            decl @ Node::Declaration(_) => decl,
        }
    }

    fn error(&self, err: Failure<'_>) -> StyleError {
        let message = match err.kind {
            ParseErrorKind::Custom(message) => message.to_string(),
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
                format!("Unexpected token {token:?}")
            }
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                "Unexpected end of input".to_string()
            }
            ParseErrorKind::Basic(BasicParseErrorKind::AtRuleInvalid(name)) => {
                format!("Invalid at-rule @{name}")
            }
            ParseErrorKind::Basic(_) => "Invalid rule".to_string(),
        };

        StyleError {
            message,
            pos: self.base + self.offset_of(err.location),
        }
    }
}

/// Parses rules, at-rules and declarations at any nesting level.
struct RuleParser<'a> {
    index: &'a LineIndex<'a>,
    /// Whether qualified rules may appear here (stylesheet and at-rule bodies).
    nested: bool,
}

impl<'a> RuleParser<'a> {
    fn parse_body<'i>(
        &self,
        input: &mut Parser<'i, '_>,
        nested: bool,
    ) -> Result<Vec<Node>, Failure<'i>> {
        let index = self.index;
        let mut item_parser = RuleParser { index, nested };
        let mut body = RuleBodyParser::new(input, &mut item_parser);

        let mut children = Vec::new();
        while let Some(result) = body.next() {
            let node = result.map_err(|(err, _)| err)?;
            let end = body.input.position().byte_index();
            children.push(index.close(node, end));
        }
        Ok(children)
    }

    fn start_location(&self, start: &ParserState, input: &Parser<'_, '_>) -> Location {
        Location {
            start: self.index.position(start.position().byte_index()),
            end: self.index.position(input.position().byte_index()),
        }
    }
}

/// Consume the rest of `input`, returning its source text and whether it
/// contained a `{}` block.
fn read_raw<'i>(input: &mut Parser<'i, '_>) -> (&'i str, bool) {
    let start = input.position();
    let mut has_block = false;
    loop {
        match input.next_including_whitespace_and_comments() {
            Ok(Token::CurlyBracketBlock) => has_block = true,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    (input.slice_from(start), has_block)
}

impl<'i> QualifiedRuleParser<'i> for RuleParser<'_> {
    type Prelude = String;
    type QualifiedRule = Node;
    type Error = &'static str;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let (raw, _) = read_raw(input);
        let prelude = raw.trim();
        if prelude.is_empty() {
            return Err(location.new_custom_error("Selector is expected"));
        }
        Ok(prelude.to_string())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let children = self.parse_body(input, false)?;
        Ok(Node::Rule(Rule {
            prelude,
            children,
            location: self.start_location(start, input),
        }))
    }
}

impl<'i> AtRuleParser<'i> for RuleParser<'_> {
    type Prelude = (String, String);
    type AtRule = Node;
    type Error = &'static str;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let (raw, _) = read_raw(input);
        Ok((name.to_string(), raw.trim().to_string()))
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        let (name, prelude) = prelude;
        let start = self.index.position(start.position().byte_index());
        Ok(Node::Atrule(Atrule {
            name,
            prelude,
            children: None,
            location: Location { start, end: start },
        }))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let (name, prelude) = prelude;
        let children = self.parse_body(input, true)?;
        Ok(Node::Atrule(Atrule {
            name,
            prelude,
            children: Some(children),
            location: self.start_location(start, input),
        }))
    }
}

impl<'i> DeclarationParser<'i> for RuleParser<'_> {
    type Declaration = Node;
    type Error = &'static str;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let value_start = input.position().byte_index();
        let (raw, has_block) = read_raw(input);

        // `a:hover { ... }` inside a nested body is a rule, not a declaration
        if has_block {
            return Err(location.new_custom_error("Unexpected block in declaration"));
        }

        let trimmed_end = raw.trim_end();
        let end = value_start + trimmed_end.len();
        let mut value = trimmed_end.trim_start();

        let important = value.to_ascii_lowercase().ends_with("!important");
        if important {
            value = value[..value.len() - "!important".len()].trim_end();
        }
        if value.is_empty() {
            return Err(location.new_custom_error("Declaration value is expected"));
        }

        Ok(Node::Declaration(Declaration {
            property: name.to_string(),
            value: value.to_string(),
            important,
            location: Location {
                start: self
                    .index
                    .position(declaration_start.position().byte_index()),
                end: self.index.position(end),
            },
        }))
    }
}

impl<'i> RuleBodyItemParser<'i, Node, &'static str> for RuleParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        self.nested
    }
}
