//! Lexical primitives over the parser's source and offset.
//!
//! Every primitive either consumes exactly what it reports or nothing at
//! all. Failures are raised through [`Parser::error`], which stamps the
//! document, offset and filename onto the error.

use regex::Regex;
use weft_script::{is_identifier_part, is_identifier_start, is_reserved_word, Expression};

use crate::error::{ErrorCode, ParseError};
use crate::parser::Parser;

/// Markup whitespace: space, tab, CR and LF. Other Unicode spaces are text.
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

impl<'a> Parser<'a> {
    /// Unread part of the source.
    pub fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.source.len()
    }

    /// Whether `literal` occurs at the current offset.
    pub fn match_str(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    /// Consume `literal` if present.
    ///
    /// When `required` and absent, fails with `unexpected-token`, or with
    /// `unexpected-eof-token` at end of input.
    pub fn eat(&mut self, literal: &str, required: bool) -> Result<bool, ParseError> {
        if self.match_str(literal) {
            self.index += literal.len();
            return Ok(true);
        }

        if required {
            if self.at_end() {
                return Err(self.error(
                    ErrorCode::UnexpectedEofToken,
                    format!("Unexpected end of input, expected {literal}"),
                ));
            }
            return Err(self.error(ErrorCode::UnexpectedToken, format!("Expected {literal}")));
        }

        Ok(false)
    }

    /// Consume `literal` or fail with a custom error.
    pub fn eat_or(
        &mut self,
        literal: &str,
        code: ErrorCode,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.eat(literal, false)? {
            Ok(())
        } else {
            Err(self.error(code, message))
        }
    }

    /// Text matched by `pattern` at the current offset, without consuming it.
    pub fn match_regex(&self, pattern: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        pattern
            .find(rest)
            .filter(|m| m.start() == 0)
            .map(|m| &rest[..m.end()])
    }

    /// Consume and return the text matched by `pattern` at the current offset.
    pub fn read(&mut self, pattern: &Regex) -> Option<&'a str> {
        let matched = self.match_regex(pattern)?;
        self.index += matched.len();
        Some(matched)
    }

    /// Consume everything before the first match of `pattern`, or the rest
    /// of the input when it never matches.
    pub fn read_until(&mut self, pattern: &Regex) -> Result<&'a str, ParseError> {
        self.read_until_or(pattern, ErrorCode::UnexpectedEof, "Unexpected end of input")
    }

    /// [`read_until`](Self::read_until) with a custom end-of-input error.
    pub fn read_until_or(
        &mut self,
        pattern: &Regex,
        code: ErrorCode,
        message: &str,
    ) -> Result<&'a str, ParseError> {
        if self.at_end() {
            return Err(self.error(code, message));
        }

        let rest = self.rest();
        let len = pattern.find(rest).map_or(rest.len(), |m| m.start());
        self.index += len;
        Ok(&rest[..len])
    }

    pub fn allow_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(is_whitespace);
        self.index += rest.len() - trimmed.len();
    }

    pub fn require_whitespace(&mut self) -> Result<(), ParseError> {
        if !self.rest().starts_with(is_whitespace) {
            return Err(self.error(ErrorCode::MissingWhitespace, "Expected whitespace"));
        }
        self.allow_whitespace();
        Ok(())
    }

    /// Read an identifier of the script language, whole code points at a time.
    ///
    /// Returns `None` without consuming when the next character cannot start
    /// an identifier.
    pub fn read_identifier(&mut self, allow_reserved: bool) -> Result<Option<&'a str>, ParseError> {
        let start = self.index;
        let rest = self.rest();

        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_identifier_start(c) => {}
            _ => return Ok(None),
        }

        let len = chars
            .find(|&(_, c)| !is_identifier_part(c))
            .map_or(rest.len(), |(i, _)| i);
        let identifier = &rest[..len];
        self.index += len;

        if !allow_reserved && is_reserved_word(identifier) {
            return Err(self.error_at(
                ErrorCode::UnexpectedReservedWord,
                format!("'{identifier}' is a reserved word in JavaScript and cannot be used here"),
                start,
            ));
        }

        Ok(Some(identifier))
    }

    /// Step over one character.
    pub fn advance_char(&mut self) {
        self.index += self.rest().chars().next().map_or(1, char::len_utf8);
    }

    /// Parse one script expression at the current offset and move past it.
    pub fn read_expression(&mut self) -> Result<Expression, ParseError> {
        match weft_script::parse_expression_at(self.source, self.index) {
            Ok((expression, end)) => {
                self.index = end;
                Ok(expression)
            }
            Err(err) => Err(ParseError::from_script(&err, self.source, self.filename)),
        }
    }

    /// Error at the current offset.
    pub fn error(&self, code: ErrorCode, message: impl Into<String>) -> ParseError {
        self.error_at(code, message, self.index)
    }

    pub fn error_at(&self, code: ErrorCode, message: impl Into<String>, start: usize) -> ParseError {
        ParseError::new(code, message, self.source, start, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;
    use pretty_assertions::assert_eq;
    use std::sync::LazyLock;

    static OPTIONS: LazyLock<ParseOptions> = LazyLock::new(ParseOptions::default);

    fn parser(source: &str) -> Parser<'_> {
        Parser::new(source, &OPTIONS)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_match_does_not_consume() {
        let p = parser("<div>");
        assert!(p.match_str("<d"));
        assert!(!p.match_str("div"));
        assert_eq!(p.index, 0);
    }

    #[test]
    fn test_eat_optional() {
        let mut p = parser("abc");
        assert!(p.eat("ab", false).unwrap());
        assert_eq!(p.index, 2);
        assert!(!p.eat("x", false).unwrap());
        assert_eq!(p.index, 2);
    }

    #[test]
    fn test_eat_required_at_end() {
        let mut p = parser("{a");
        p.index = 2;
        let err = p.eat("}", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedEofToken);
        assert!(err.message.contains('}'));
        assert_eq!(err.start, 2);
    }

    #[test]
    fn test_eat_required_mid_document() {
        let mut p = parser("{a b}");
        p.index = 2;
        let err = p.eat("}", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert_eq!(err.message, "Expected }");
    }

    #[test]
    fn test_eat_or_custom_error() {
        let mut p = parser("<!-- x");
        let err = p
            .eat_or("-->", ErrorCode::UnclosedComment, "comment was left open")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedComment);
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    #[test]
    fn test_read_is_anchored() {
        let digits = Regex::new(r"\d+").unwrap();
        let mut p = parser("ab12");
        assert_eq!(p.read(&digits), None);
        assert_eq!(p.index, 0);
        p.index = 2;
        assert_eq!(p.read(&digits), Some("12"));
        assert_eq!(p.index, 4);
    }

    #[test]
    fn test_read_until() {
        let close = Regex::new(r"\s|>").unwrap();
        let mut p = parser("div class>");
        assert_eq!(p.read_until(&close).unwrap(), "div");
        assert_eq!(p.index, 3);

        let mut p = parser("div");
        assert_eq!(p.read_until(&close).unwrap(), "div");
        assert!(p.at_end());

        let err = p.read_until(&close).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedEof);
    }

    // =========================================================================
    // Whitespace
    // =========================================================================

    #[test]
    fn test_allow_whitespace() {
        let mut p = parser(" \t\r\n x");
        p.allow_whitespace();
        assert_eq!(p.index, 5);
        p.allow_whitespace();
        assert_eq!(p.index, 5);
    }

    #[test]
    fn test_require_whitespace() {
        let mut p = parser("x");
        let err = p.require_whitespace().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingWhitespace);

        let mut p = parser("  x");
        p.require_whitespace().unwrap();
        assert_eq!(p.index, 2);
    }

    #[test]
    fn test_non_breaking_space_is_not_whitespace() {
        let mut p = parser("\u{a0}x");
        p.allow_whitespace();
        assert_eq!(p.index, 0);

        let err = p.require_whitespace().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingWhitespace);
        assert_eq!(err.start, 0);

        let mut p = parser(" \u{2003}x");
        p.allow_whitespace();
        assert_eq!(p.index, 1);
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    #[test]
    fn test_identifier_with_supplementary_character() {
        let mut p = parser("𠮷ab = 1");
        assert_eq!(p.read_identifier(false).unwrap(), Some("𠮷ab"));
        assert_eq!(p.index, '𠮷'.len_utf8() + 2);
    }

    #[test]
    fn test_identifier_rejects_non_start() {
        let mut p = parser("1abc");
        assert_eq!(p.read_identifier(false).unwrap(), None);
        assert_eq!(p.index, 0);
    }

    #[test]
    fn test_reserved_identifier() {
        let mut p = parser(" class");
        p.index = 1;
        let err = p.read_identifier(false).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedReservedWord);
        assert_eq!(err.start, 1);

        let mut p = parser("class");
        assert_eq!(p.read_identifier(true).unwrap(), Some("class"));
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[test]
    fn test_read_expression_moves_past_it() {
        let mut p = parser("{count * 2}");
        p.index = 1;
        let expression = p.read_expression().unwrap();
        assert_eq!(expression.span.start, 1);
        assert_eq!(p.index, 10);
        assert!(p.match_str("}"));
    }

    #[test]
    fn test_read_expression_error() {
        let mut p = parser("{count +}");
        p.index = 1;
        let err = p.read_expression().unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
        assert_eq!(err.message, "Unexpected token");
        assert_eq!(err.start, 8);
    }
}
