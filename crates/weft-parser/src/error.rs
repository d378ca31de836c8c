//! Parse failures.
//!
//! Every failure is fatal: the first error aborts the parse and no partial
//! tree is returned.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use weft_script::ScriptError;
use weft_style::StyleError;

/// `" (3:14)"` suffix the script parser appends to its messages.
static POSITION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\d+:\d+\)$").unwrap());

/// Machine-checkable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // Structural
    UnclosedElement,
    UnclosedBlock,
    UnexpectedEof,

    // Token-level
    UnexpectedToken,
    UnexpectedEofToken,
    MissingWhitespace,
    UnexpectedReservedWord,

    // Embedded grammars
    ParseError,
    CssSyntaxError,

    // Top-level cardinality
    DuplicateStyle,
    InvalidScriptInstance,
    InvalidScriptModule,

    // Markup
    UnclosedComment,
    UnclosedScript,
    UnclosedStyle,
    InvalidTagName,
    InvalidVoidContent,
    InvalidClosingTag,
    DuplicateAttribute,
    EmptyAttributeShorthand,
    EmptyDirectiveName,
    InvalidDirectiveValue,
    MissingAttributeValue,
    InvalidScriptContextAttribute,
    InvalidScriptContextValue,
    InvalidOptionsPlacement,
    DuplicateOptions,
    ExpectedBlockType,
    UnexpectedBlockClose,
    InvalidElsePlacement,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnclosedElement => "unclosed-element",
            ErrorCode::UnclosedBlock => "unclosed-block",
            ErrorCode::UnexpectedEof => "unexpected-eof",
            ErrorCode::UnexpectedToken => "unexpected-token",
            ErrorCode::UnexpectedEofToken => "unexpected-eof-token",
            ErrorCode::MissingWhitespace => "missing-whitespace",
            ErrorCode::UnexpectedReservedWord => "unexpected-reserved-word",
            ErrorCode::ParseError => "parse-error",
            ErrorCode::CssSyntaxError => "css-syntax-error",
            ErrorCode::DuplicateStyle => "duplicate-style",
            ErrorCode::InvalidScriptInstance => "invalid-script-instance",
            ErrorCode::InvalidScriptModule => "invalid-script-module",
            ErrorCode::UnclosedComment => "unclosed-comment",
            ErrorCode::UnclosedScript => "unclosed-script",
            ErrorCode::UnclosedStyle => "unclosed-style",
            ErrorCode::InvalidTagName => "invalid-tag-name",
            ErrorCode::InvalidVoidContent => "invalid-void-content",
            ErrorCode::InvalidClosingTag => "invalid-closing-tag",
            ErrorCode::DuplicateAttribute => "duplicate-attribute",
            ErrorCode::EmptyAttributeShorthand => "empty-attribute-shorthand",
            ErrorCode::EmptyDirectiveName => "empty-directive-name",
            ErrorCode::InvalidDirectiveValue => "invalid-directive-value",
            ErrorCode::MissingAttributeValue => "missing-attribute-value",
            ErrorCode::InvalidScriptContextAttribute => "invalid-script-context-attribute",
            ErrorCode::InvalidScriptContextValue => "invalid-script-context-value",
            ErrorCode::InvalidOptionsPlacement => "invalid-options-placement",
            ErrorCode::DuplicateOptions => "duplicate-options",
            ErrorCode::ExpectedBlockType => "expected-block-type",
            ErrorCode::UnexpectedBlockClose => "unexpected-block-close",
            ErrorCode::InvalidElsePlacement => "invalid-else-placement",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error with the document and offset it was raised at.
///
/// Turning `start` into a line and column for display is left to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{code}: {message}")]
pub struct ParseError {
    name: &'static str,
    pub code: ErrorCode,
    pub message: String,
    /// Full text of the document that failed to parse.
    #[serde(rename = "source")]
    pub source_text: String,
    pub start: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ParseError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        source: &str,
        start: usize,
        filename: Option<&str>,
    ) -> Self {
        Self {
            name: "ParseError",
            code,
            message: message.into(),
            source_text: source.to_string(),
            start,
            filename: filename.map(str::to_string),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrap a script failure, dropping its own `(line:column)` suffix.
    pub fn from_script(err: &ScriptError, source: &str, filename: Option<&str>) -> Self {
        let message = err.to_string();
        let message = POSITION_SUFFIX.replace(&message, "");
        Self::new(ErrorCode::ParseError, message, source, err.pos, filename)
    }

    pub fn from_style(err: &StyleError, source: &str, filename: Option<&str>) -> Self {
        Self::new(
            ErrorCode::CssSyntaxError,
            err.message.as_str(),
            source,
            err.pos,
            filename,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_strings() {
        assert_eq!(ErrorCode::UnexpectedEofToken.as_str(), "unexpected-eof-token");
        assert_eq!(ErrorCode::ParseError.to_string(), "parse-error");
        assert_eq!(
            serde_json::to_value(ErrorCode::InvalidScriptModule).unwrap(),
            "invalid-script-module"
        );
    }

    #[test]
    fn test_script_error_suffix_is_stripped() {
        let source = "{a +}";
        let err = weft_script::parse_expression_at(source, 1).unwrap_err();
        let err = ParseError::from_script(&err, source, Some("App.weft"));
        assert_eq!(err.code, ErrorCode::ParseError);
        assert_eq!(err.message, "Unexpected token");
        assert_eq!(err.start, 4);
        assert_eq!(err.filename.as_deref(), Some("App.weft"));
        assert_eq!(err.name(), "ParseError");
    }

    #[test]
    fn test_serialized_shape() {
        let err = ParseError::new(ErrorCode::DuplicateStyle, "twice", "<style>", 3, None);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["name"], "ParseError");
        assert_eq!(json["code"], "duplicate-style");
        assert_eq!(json["message"], "twice");
        assert_eq!(json["source"], "<style>");
        assert_eq!(json["start"], 3);
        assert!(json.get("filename").is_none());
    }
}
