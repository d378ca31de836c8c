//! Weft Script
//!
//! Parses the script language embedded in Weft components: single
//! expressions inside mustache tags and directive values, and whole
//! programs inside `<script>` blocks. The tree follows the ESTree shape.
//!
//! # Example
//!
//! ```
//! use weft_script::parse_expression_at;
//!
//! let source = "<p>{count + 1}</p>";
//! let (expr, end) = parse_expression_at(source, 4).unwrap();
//! assert_eq!(expr.span.start, 4);
//! assert_eq!(&source[end..], "}</p>");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expression, Program, Span, Statement};
pub use parser::{parse_expression_at, parse_program};

/// Script error with the byte offset it was raised at.
///
/// The display form carries a `(line:column)` suffix the way JavaScript
/// parsers report positions; `message` alone never includes it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({line}:{column})")]
pub struct ScriptError {
    pub message: String,
    pub pos: usize,
    pub line: usize,
    pub column: usize,
}

impl ScriptError {
    /// Build an error at `pos`, deriving its 1-based line and 0-based column.
    pub fn at(source: &str, pos: usize, message: impl Into<String>) -> Self {
        let pos = pos.min(source.len());
        let before = &source[..pos];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count();

        Self {
            message: message.into(),
            pos,
            line,
            column,
        }
    }
}

/// Words that can never name a binding in component code.
pub const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Keywords the script parser refuses as identifiers.
const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with",
];

/// Check if a word is reserved in component code.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Check if a character may start an identifier.
pub fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Check if a character may continue an identifier.
pub fn is_identifier_part(c: char) -> bool {
    // ZWNJ and ZWJ are allowed inside identifiers
    is_identifier_start(c) || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_position() {
        let err = ScriptError::at("a\nbc d", 5, "Unexpected token");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.to_string(), "Unexpected token (2:3)");
    }

    #[test]
    fn test_identifier_chars() {
        assert!(is_identifier_start('$'));
        assert!(is_identifier_start('é'));
        assert!(is_identifier_start('𠮷'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_part('1'));
        assert!(!is_identifier_part('-'));
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("class"));
        assert!(is_reserved_word("arguments"));
        assert!(!is_reserved_word("count"));
    }
}
