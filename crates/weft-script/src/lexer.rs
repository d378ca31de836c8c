//! Lexer for Weft script code.
//!
//! Tokenizes the expression and statement language used in mustache tags,
//! directive values and `<script>` blocks. The lexer is pull-based: the
//! parser asks for one token at a time, so text after the last expression
//! is never looked at. This matters for `{count}</p>`, where everything
//! after the closing brace belongs to the markup grammar.
//!
//! Positions are byte offsets into the full source text, not into the
//! expression, so spans can be reported against the whole document.
//!
//! # Examples
//!
//! ```
//! use weft_script::lexer::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("count + 1", 0);
//! assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
//! assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Plus);
//! assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number);
//! ```

use crate::ast::Span;
use crate::{is_identifier_part, is_identifier_start, ScriptError};

/// A token produced by the script lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: TokenValue,
    /// A line terminator was skipped between the previous token and this one.
    pub newline_before: bool,
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    /// Template chunk followed by `${`.
    Template,
    /// Final template chunk, closed by a backtick.
    TemplateTail,

    // Identifiers and keywords alike; the parser decides which words are reserved.
    Identifier,

    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Lte,
    Gte,

    // Bitwise
    Shl,
    Shr,
    UShr,
    Amp,
    Pipe,
    Caret,
    Tilde,

    // Logical
    And,
    Or,
    Not,
    QuestionQuestion,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    PercentEq,
    AndEq,
    OrEq,
    QuestionQuestionEq,

    // Update
    PlusPlus,
    MinusMinus,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Dot,
    Ellipsis,
    Comma,
    Colon,
    Semicolon,
    Question,
    Arrow,
    OptionalChain,

    // End of input
    Eof,
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Number(f64),
    String(String),
    Identifier(String),
}

/// Punctuators ordered so that longer spellings are tried first.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>", TokenKind::UShr),
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNotEq),
    ("**=", TokenKind::StarStarEq),
    ("&&=", TokenKind::AndEq),
    ("||=", TokenKind::OrEq),
    ("??=", TokenKind::QuestionQuestionEq),
    ("...", TokenKind::Ellipsis),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Lte),
    (">=", TokenKind::Gte),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("??", TokenKind::QuestionQuestion),
    ("**", TokenKind::StarStar),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("%=", TokenKind::PercentEq),
    ("=>", TokenKind::Arrow),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Not),
    ("=", TokenKind::Eq),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("?", TokenKind::Question),
];

/// Weft script lexer.
///
/// Cheap to clone; the parser clones it to look one token further ahead
/// when deciding whether `name` starts an arrow function.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer that starts reading `source` at byte `offset`.
    pub fn new(source: &'a str, offset: usize) -> Self {
        Self {
            source,
            pos: offset.min(source.len()),
        }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Read the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, ScriptError> {
        let newline_before = self.skip_trivia()?;
        let start = self.pos;

        let Some(ch) = self.current() else {
            return Ok(self.token(TokenKind::Eof, start, TokenValue::None, newline_before));
        };

        let token = match ch {
            '0'..='9' => self.read_number(start)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start)?,
            '\'' | '"' => self.read_string(start)?,
            '`' => {
                self.advance();
                self.read_template_chunk(start)?
            }
            c if is_identifier_start(c) => self.read_identifier(start),
            // `a?.5:b` is a conditional, not optional chaining
            '?' if self.rest().starts_with("?.")
                && !self.rest()[2..].starts_with(|c: char| c.is_ascii_digit()) =>
            {
                self.pos += 2;
                self.token(TokenKind::OptionalChain, start, TokenValue::None, false)
            }
            _ => {
                let rest = self.rest();
                let Some((text, kind)) = PUNCTUATORS.iter().find(|(p, _)| rest.starts_with(p))
                else {
                    return Err(ScriptError::at(
                        self.source,
                        start,
                        format!("Unexpected character '{ch}'"),
                    ));
                };
                self.pos += text.len();
                self.token(*kind, start, TokenValue::None, false)
            }
        };

        Ok(Token {
            newline_before,
            ..token
        })
    }

    /// Continue a template literal after the `}` closing a substitution.
    ///
    /// The parser calls this while the `}` is its current token, so the
    /// lexer is positioned right after it.
    pub fn next_template_chunk(&mut self) -> Result<Token, ScriptError> {
        let start = self.pos;
        self.read_template_chunk(start)
    }

    // --- Private helpers ---

    /// Skip whitespace and comments; report whether a line break was crossed.
    fn skip_trivia(&mut self) -> Result<bool, ScriptError> {
        let mut newline = false;

        while let Some(c) = self.current() {
            match c {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    newline = true;
                    self.advance();
                }
                c if c.is_whitespace() || c == '\u{feff}' => self.advance(),
                '/' if self.peek() == Some('/') => {
                    while self.current().is_some_and(|c| c != '\n' && c != '\r') {
                        self.advance();
                    }
                }
                '/' if self.peek() == Some('*') => {
                    let start = self.pos;
                    let Some(close) = self.rest()[2..].find("*/") else {
                        return Err(ScriptError::at(self.source, start, "Unterminated comment"));
                    };
                    let body = &self.rest()[2..2 + close];
                    newline |= body.contains(['\n', '\r']);
                    self.pos += close + 4;
                }
                _ => break,
            }
        }

        Ok(newline)
    }

    fn read_number(&mut self, start: usize) -> Result<Token, ScriptError> {
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            while self.current().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
            let digits = self.source[start + 2..self.pos].replace('_', "");
            let value = u64::from_str_radix(&digits, 16).map_err(|_| {
                ScriptError::at(self.source, start, "Expected number in radix 16")
            })?;
            return Ok(self.token(
                TokenKind::Number,
                start,
                TokenValue::Number(value as f64),
                false,
            ));
        }

        self.eat_digits();
        if self.current() == Some('.') {
            self.advance();
            self.eat_digits();
        }
        if matches!(self.current(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.current(), Some('+' | '-')) {
                self.advance();
            }
            if !self.current().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ScriptError::at(self.source, start, "Invalid number"));
            }
            self.eat_digits();
        }
        if self.current().is_some_and(is_identifier_start) {
            return Err(ScriptError::at(
                self.source,
                self.pos,
                "Identifier directly after number",
            ));
        }

        let text = self.source[start..self.pos].replace('_', "");
        let value: f64 = text
            .parse()
            .map_err(|_| ScriptError::at(self.source, start, format!("Invalid number: '{text}'")))?;

        Ok(self.token(TokenKind::Number, start, TokenValue::Number(value), false))
    }

    fn eat_digits(&mut self) {
        while self.current().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.advance();
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token, ScriptError> {
        let Some(quote) = self.current() else {
            return Err(ScriptError::at(self.source, start, "Unterminated string constant"));
        };
        self.advance(); // skip opening quote

        let mut value = String::new();

        loop {
            match self.current() {
                None | Some('\n' | '\r') => {
                    return Err(ScriptError::at(
                        self.source,
                        start,
                        "Unterminated string constant",
                    ));
                }
                Some(c) if c == quote => break,
                Some('\\') => {
                    self.advance();
                    self.read_escape(start, &mut value)?;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.advance(); // skip closing quote

        Ok(self.token(TokenKind::String, start, TokenValue::String(value), false))
    }

    /// Read a template chunk up to the closing backtick or the next `${`.
    fn read_template_chunk(&mut self, start: usize) -> Result<Token, ScriptError> {
        let mut value = String::new();

        loop {
            match self.current() {
                None => return Err(ScriptError::at(self.source, start, "Unterminated template")),
                Some('`') => {
                    self.advance();
                    return Ok(self.token(
                        TokenKind::TemplateTail,
                        start,
                        TokenValue::String(value),
                        false,
                    ));
                }
                Some('$') if self.peek() == Some('{') => {
                    self.pos += 2;
                    return Ok(self.token(
                        TokenKind::Template,
                        start,
                        TokenValue::String(value),
                        false,
                    ));
                }
                Some('\\') => {
                    self.advance();
                    self.read_escape(start, &mut value)?;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Decode one escape sequence; the backslash is already consumed.
    fn read_escape(&mut self, start: usize, value: &mut String) -> Result<(), ScriptError> {
        let Some(c) = self.current() else {
            return Err(ScriptError::at(self.source, start, "Unterminated escape sequence"));
        };
        self.advance();

        match c {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            // line continuation
            '\n' => {}
            '\r' => {
                if self.current() == Some('\n') {
                    self.advance();
                }
            }
            'x' => {
                let code = self.read_hex(2, start)?;
                value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = if self.current() == Some('{') {
                    self.advance();
                    let digits_start = self.pos;
                    while self.current().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                    let digits = &self.source[digits_start..self.pos];
                    if self.current() != Some('}') {
                        return Err(ScriptError::at(self.source, start, "Bad character escape sequence"));
                    }
                    self.advance();
                    u32::from_str_radix(digits, 16).map_err(|_| {
                        ScriptError::at(self.source, start, "Bad character escape sequence")
                    })?
                } else {
                    self.read_hex(4, start)?
                };
                value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => value.push(other),
        }

        Ok(())
    }

    fn read_hex(&mut self, len: usize, start: usize) -> Result<u32, ScriptError> {
        let digits = self.rest().get(..len).unwrap_or("");
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| ScriptError::at(self.source, start, "Bad character escape sequence"))?;
        self.pos += len;
        Ok(code)
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        self.advance();
        while self.current().is_some_and(is_identifier_part) {
            self.advance();
        }

        let text = &self.source[start..self.pos];
        self.token(
            TokenKind::Identifier,
            start,
            TokenValue::Identifier(text.to_string()),
            false,
        )
    }

    fn token(&self, kind: TokenKind, start: usize, value: TokenValue, newline_before: bool) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
            value,
            newline_before,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
        }
    }
}
