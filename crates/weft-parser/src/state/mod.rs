//! Parser states.
//!
//! Each state is a function of the parser that consumes some input and
//! names the next state, or `None` to fall back to [`State::Fragment`].

mod fragment;
mod mustache;
mod tag;
mod text;

pub use tag::OPTIONS_TAG;

use crate::error::ParseError;
use crate::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Dispatch on the next character.
    Fragment,
    /// `<...>`: element, closing tag or comment.
    Tag,
    /// `{...}`: expression or block syntax.
    Mustache,
    /// Literal text up to the next `<` or `{`.
    Text,
}

impl State {
    pub fn step(self, parser: &mut Parser<'_>) -> Result<Option<State>, ParseError> {
        match self {
            State::Fragment => Ok(fragment::fragment(parser)),
            State::Tag => tag::tag(parser),
            State::Mustache => mustache::mustache(parser),
            State::Text => {
                text::text(parser);
                Ok(None)
            }
        }
    }
}
