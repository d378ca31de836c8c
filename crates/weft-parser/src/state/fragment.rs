use super::State;
use crate::parser::Parser;

pub fn fragment(parser: &Parser<'_>) -> Option<State> {
    if parser.match_str("<") {
        Some(State::Tag)
    } else if parser.match_str("{") {
        Some(State::Mustache)
    } else {
        Some(State::Text)
    }
}
