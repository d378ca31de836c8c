//! `{expression}` tags and `{#if}` / `{:else}` / `{/if}` block syntax.

use tracing::trace;

use super::tag::closing_tag_omitted;
use super::State;
use crate::ast::{ElseBlock, IfBlock, MustacheTag, TemplateNode};
use crate::error::{ErrorCode, ParseError};
use crate::parser::Parser;
use crate::stack::{Current, OpenNode};

pub fn mustache(parser: &mut Parser<'_>) -> Result<Option<State>, ParseError> {
    let start = parser.index;
    parser.index += 1;
    parser.allow_whitespace();

    if parser.eat("/", false)? {
        close_block(parser, start)?;
    } else if parser.eat(":else", false)? {
        else_block(parser, start)?;
    } else if parser.eat("#", false)? {
        open_block(parser, start)?;
    } else {
        let expression = parser.read_expression()?;
        parser.allow_whitespace();
        parser.eat("}", true)?;

        parser.stack.push(TemplateNode::MustacheTag(MustacheTag {
            start,
            end: parser.index,
            expression,
        }));
    }

    Ok(None)
}

fn open_block(parser: &mut Parser<'_>, start: usize) -> Result<(), ParseError> {
    if !parser.eat("if", false)? {
        return Err(parser.error(ErrorCode::ExpectedBlockType, "Expected if"));
    }
    parser.require_whitespace()?;

    let expression = parser.read_expression()?;
    parser.allow_whitespace();
    parser.eat("}", true)?;

    trace!(start, "open if block");
    parser.stack.open(OpenNode::IfBlock(IfBlock {
        start,
        end: start,
        expression,
        children: Vec::new(),
        else_block: None,
    }));
    Ok(())
}

fn else_block(parser: &mut Parser<'_>, start: usize) -> Result<(), ParseError> {
    parser.allow_whitespace();
    parser.eat("}", true)?;
    let index = parser.index;

    match parser.stack.top_mut() {
        Some(OpenNode::IfBlock(block)) if block.else_block.is_none() => {
            block.else_block = Some(ElseBlock {
                start: index,
                end: index,
                children: Vec::new(),
            });
            Ok(())
        }
        _ => Err(parser.error_at(
            ErrorCode::InvalidElsePlacement,
            "Cannot have an {:else} block outside an {#if ...} block",
            start,
        )),
    }
}

fn close_block(parser: &mut Parser<'_>, start: usize) -> Result<(), ParseError> {
    // Elements like <li> may be left open at the end of a block
    while let Current::Open(OpenNode::Element(element)) = parser.stack.current() {
        if !closing_tag_omitted(&element.name, None) {
            break;
        }
        parser.stack.close(start);
    }

    if !matches!(parser.stack.current(), Current::Open(OpenNode::IfBlock(_))) {
        return Err(parser.error_at(
            ErrorCode::UnexpectedBlockClose,
            "Unexpected block closing tag",
            start,
        ));
    }

    parser.eat("if", true)?;
    parser.allow_whitespace();
    parser.eat("}", true)?;

    if let Some(OpenNode::IfBlock(block)) = parser.stack.top_mut() {
        if let Some(else_block) = &mut block.else_block {
            else_block.end = start;
        }
    }
    parser.stack.close(parser.index);
    Ok(())
}
