//! Expression and program parser for Weft script code.
//!
//! Pulls tokens from the [`Lexer`] one at a time and builds ESTree-shaped
//! nodes using recursive descent, with precedence climbing for binary
//! operators. Holds exactly one token of lookahead so a single expression
//! can be parsed out of the middle of a larger document.

use crate::ast::{
    ArrowBody, AssignOp, AssignmentPattern, BinaryOp, ExportSpecifier, ExprKind, Expression,
    Identifier, ImportSpecifier, LiteralValue, LogicalOp, Pattern, Program, Property, Span,
    Statement, StmtKind, UnaryOp, UpdateOp, VariableDeclarator, VariableKind,
};
use crate::lexer::{Lexer, Token, TokenKind, TokenValue};
use crate::{is_keyword, ScriptError};

/// Parse one expression starting at byte `offset` of `source`.
///
/// Returns the expression and the offset just past its last token. Text
/// after the expression is left alone, so callers can continue scanning
/// their own grammar from the returned offset.
pub fn parse_expression_at(
    source: &str,
    offset: usize,
) -> Result<(Expression, usize), ScriptError> {
    let mut parser = Parser::new(source, offset)?;
    let expr = parser.parse_expression()?;
    Ok((expr, parser.prev_end))
}

/// Parse a whole module program.
pub fn parse_program(source: &str) -> Result<Program, ScriptError> {
    let mut parser = Parser::new(source, 0)?;
    let mut body = Vec::new();

    while parser.current.kind != TokenKind::Eof {
        body.push(parser.parse_statement(true)?);
    }

    Ok(Program {
        body,
        source_type: "module",
        span: Span::new(0, source.len()),
    })
}

/// Binary-level operator, either arithmetic/relational or short-circuiting.
#[derive(Debug, Clone, Copy)]
enum InfixOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Weft script parser.
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    prev_end: usize,
    function_depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser positioned at the first token at or after `offset`.
    pub fn new(source: &'a str, offset: usize) -> Result<Self, ScriptError> {
        let mut lexer = Lexer::new(source, offset);
        let current = lexer.next_token()?;
        Ok(Self {
            source,
            lexer,
            current,
            prev_end: offset,
            function_depth: 0,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self, top_level: bool) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;

        match self.current.kind {
            TokenKind::LBrace => return self.parse_block(),
            TokenKind::Semicolon => {
                self.advance()?;
                return Ok(Statement::new(StmtKind::Empty, self.span_from(start)));
            }
            _ => {}
        }

        if self.is_word("var") || self.is_word("let") || self.is_word("const") {
            let decl = self.parse_variable_declaration()?;
            self.consume_semicolon()?;
            return Ok(Statement::new(decl, self.span_from(start)));
        }
        if self.is_word("function") {
            return self.parse_function_declaration();
        }
        if self.is_word("if") {
            return self.parse_if();
        }
        if self.is_word("return") {
            return self.parse_return();
        }
        if self.is_word("import") && !matches!(self.peek_kind(), TokenKind::LParen | TokenKind::Dot)
        {
            if !top_level {
                return Err(self.error_at(
                    start,
                    "'import' and 'export' may only appear at the top level",
                ));
            }
            return self.parse_import();
        }
        if self.is_word("export") {
            if !top_level {
                return Err(self.error_at(
                    start,
                    "'import' and 'export' may only appear at the top level",
                ));
            }
            return self.parse_export();
        }

        // `$: total = a + b`
        if self.current.kind == TokenKind::Identifier
            && !self.current_is_keyword()
            && self.peek_kind() == TokenKind::Colon
        {
            let label = self.parse_binding_identifier()?;
            self.advance()?; // consume :
            let body = self.parse_statement(false)?;
            return Ok(Statement::new(
                StmtKind::Labeled {
                    label,
                    body: Box::new(body),
                },
                self.span_from(start),
            ));
        }

        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::new(
            StmtKind::Expression { expression },
            self.span_from(start),
        ))
    }

    fn parse_block(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        self.expect(TokenKind::LBrace)?;

        let mut body = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement(false)?);
        }
        self.advance()?; // consume }

        Ok(Statement::new(StmtKind::Block { body }, self.span_from(start)))
    }

    /// Parse `let a = 1, b` without the trailing semicolon.
    fn parse_variable_declaration(&mut self) -> Result<StmtKind, ScriptError> {
        let kind = match self.word() {
            Some("var") => VariableKind::Var,
            Some("let") => VariableKind::Let,
            _ => VariableKind::Const,
        };
        self.advance()?;

        let mut declarations = Vec::new();
        loop {
            let start = self.current.span.start;
            let id = self.parse_binding_identifier()?;
            let init = if self.current.kind == TokenKind::Eq {
                self.advance()?;
                Some(self.parse_assignment()?)
            } else if kind == VariableKind::Const {
                return Err(self.error_at(self.prev_end, "Missing initializer in const declaration"));
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(start),
            });

            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }

        Ok(StmtKind::Variable { kind, declarations })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `function`
        let id = self.parse_binding_identifier()?;
        let (params, body) = self.parse_function_rest()?;
        Ok(Statement::new(
            StmtKind::Function {
                id,
                params,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    /// Parse `(params) { body }` shared by declarations, expressions and methods.
    fn parse_function_rest(&mut self) -> Result<(Vec<Pattern>, Statement), ScriptError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.current.kind != TokenKind::RParen {
            params.push(self.parse_param()?);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::RParen)?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;

        Ok((params, body?))
    }

    fn parse_param(&mut self) -> Result<Pattern, ScriptError> {
        let start = self.current.span.start;
        let left = self.parse_binding_identifier()?;
        if self.current.kind != TokenKind::Eq {
            return Ok(Pattern::Identifier(left));
        }
        self.advance()?;
        let right = self.parse_assignment()?;
        Ok(Pattern::Assignment(AssignmentPattern {
            left,
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_if(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `if`
        self.expect(TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement(false)?);

        let alternate = if self.is_word("else") {
            self.advance()?;
            Some(Box::new(self.parse_statement(false)?))
        } else {
            None
        };

        Ok(Statement::new(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            self.span_from(start),
        ))
    }

    fn parse_return(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        if self.function_depth == 0 {
            return Err(self.error_at(start, "'return' outside of function"));
        }
        self.advance()?; // consume `return`

        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::new(
            StmtKind::Return { argument },
            self.span_from(start),
        ))
    }

    fn parse_import(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `import`

        let mut specifiers = Vec::new();

        if self.current.kind != TokenKind::String {
            if self.current.kind == TokenKind::Identifier {
                let spec_start = self.current.span.start;
                let local = self.parse_binding_identifier()?;
                specifiers.push(ImportSpecifier::ImportDefaultSpecifier {
                    local,
                    span: self.span_from(spec_start),
                });
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                }
            }

            if self.current.kind == TokenKind::Star {
                let spec_start = self.current.span.start;
                self.advance()?;
                self.expect_word("as")?;
                let local = self.parse_binding_identifier()?;
                specifiers.push(ImportSpecifier::ImportNamespaceSpecifier {
                    local,
                    span: self.span_from(spec_start),
                });
            } else if self.current.kind == TokenKind::LBrace {
                self.advance()?;
                while self.current.kind != TokenKind::RBrace {
                    let spec_start = self.current.span.start;
                    let imported = self.parse_property_name()?;
                    let local = if self.is_word("as") {
                        self.advance()?;
                        self.parse_binding_identifier()?
                    } else {
                        if is_keyword(&imported.name) {
                            return Err(self.error_at(
                                imported.span.start,
                                format!("Unexpected keyword '{}'", imported.name),
                            ));
                        }
                        imported.clone()
                    };
                    specifiers.push(ImportSpecifier::ImportSpecifier {
                        imported,
                        local,
                        span: self.span_from(spec_start),
                    });
                    if self.current.kind != TokenKind::Comma {
                        break;
                    }
                    self.advance()?;
                }
                self.expect(TokenKind::RBrace)?;
            }

            self.expect_word("from")?;
        }

        let source = self.parse_module_source()?;
        self.consume_semicolon()?;

        Ok(Statement::new(
            StmtKind::Import { specifiers, source },
            self.span_from(start),
        ))
    }

    fn parse_export(&mut self) -> Result<Statement, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `export`

        if self.is_word("default") {
            self.advance()?;
            let declaration = self.parse_assignment()?;
            self.consume_semicolon()?;
            return Ok(Statement::new(
                StmtKind::ExportDefault { declaration },
                self.span_from(start),
            ));
        }

        if self.current.kind == TokenKind::LBrace {
            self.advance()?;
            let mut specifiers = Vec::new();
            while self.current.kind != TokenKind::RBrace {
                let spec_start = self.current.span.start;
                let local = self.parse_property_name()?;
                let exported = if self.is_word("as") {
                    self.advance()?;
                    self.parse_property_name()?
                } else {
                    local.clone()
                };
                specifiers.push(ExportSpecifier {
                    local,
                    exported,
                    span: self.span_from(spec_start),
                });
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
            self.expect(TokenKind::RBrace)?;

            let source = if self.is_word("from") {
                self.advance()?;
                Some(self.parse_module_source()?)
            } else {
                None
            };
            self.consume_semicolon()?;

            return Ok(Statement::new(
                StmtKind::ExportNamed {
                    declaration: None,
                    specifiers,
                    source,
                },
                self.span_from(start),
            ));
        }

        let declaration = if self.is_word("function") {
            self.parse_function_declaration()?
        } else if self.is_word("var") || self.is_word("let") || self.is_word("const") {
            let decl_start = self.current.span.start;
            let decl = self.parse_variable_declaration()?;
            let statement = Statement::new(decl, self.span_from(decl_start));
            self.consume_semicolon()?;
            statement
        } else {
            return Err(self.unexpected());
        };

        Ok(Statement::new(
            StmtKind::ExportNamed {
                declaration: Some(Box::new(declaration)),
                specifiers: Vec::new(),
                source: None,
            },
            self.span_from(start),
        ))
    }

    fn parse_module_source(&mut self) -> Result<String, ScriptError> {
        match (&self.current.kind, &self.current.value) {
            (TokenKind::String, TokenValue::String(value)) => {
                let value = value.clone();
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn consume_semicolon(&mut self) -> Result<(), ScriptError> {
        if self.current.kind == TokenKind::Semicolon {
            self.advance()?;
            return Ok(());
        }
        if self.at_statement_end() {
            return Ok(());
        }
        Err(self.unexpected())
    }

    /// A statement may end here without an explicit semicolon.
    fn at_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.current.newline_before
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Parse a full expression, including comma sequences.
    pub fn parse_expression(&mut self) -> Result<Expression, ScriptError> {
        let first = self.parse_assignment()?;
        if self.current.kind != TokenKind::Comma {
            return Ok(first);
        }

        let start = first.span.start;
        let mut expressions = vec![first];
        while self.current.kind == TokenKind::Comma {
            self.advance()?;
            expressions.push(self.parse_assignment()?);
        }

        Ok(Expression::new(
            ExprKind::Sequence { expressions },
            self.span_from(start),
        ))
    }

    fn parse_assignment(&mut self) -> Result<Expression, ScriptError> {
        // `x => x + 1`
        if self.current.kind == TokenKind::Identifier
            && !self.current_is_keyword()
            && self.peek_kind() == TokenKind::Arrow
        {
            let start = self.current.span.start;
            let param = self.parse_binding_identifier()?;
            return self.parse_arrow_body(start, vec![Pattern::Identifier(param)]);
        }

        let left = self.parse_conditional()?;

        let Some(operator) = self.assign_operator() else {
            return Ok(left);
        };
        self.check_assignable(&left)?;
        self.advance()?;
        let right = self.parse_assignment()?;

        let span = left.span.to(right.span);
        Ok(Expression::new(
            ExprKind::Assignment {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            },
            span,
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expression, ScriptError> {
        let test = self.parse_binary(1)?;
        if self.current.kind != TokenKind::Question {
            return Ok(test);
        }

        self.advance()?;
        let consequent = self.parse_assignment()?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;

        let span = test.span.to(alternate.span);
        Ok(Expression::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// Precedence climbing over binary and logical operators.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, ScriptError> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = self.infix_operator() {
            if prec < min_prec {
                break;
            }
            self.advance()?;

            // `**` is the only right-associative binary operator
            let next_min = if matches!(op, InfixOp::Binary(BinaryOp::Pow)) {
                prec
            } else {
                prec + 1
            };
            let right = self.parse_binary(next_min)?;

            let span = left.span.to(right.span);
            let kind = match op {
                InfixOp::Binary(operator) => ExprKind::Binary {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
                InfixOp::Logical(operator) => ExprKind::Logical {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
            };
            left = Expression::new(kind, span);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;

        let operator = match self.current.kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Identifier => match self.word() {
                Some("typeof") => Some(UnaryOp::Typeof),
                Some("void") => Some(UnaryOp::Void),
                Some("delete") => Some(UnaryOp::Delete),
                _ => None,
            },
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance()?;
            let argument = self.parse_unary()?;
            return Ok(Expression::new(
                ExprKind::Unary {
                    operator,
                    argument: Box::new(argument),
                },
                self.span_from(start),
            ));
        }

        if let Some(operator) = self.update_operator() {
            self.advance()?;
            let argument = self.parse_unary()?;
            self.check_assignable(&argument)?;
            return Ok(Expression::new(
                ExprKind::Update {
                    operator,
                    prefix: true,
                    argument: Box::new(argument),
                },
                self.span_from(start),
            ));
        }

        let expr = self.parse_call_member()?;

        // A line break before `++` ends the expression
        if let Some(operator) = self.update_operator() {
            if !self.current.newline_before {
                self.check_assignable(&expr)?;
                self.advance()?;
                return Ok(Expression::new(
                    ExprKind::Update {
                        operator,
                        prefix: false,
                        argument: Box::new(expr),
                    },
                    self.span_from(start),
                ));
            }
        }

        Ok(expr)
    }

    fn parse_call_member(&mut self) -> Result<Expression, ScriptError> {
        let expr = if self.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_subscripts(expr, true)
    }

    fn parse_new(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `new`

        let callee = if self.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let callee = self.parse_subscripts(callee, false)?;

        let arguments = if self.current.kind == TokenKind::LParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::new(
            ExprKind::New {
                callee: Box::new(callee),
                arguments,
            },
            self.span_from(start),
        ))
    }

    /// Member accesses and (optionally) calls following `expr`.
    fn parse_subscripts(
        &mut self,
        mut expr: Expression,
        allow_calls: bool,
    ) -> Result<Expression, ScriptError> {
        let start = expr.span.start;

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_property_name()?;
                    expr = self.member(expr, property.into_expression(), false, false, start);
                }
                TokenKind::OptionalChain => {
                    self.advance()?;
                    match self.current.kind {
                        TokenKind::LParen if allow_calls => {
                            let arguments = self.parse_arguments()?;
                            expr = Expression::new(
                                ExprKind::Call {
                                    callee: Box::new(expr),
                                    arguments,
                                    optional: true,
                                },
                                self.span_from(start),
                            );
                        }
                        TokenKind::LBracket => {
                            self.advance()?;
                            let property = self.parse_expression()?;
                            self.expect(TokenKind::RBracket)?;
                            expr = self.member(expr, property, true, true, start);
                        }
                        _ => {
                            let property = self.parse_property_name()?;
                            expr =
                                self.member(expr, property.into_expression(), false, true, start);
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let property = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = self.member(expr, property, true, false, start);
                }
                TokenKind::LParen if allow_calls => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            arguments,
                            optional: false,
                        },
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn member(
        &self,
        object: Expression,
        property: Expression,
        computed: bool,
        optional: bool,
        start: usize,
    ) -> Expression {
        Expression::new(
            ExprKind::Member {
                object: Box::new(object),
                property: Box::new(property),
                computed,
                optional,
            },
            self.span_from(start),
        )
    }

    /// Parse `(a, ...b)` call arguments.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ScriptError> {
        self.expect(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        while self.current.kind != TokenKind::RParen {
            arguments.push(self.parse_spread_or_assignment()?);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::RParen)?;
        Ok(arguments)
    }

    fn parse_spread_or_assignment(&mut self) -> Result<Expression, ScriptError> {
        if self.current.kind != TokenKind::Ellipsis {
            return self.parse_assignment();
        }
        let start = self.current.span.start;
        self.advance()?;
        let argument = self.parse_assignment()?;
        Ok(Expression::new(
            ExprKind::Spread {
                argument: Box::new(argument),
            },
            self.span_from(start),
        ))
    }

    fn parse_primary(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;

        match self.current.kind {
            TokenKind::Identifier => {
                let kind = match self.word() {
                    Some("this") => ExprKind::This,
                    Some("true") => self.literal(LiteralValue::Boolean(true)),
                    Some("false") => self.literal(LiteralValue::Boolean(false)),
                    Some("null") => self.literal(LiteralValue::Null),
                    Some("function") => return self.parse_function_expression(),
                    Some(word) if is_keyword(word) => {
                        return Err(self.error_at(start, format!("Unexpected keyword '{word}'")));
                    }
                    Some(word) => ExprKind::Identifier {
                        name: word.to_string(),
                    },
                    None => return Err(self.unexpected()),
                };
                self.advance()?;
                Ok(Expression::new(kind, self.span_from(start)))
            }
            TokenKind::Number => {
                let value = match self.current.value {
                    TokenValue::Number(n) => n,
                    _ => 0.0,
                };
                let kind = self.literal(LiteralValue::Number(value));
                self.advance()?;
                Ok(Expression::new(kind, self.span_from(start)))
            }
            TokenKind::String => {
                let value = match &self.current.value {
                    TokenValue::String(s) => s.clone(),
                    _ => String::new(),
                };
                let kind = self.literal(LiteralValue::String(value));
                self.advance()?;
                Ok(Expression::new(kind, self.span_from(start)))
            }
            TokenKind::Template | TokenKind::TemplateTail => self.parse_template(),
            TokenKind::LParen => self.parse_paren_or_arrow(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            _ => Err(self.unexpected()),
        }
    }

    fn literal(&self, value: LiteralValue) -> ExprKind {
        let span = self.current.span;
        ExprKind::Literal {
            value,
            raw: self.source[span.start..span.end].to_string(),
        }
    }

    fn parse_template(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        loop {
            let chunk = match &self.current.value {
                TokenValue::String(s) => s.clone(),
                _ => String::new(),
            };
            quasis.push(chunk);

            if self.current.kind == TokenKind::TemplateTail {
                self.advance()?;
                break;
            }

            self.advance()?; // past `${`
            expressions.push(self.parse_expression()?);
            if self.current.kind != TokenKind::RBrace {
                return Err(self.unexpected());
            }
            // The lexer sits right after `}`; resume the template there
            let next = self.lexer.next_template_chunk()?;
            self.prev_end = self.current.span.end;
            self.current = next;
        }

        Ok(Expression::new(
            ExprKind::TemplateLiteral {
                quasis,
                expressions,
            },
            self.span_from(start),
        ))
    }

    fn parse_paren_or_arrow(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume (

        if self.current.kind == TokenKind::RParen {
            self.advance()?;
            if self.current.kind != TokenKind::Arrow {
                return Err(self.unexpected());
            }
            return self.parse_arrow_body(start, Vec::new());
        }

        let expr = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        if self.current.kind == TokenKind::Arrow && !self.current.newline_before {
            let params = self.to_params(expr)?;
            return self.parse_arrow_body(start, params);
        }

        Ok(expr)
    }

    /// Reinterpret a parenthesized expression as an arrow parameter list.
    fn to_params(&self, expr: Expression) -> Result<Vec<Pattern>, ScriptError> {
        let items = match expr.kind {
            ExprKind::Sequence { expressions } => expressions,
            kind => vec![Expression::new(kind, expr.span)],
        };

        items
            .into_iter()
            .map(|item| match item.kind {
                ExprKind::Identifier { name } => Ok(Pattern::Identifier(Identifier {
                    name,
                    span: item.span,
                })),
                ExprKind::Assignment {
                    left,
                    operator: AssignOp::Assign,
                    right,
                } => match left.kind {
                    ExprKind::Identifier { name } => Ok(Pattern::Assignment(AssignmentPattern {
                        left: Identifier {
                            name,
                            span: left.span,
                        },
                        right,
                        span: item.span,
                    })),
                    _ => Err(self.error_at(left.span.start, "Assigning to rvalue")),
                },
                _ => Err(self.error_at(item.span.start, "Assigning to rvalue")),
            })
            .collect()
    }

    fn parse_arrow_body(
        &mut self,
        start: usize,
        params: Vec<Pattern>,
    ) -> Result<Expression, ScriptError> {
        self.expect(TokenKind::Arrow)?;

        let body = if self.current.kind == TokenKind::LBrace {
            self.function_depth += 1;
            let block = self.parse_block();
            self.function_depth -= 1;
            ArrowBody::Block(Box::new(block?))
        } else {
            ArrowBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok(Expression::new(
            ExprKind::Arrow { params, body },
            self.span_from(start),
        ))
    }

    fn parse_function_expression(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume `function`

        let id = if self.current.kind == TokenKind::Identifier {
            Some(self.parse_binding_identifier()?)
        } else {
            None
        };
        let (params, body) = self.parse_function_rest()?;

        Ok(Expression::new(
            ExprKind::Function {
                id,
                params,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_array(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume [

        let mut elements = Vec::new();
        while self.current.kind != TokenKind::RBracket {
            elements.push(self.parse_spread_or_assignment()?);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::RBracket)?;

        Ok(Expression::new(
            ExprKind::Array { elements },
            self.span_from(start),
        ))
    }

    fn parse_object(&mut self) -> Result<Expression, ScriptError> {
        let start = self.current.span.start;
        self.advance()?; // consume {

        let mut properties = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            properties.push(self.parse_property()?);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Expression::new(
            ExprKind::Object { properties },
            self.span_from(start),
        ))
    }

    fn parse_property(&mut self) -> Result<Property, ScriptError> {
        let start = self.current.span.start;

        if self.current.kind == TokenKind::Ellipsis {
            self.advance()?;
            let argument = self.parse_assignment()?;
            return Ok(Property::Spread {
                argument,
                span: self.span_from(start),
            });
        }

        let (key, computed) = match self.current.kind {
            TokenKind::LBracket => {
                self.advance()?;
                let key = self.parse_assignment()?;
                self.expect(TokenKind::RBracket)?;
                (key, true)
            }
            TokenKind::String | TokenKind::Number => (self.parse_primary()?, false),
            _ => (self.parse_property_name()?.into_expression(), false),
        };

        // `save() { ... }`
        if self.current.kind == TokenKind::LParen {
            let value_start = self.current.span.start;
            let (params, body) = self.parse_function_rest()?;
            let value = Expression::new(
                ExprKind::Function {
                    id: None,
                    params,
                    body: Box::new(body),
                },
                self.span_from(value_start),
            );
            return Ok(Property::Property {
                key,
                value,
                computed,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        if self.current.kind == TokenKind::Colon {
            self.advance()?;
            let value = self.parse_assignment()?;
            return Ok(Property::Property {
                key,
                value,
                computed,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        // `{ count }`
        let name = match &key.kind {
            ExprKind::Identifier { name } if !computed => name.clone(),
            _ => return Err(self.unexpected()),
        };
        if is_keyword(&name) {
            return Err(self.error_at(key.span.start, format!("Unexpected keyword '{name}'")));
        }
        Ok(Property::Property {
            value: key.clone(),
            key,
            computed: false,
            shorthand: true,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn infix_operator(&self) -> Option<(InfixOp, u8)> {
        use InfixOp::{Binary, Logical};

        let op = match self.current.kind {
            TokenKind::QuestionQuestion => (Logical(LogicalOp::NullishCoalescing), 1),
            TokenKind::Or => (Logical(LogicalOp::Or), 1),
            TokenKind::And => (Logical(LogicalOp::And), 2),
            TokenKind::Pipe => (Binary(BinaryOp::BitOr), 3),
            TokenKind::Caret => (Binary(BinaryOp::BitXor), 4),
            TokenKind::Amp => (Binary(BinaryOp::BitAnd), 5),
            TokenKind::EqEq => (Binary(BinaryOp::Eq), 6),
            TokenKind::NotEq => (Binary(BinaryOp::Neq), 6),
            TokenKind::StrictEq => (Binary(BinaryOp::StrictEq), 6),
            TokenKind::StrictNotEq => (Binary(BinaryOp::StrictNeq), 6),
            TokenKind::Lt => (Binary(BinaryOp::Lt), 7),
            TokenKind::Gt => (Binary(BinaryOp::Gt), 7),
            TokenKind::Lte => (Binary(BinaryOp::Lte), 7),
            TokenKind::Gte => (Binary(BinaryOp::Gte), 7),
            TokenKind::Identifier => match self.word() {
                Some("in") => (Binary(BinaryOp::In), 7),
                Some("instanceof") => (Binary(BinaryOp::Instanceof), 7),
                _ => return None,
            },
            TokenKind::Shl => (Binary(BinaryOp::Shl), 8),
            TokenKind::Shr => (Binary(BinaryOp::Shr), 8),
            TokenKind::UShr => (Binary(BinaryOp::UShr), 8),
            TokenKind::Plus => (Binary(BinaryOp::Add), 9),
            TokenKind::Minus => (Binary(BinaryOp::Sub), 9),
            TokenKind::Star => (Binary(BinaryOp::Mul), 10),
            TokenKind::Slash => (Binary(BinaryOp::Div), 10),
            TokenKind::Percent => (Binary(BinaryOp::Mod), 10),
            TokenKind::StarStar => (Binary(BinaryOp::Pow), 11),
            _ => return None,
        };
        Some(op)
    }

    fn assign_operator(&self) -> Option<AssignOp> {
        let op = match self.current.kind {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            TokenKind::PercentEq => AssignOp::ModAssign,
            TokenKind::StarStarEq => AssignOp::PowAssign,
            TokenKind::AndEq => AssignOp::AndAssign,
            TokenKind::OrEq => AssignOp::OrAssign,
            TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
            _ => return None,
        };
        Some(op)
    }

    fn update_operator(&self) -> Option<UpdateOp> {
        match self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn check_assignable(&self, target: &Expression) -> Result<(), ScriptError> {
        match target.kind {
            ExprKind::Identifier { .. } | ExprKind::Member { optional: false, .. } => Ok(()),
            _ => Err(self.error_at(target.span.start, "Assigning to rvalue")),
        }
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn advance(&mut self) -> Result<Token, ScriptError> {
        let next = self.lexer.next_token()?;
        let prev = std::mem::replace(&mut self.current, next);
        self.prev_end = prev.span.end;
        Ok(prev)
    }

    /// Kind of the token after the current one, without consuming anything.
    fn peek_kind(&self) -> TokenKind {
        self.lexer
            .clone()
            .next_token()
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ScriptError> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ScriptError> {
        if self.is_word(word) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn word(&self) -> Option<&str> {
        match &self.current.value {
            TokenValue::Identifier(name) => Some(name.as_str()),
            _ => None,
        }
    }

    fn is_word(&self, word: &str) -> bool {
        self.current.kind == TokenKind::Identifier && self.word() == Some(word)
    }

    fn current_is_keyword(&self) -> bool {
        self.word().is_some_and(is_keyword)
    }

    /// A name in binding position; keywords are rejected.
    fn parse_binding_identifier(&mut self) -> Result<Identifier, ScriptError> {
        match self.word() {
            Some(word) if is_keyword(word) => Err(self.error_at(
                self.current.span.start,
                format!("Unexpected keyword '{word}'"),
            )),
            Some(_) => self.parse_property_name(),
            None => Err(self.unexpected()),
        }
    }

    /// Any word, keywords included, e.g. after `.` in a member access.
    fn parse_property_name(&mut self) -> Result<Identifier, ScriptError> {
        let Some(name) = self.word().map(str::to_string) else {
            return Err(self.unexpected());
        };
        let token = self.advance()?;
        Ok(Identifier {
            name,
            span: token.span,
        })
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end)
    }

    fn unexpected(&self) -> ScriptError {
        self.error_at(self.current.span.start, "Unexpected token")
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> ScriptError {
        ScriptError::at(self.source, pos, message)
    }
}

impl Identifier {
    fn into_expression(self) -> Expression {
        Expression::new(ExprKind::Identifier { name: self.name }, self.span)
    }
}
