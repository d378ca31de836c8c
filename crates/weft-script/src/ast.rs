//! Syntax tree for Weft script code.
//!
//! Expression and statement nodes follow the ESTree shape so the serialized
//! tree reads like any other JavaScript AST: every node serializes with a
//! `type` discriminator plus flat `start`/`end` byte offsets.

use serde::Serialize;

/// A half-open byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A complete expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(flatten)]
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ExprKind {
    /// `count`, `isActive`
    Identifier { name: String },

    /// `42`, `"hello"`, `true`, `null`
    Literal { value: LiteralValue, raw: String },

    /// `` `Hello ${name}` ``
    TemplateLiteral {
        quasis: Vec<String>,
        expressions: Vec<Expression>,
    },

    #[serde(rename = "ThisExpression")]
    This,

    #[serde(rename = "ArrayExpression")]
    Array { elements: Vec<Expression> },

    #[serde(rename = "ObjectExpression")]
    Object { properties: Vec<Property> },

    /// `...items` inside arrays, calls and objects.
    #[serde(rename = "SpreadElement")]
    Spread { argument: Box<Expression> },

    /// `(x) => x + 1`, `() => { save(); }`
    #[serde(rename = "ArrowFunctionExpression")]
    Arrow {
        params: Vec<Pattern>,
        body: ArrowBody,
    },

    /// `function (x) { return x; }`
    #[serde(rename = "FunctionExpression")]
    Function {
        id: Option<Identifier>,
        params: Vec<Pattern>,
        body: Box<Statement>,
    },

    /// `!active`, `-count`, `typeof x`
    #[serde(rename = "UnaryExpression")]
    Unary {
        operator: UnaryOp,
        argument: Box<Expression>,
    },

    /// `count++`, `--count`
    #[serde(rename = "UpdateExpression")]
    Update {
        operator: UpdateOp,
        prefix: bool,
        argument: Box<Expression>,
    },

    /// `a + b`, `count > 0`
    #[serde(rename = "BinaryExpression")]
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
    },

    /// `a && b`, `a ?? b`
    #[serde(rename = "LogicalExpression")]
    Logical {
        left: Box<Expression>,
        operator: LogicalOp,
        right: Box<Expression>,
    },

    /// `count > 0 ? 'yes' : 'no'`
    #[serde(rename = "ConditionalExpression")]
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },

    /// `count = 5`, `count += 1`
    #[serde(rename = "AssignmentExpression")]
    Assignment {
        left: Box<Expression>,
        operator: AssignOp,
        right: Box<Expression>,
    },

    /// `user.name`, `items[0]`, `user?.name`
    #[serde(rename = "MemberExpression")]
    Member {
        object: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
        optional: bool,
    },

    /// `save()`, `items.push(item)`
    #[serde(rename = "CallExpression")]
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        optional: bool,
    },

    /// `new Date()`
    #[serde(rename = "NewExpression")]
    New {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `a, b`
    #[serde(rename = "SequenceExpression")]
    Sequence { expressions: Vec<Expression> },
}

/// Value of a literal expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

/// Body of an arrow function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrowBody {
    Expression(Box<Expression>),
    Block(Box<Statement>),
}

/// An object literal member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Property {
    Property {
        key: Expression,
        value: Expression,
        computed: bool,
        shorthand: bool,
        #[serde(flatten)]
        span: Span,
    },
    #[serde(rename = "SpreadElement")]
    Spread {
        argument: Expression,
        #[serde(flatten)]
        span: Span,
    },
}

/// A plain identifier that is not an expression, e.g. a declaration name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Identifier {
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
}

/// A binding target for parameters and declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Assignment(AssignmentPattern),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(id) => id.span,
            Pattern::Assignment(pattern) => pattern.span,
        }
    }
}

/// `x = 1` in a parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentPattern {
    pub left: Identifier,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNeq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    UShr,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    NullishCoalescing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    PowAssign,
    #[serde(rename = "&&=")]
    AndAssign,
    #[serde(rename = "||=")]
    OrAssign,
    #[serde(rename = "??=")]
    NullishAssign,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A parsed `<script>` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Program {
    pub body: Vec<Statement>,
    #[serde(rename = "sourceType")]
    pub source_type: &'static str,
    #[serde(flatten)]
    pub span: Span,
}

/// A complete statement node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(flatten)]
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StmtKind {
    #[serde(rename = "ExpressionStatement")]
    Expression { expression: Expression },

    #[serde(rename = "VariableDeclaration")]
    Variable {
        kind: VariableKind,
        declarations: Vec<VariableDeclarator>,
    },

    #[serde(rename = "FunctionDeclaration")]
    Function {
        id: Identifier,
        params: Vec<Pattern>,
        body: Box<Statement>,
    },

    #[serde(rename = "ReturnStatement")]
    Return { argument: Option<Expression> },

    #[serde(rename = "IfStatement")]
    If {
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },

    #[serde(rename = "BlockStatement")]
    Block { body: Vec<Statement> },

    /// `$: doubled = count * 2`
    #[serde(rename = "LabeledStatement")]
    Labeled {
        label: Identifier,
        body: Box<Statement>,
    },

    #[serde(rename = "EmptyStatement")]
    Empty,

    #[serde(rename = "ImportDeclaration")]
    Import {
        specifiers: Vec<ImportSpecifier>,
        source: String,
    },

    #[serde(rename = "ExportNamedDeclaration")]
    ExportNamed {
        declaration: Option<Box<Statement>>,
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
    },

    #[serde(rename = "ExportDefaultDeclaration")]
    ExportDefault { declaration: Expression },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

/// One binding introduced by an `import` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ImportSpecifier {
    /// `import a from 'x'`
    ImportDefaultSpecifier {
        local: Identifier,
        #[serde(flatten)]
        span: Span,
    },
    /// `import * as ns from 'x'`
    ImportNamespaceSpecifier {
        local: Identifier,
        #[serde(flatten)]
        span: Span,
    },
    /// `import { a as b } from 'x'`
    ImportSpecifier {
        imported: Identifier,
        local: Identifier,
        #[serde(flatten)]
        span: Span,
    },
}

/// `a as b` inside `export { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportSpecifier {
    pub local: Identifier,
    pub exported: Identifier,
    #[serde(flatten)]
    pub span: Span,
}
