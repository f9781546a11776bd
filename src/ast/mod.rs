//=============================================
// cexpand/ast.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Syntax tree for the macro expression language
// Objective: Shared node definitions between parser and interpreter
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::rc::Rc;

pub use crate::tokenizer::Position;

//=============================================
//            Section 1: Operators & Literals
//=============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::FloorDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
            BinaryOp::Concat => "..",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "~=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Length,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

//=============================================
//            Section 2: Expressions
//=============================================

/// Function literal shared by `function(...) ... end` expressions and
/// declarations. The body is reference counted so closures can hold it
/// without cloning statements.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    Positional(Expr),
    Named(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        position: Position,
    },
    Identifier {
        name: String,
        position: Position,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        position: Position,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        position: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        position: Position,
    },
    /// `object[key]`, also used for `object.name` with a string key.
    Index {
        object: Box<Expr>,
        key: Box<Expr>,
        position: Position,
    },
    Function(FunctionBody),
    Table {
        items: Vec<TableItem>,
        position: Position,
    },
}

impl Expr {
    pub fn literal(value: Literal, position: Position) -> Self {
        Expr::Literal { value, position }
    }

    pub fn identifier(name: impl Into<String>, position: Position) -> Self {
        Expr::Identifier {
            name: name.into(),
            position,
        }
    }

    pub fn binary(left: Expr, operator: BinaryOp, right: Expr, position: Position) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            position,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Expr::Literal { position, .. }
            | Expr::Identifier { position, .. }
            | Expr::Binary { position, .. }
            | Expr::Unary { position, .. }
            | Expr::Call { position, .. }
            | Expr::Index { position, .. }
            | Expr::Table { position, .. } => *position,
            Expr::Function(function) => function.position,
        }
    }
}

//=============================================
//            Section 3: Statements
//=============================================

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Index { object: Expr, key: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Local {
        name: String,
        value: Option<Expr>,
        position: Position,
    },
    LocalFunction {
        name: String,
        function: FunctionBody,
    },
    /// `function a.b.c(...)`; a single-element path is a plain global.
    FunctionDecl {
        path: Vec<String>,
        function: FunctionBody,
    },
    Assign {
        target: AssignTarget,
        value: Expr,
        position: Position,
    },
    Return {
        value: Option<Expr>,
        position: Position,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
        position: Position,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        position: Position,
    },
    NumericFor {
        variable: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        position: Position,
    },
    ForIn {
        index: Option<String>,
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
        position: Position,
    },
    Break {
        position: Position,
    },
    Expression {
        expr: Expr,
    },
}

/// Statements of a `:(...)` block or a library file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    pub statements: Vec<Stmt>,
}

impl Chunk {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_creation() {
        let pos = Position::new(1, 1, 0);
        let literal = Expr::literal(Literal::Integer(42), pos);
        assert!(matches!(
            literal,
            Expr::Literal {
                value: Literal::Integer(42),
                ..
            }
        ));
        let identifier = Expr::identifier("x", pos);
        assert!(matches!(identifier, Expr::Identifier { ref name, .. } if name == "x"));
    }

    #[test]
    fn test_binary_expr_position() {
        let left = Expr::identifier("i", Position::new(2, 5, 10));
        let right = Expr::identifier("pi", Position::new(2, 7, 12));
        let binary = Expr::binary(left, BinaryOp::Multiply, right, Position::new(2, 5, 10));
        assert_eq!(binary.position(), Position::new(2, 5, 10));
        assert_eq!(BinaryOp::Multiply.symbol(), "*");
    }
}

//=============================================
// End of file
//=============================================
