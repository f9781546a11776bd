//=============================================
// cexpand/parser.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Recursive descent parser for the macro expression language
// Objective: Transform token streams into chunks and expressions consumed by the interpreter
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use std::rc::Rc;

use thiserror::Error;

use crate::ast::{
    AssignTarget, BinaryOp, Chunk, Expr, FunctionBody, Literal, Stmt, TableItem, UnaryOp,
};
use crate::tokenizer::{LexError, Position, Token, TokenKind, Tokenizer};

//=============================================
//            Section 2: Parse Errors
//=============================================

/// Parser error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected} but found {found} at {position}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        position: Position,
    },
    #[error("unexpected end of input, expected {expected} at {position}")]
    UnexpectedEndOfInput { expected: String, position: Position },
    #[error("invalid syntax: {message} at {position}")]
    InvalidSyntax { message: String, position: Position },
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEndOfInput { position, .. }
            | ParseError::InvalidSyntax { position, .. } => *position,
            ParseError::Lex(err) => err.position(),
        }
    }
}

//=============================================
//            Section 3: Parser State
//=============================================

/// Recursive descent parser
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    loop_depth: usize,
}

/// Nested blocks and sub-expressions allowed along any path of the tree.
const MAX_NESTING_DEPTH: usize = 64;

/// Tokens that close a block.
const BLOCK_END: &[TokenKind] = &[TokenKind::End, TokenKind::Else, TokenKind::ElseIf];

/// Tokenize and parse a statement chunk whose first character sits at
/// `line`/`column` of its enclosing file.
pub fn parse_chunk_at(source: &str, line: usize, column: usize) -> Result<Chunk, ParseError> {
    let tokens = Tokenizer::with_origin(source, line, column).tokenize()?;
    Parser::new(tokens).parse_chunk()
}

/// Tokenize and parse a single expression located at `line`/`column`.
pub fn parse_expression_at(source: &str, line: usize, column: usize) -> Result<Expr, ParseError> {
    let tokens = Tokenizer::with_origin(source, line, column).tokenize()?;
    Parser::new(tokens).parse_expression_only()
}

impl Parser {
    //Function: new
    //Purpose: Initialize parser with token stream and reset cursor
    //Inputs: tokens: Vec<Token>
    //Returns: Self
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            depth: 0,
            loop_depth: 0,
        }
    }

    //=============================================
    //            Section 4: Entry Points
    //=============================================

    /// Parse statements until the end of input.
    pub fn parse_chunk(&mut self) -> Result<Chunk, ParseError> {
        let statements = self.parse_block(&[])?;
        if !self.is_at_end() {
            return Err(self.error_here("end of chunk"));
        }
        Ok(Chunk::new(statements))
    }

    /// Parse a single expression and ensure the stream is fully consumed.
    pub fn parse_expression_only(&mut self) -> Result<Expr, ParseError> {
        if self.is_at_end() {
            return Err(self.error_here("expression"));
        }
        let expression = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.error_here("end of expression"));
        }
        Ok(expression)
    }

    //=============================================
    //            Section 5: Statement Parsing
    //=============================================

    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, ParseError> {
        self.enter_nesting("block")?;
        let block = self.parse_statements(terminators);
        self.exit_nesting();
        block
    }

    fn parse_statements(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.match_kind(&TokenKind::Semicolon) {}
            if self.is_at_end() || terminators.iter().any(|kind| self.check(kind)) {
                break;
            }
            let statement = self.parse_statement()?;
            let is_return = matches!(statement, Stmt::Return { .. });
            statements.push(statement);
            if is_return {
                // `return` must be the last statement of its block.
                while self.match_kind(&TokenKind::Semicolon) {}
                break;
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let position = self.current_position();
        match &self.peek().kind {
            TokenKind::Local => {
                self.advance();
                if self.match_kind(&TokenKind::Function) {
                    let name = self.consume_identifier("function name")?;
                    let function = self.parse_function_body(Some(name.clone()), position)?;
                    return Ok(Stmt::LocalFunction { name, function });
                }
                let name = self.consume_identifier("variable name")?;
                let value = if self.match_kind(&TokenKind::Equal) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Stmt::Local {
                    name,
                    value,
                    position,
                })
            }
            TokenKind::Function => {
                self.advance();
                let mut path = vec![self.consume_identifier("function name")?];
                while self.match_kind(&TokenKind::Dot) {
                    path.push(self.consume_identifier("field name")?);
                }
                let function = self.parse_function_body(Some(path.join(".")), position)?;
                Ok(Stmt::FunctionDecl { path, function })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.is_at_end()
                    || self.check(&TokenKind::Semicolon)
                    || BLOCK_END.iter().any(|kind| self.check(kind))
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                Ok(Stmt::Return { value, position })
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression()?;
                self.consume(&TokenKind::Do, "'do'")?;
                let body = self.parse_loop_body()?;
                Ok(Stmt::While {
                    condition,
                    body,
                    position,
                })
            }
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(ParseError::InvalidSyntax {
                        message: "'break' outside a loop".into(),
                        position,
                    });
                }
                self.advance();
                Ok(Stmt::Break { position })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let position = self.current_position();
        self.advance();
        let mut branches = Vec::new();
        let mut else_branch = None;

        let condition = self.parse_expression()?;
        self.consume(&TokenKind::Then, "'then'")?;
        branches.push((condition, self.parse_block(BLOCK_END)?));

        loop {
            if self.match_kind(&TokenKind::ElseIf) {
                let condition = self.parse_expression()?;
                self.consume(&TokenKind::Then, "'then'")?;
                branches.push((condition, self.parse_block(BLOCK_END)?));
            } else if self.match_kind(&TokenKind::Else) {
                else_branch = Some(self.parse_block(&[TokenKind::End])?);
                self.consume(&TokenKind::End, "'end'")?;
                break;
            } else {
                self.consume(&TokenKind::End, "'end'")?;
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            else_branch,
            position,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let position = self.current_position();
        self.advance();
        let first = self.consume_identifier("loop variable")?;

        if self.match_kind(&TokenKind::Equal) {
            let start = self.parse_expression()?;
            self.consume(&TokenKind::Comma, "','")?;
            let end = self.parse_expression()?;
            let step = if self.match_kind(&TokenKind::Comma) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(&TokenKind::Do, "'do'")?;
            let body = self.parse_loop_body()?;
            return Ok(Stmt::NumericFor {
                variable: first,
                start,
                end,
                step,
                body,
                position,
            });
        }

        let (index, variable) = if self.match_kind(&TokenKind::Comma) {
            (Some(first), self.consume_identifier("loop variable")?)
        } else {
            (None, first)
        };
        self.consume(&TokenKind::In, "'in' or '='")?;
        let iterable = self.parse_expression()?;
        self.consume(&TokenKind::Do, "'do'")?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::ForIn {
            index,
            variable,
            iterable,
            body,
            position,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_block(&[TokenKind::End]);
        self.loop_depth -= 1;
        let body = body?;
        self.consume(&TokenKind::End, "'end'")?;
        Ok(body)
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let position = self.current_position();
        let expr = self.parse_suffixed()?;

        if self.match_kind(&TokenKind::Equal) {
            let target = match expr {
                Expr::Identifier { name, .. } => AssignTarget::Name(name),
                Expr::Index { object, key, .. } => AssignTarget::Index {
                    object: *object,
                    key: *key,
                },
                _ => {
                    return Err(ParseError::InvalidSyntax {
                        message: "invalid assignment target".into(),
                        position,
                    });
                }
            };
            let value = self.parse_expression()?;
            return Ok(Stmt::Assign {
                target,
                value,
                position,
            });
        }

        if !matches!(expr, Expr::Call { .. }) {
            return Err(ParseError::InvalidSyntax {
                message: "only function calls can be used as statements".into(),
                position,
            });
        }
        Ok(Stmt::Expression { expr })
    }

    fn parse_function_body(
        &mut self,
        name: Option<String>,
        position: Position,
    ) -> Result<FunctionBody, ParseError> {
        self.consume(&TokenKind::LeftParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.consume_identifier("parameter name")?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RightParen, "')'")?;
        // `break` cannot cross a function boundary.
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block(&[TokenKind::End]);
        self.loop_depth = enclosing_loops;
        let body = body?;
        self.consume(&TokenKind::End, "'end'")?;
        Ok(FunctionBody {
            name,
            params,
            body: Rc::new(body),
            position,
        })
    }

    //=============================================
    //            Section 6: Expression Parsing
    //=============================================

    fn enter_nesting(&mut self, what: &str) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::InvalidSyntax {
                message: format!("{} nesting too deep", what),
                position: self.current_position(),
            });
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn enter_expression(&mut self) -> Result<(), ParseError> {
        self.enter_nesting("expression")
    }

    fn exit_expression(&mut self) {
        self.exit_nesting();
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.enter_expression()?;
        let result = self.parse_logical_or();
        self.exit_expression();
        result
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_logical_and()?;
        while self.match_kind(&TokenKind::Or) {
            let right = self.parse_logical_and()?;
            let position = expr.position();
            expr = Expr::binary(expr, BinaryOp::Or, right, position);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_comparison()?;
        while self.match_kind(&TokenKind::And) {
            let right = self.parse_comparison()?;
            let position = expr.position();
            expr = Expr::binary(expr, BinaryOp::And, right, position);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_concat()?;
        while let Some(operator) = self.match_binary_op(&[
            (TokenKind::EqualEqual, BinaryOp::Equal),
            (TokenKind::NotEqual, BinaryOp::NotEqual),
            (TokenKind::Less, BinaryOp::Less),
            (TokenKind::LessEqual, BinaryOp::LessEqual),
            (TokenKind::Greater, BinaryOp::Greater),
            (TokenKind::GreaterEqual, BinaryOp::GreaterEqual),
        ]) {
            let right = self.parse_concat()?;
            let position = expr.position();
            expr = Expr::binary(expr, operator, right, position);
        }
        Ok(expr)
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_term()?;
        if self.match_kind(&TokenKind::Concat) {
            self.enter_expression()?;
            let right = self.parse_concat();
            self.exit_expression();
            let position = left.position();
            return Ok(Expr::binary(left, BinaryOp::Concat, right?, position));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_factor()?;
        while let Some(operator) = self.match_binary_op(&[
            (TokenKind::Plus, BinaryOp::Add),
            (TokenKind::Minus, BinaryOp::Subtract),
        ]) {
            let right = self.parse_factor()?;
            let position = expr.position();
            expr = Expr::binary(expr, operator, right, position);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;
        while let Some(operator) = self.match_binary_op(&[
            (TokenKind::Star, BinaryOp::Multiply),
            (TokenKind::Slash, BinaryOp::Divide),
            (TokenKind::DoubleSlash, BinaryOp::FloorDivide),
            (TokenKind::Percent, BinaryOp::Modulo),
        ]) {
            let right = self.parse_unary()?;
            let position = expr.position();
            expr = Expr::binary(expr, operator, right, position);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_position();
        let operator = match self.peek().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Hash => Some(UnaryOp::Length),
            _ => None,
        };
        let Some(operator) = operator else {
            return self.parse_power();
        };
        self.advance();
        self.enter_expression()?;
        let operand = self.parse_unary();
        self.exit_expression();
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand?),
            position,
        })
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_suffixed()?;
        if self.match_kind(&TokenKind::Caret) {
            // Right associative, and the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            let position = base.position();
            return Ok(Expr::binary(base, BinaryOp::Power, exponent, position));
        }
        Ok(base)
    }

    fn parse_suffixed(&mut self) -> Result<Expr, ParseError> {
        let (mut expr, suffixable) = self.parse_primary()?;
        if !suffixable {
            return Ok(expr);
        }

        loop {
            let position = self.current_position();
            match &self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.consume_identifier("field name")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        key: Box::new(Expr::literal(Literal::String(name), position)),
                        position,
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    self.consume(&TokenKind::RightBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        key: Box::new(key),
                        position,
                    };
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        position,
                    };
                }
                TokenKind::String(text) => {
                    let arg = Expr::literal(Literal::String(text.clone()), position);
                    self.advance();
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args: vec![arg],
                        position,
                    };
                }
                TokenKind::LeftBrace => {
                    let table = self.parse_table()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args: vec![table],
                        position,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RightParen, "')'")?;
        Ok(args)
    }

    /// Returns the primary expression and whether call/index suffixes may follow it.
    fn parse_primary(&mut self) -> Result<(Expr, bool), ParseError> {
        let position = self.current_position();
        let literal = match &self.peek().kind {
            TokenKind::Nil => Some(Literal::Nil),
            TokenKind::Boolean(flag) => Some(Literal::Boolean(*flag)),
            TokenKind::Integer(value) => Some(Literal::Integer(*value)),
            TokenKind::Float(value) => Some(Literal::Float(*value)),
            TokenKind::String(text) => Some(Literal::String(text.clone())),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok((Expr::literal(literal, position), false));
        }

        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok((Expr::identifier(name, position), true))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RightParen, "')'")?;
                Ok((expr, true))
            }
            TokenKind::Function => {
                self.advance();
                let function = self.parse_function_body(None, position)?;
                Ok((Expr::Function(function), false))
            }
            TokenKind::LeftBrace => Ok((self.parse_table()?, false)),
            _ => Err(self.error_here("expression")),
        }
    }

    fn parse_table(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_position();
        self.consume(&TokenKind::LeftBrace, "'{'")?;
        let mut items = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            let named = matches!(self.peek().kind, TokenKind::Identifier(_))
                && matches!(self.peek_next().kind, TokenKind::Equal);
            if named {
                let name = self.consume_identifier("field name")?;
                self.advance();
                items.push(TableItem::Named(name, self.parse_expression()?));
            } else {
                items.push(TableItem::Positional(self.parse_expression()?));
            }
            if !self.match_kind(&TokenKind::Comma) && !self.match_kind(&TokenKind::Semicolon) {
                break;
            }
        }

        self.consume(&TokenKind::RightBrace, "'}'")?;
        Ok(Expr::Table { items, position })
    }

    //=============================================
    //            Section 7: Token Helpers
    //=============================================

    fn peek(&self) -> &Token {
        let index = self.current.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn peek_next(&self) -> &Token {
        let index = (self.current + 1).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_binary_op(&mut self, table: &[(TokenKind, BinaryOp)]) -> Option<BinaryOp> {
        let operator = table
            .iter()
            .find(|(kind, _)| self.check(kind))
            .map(|(_, operator)| *operator)?;
        self.advance();
        Some(operator)
    }

    fn consume(&mut self, kind: &TokenKind, expected: &str) -> Result<Position, ParseError> {
        if self.check(kind) {
            let position = self.current_position();
            self.advance();
            Ok(position)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                position: token.position,
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.clone(),
                position: token.position,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn current_position(&self) -> Position {
        self.peek().position
    }
}

//=============================================
//            Section 8: Tests
//=============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Chunk {
        parse_chunk_at(source, 1, 1).unwrap()
    }

    fn expr(source: &str) -> Expr {
        parse_expression_at(source, 1, 1).unwrap()
    }

    #[test]
    fn test_precedence_multiplication_binds_tighter() {
        match expr("1 + 2 * 3") {
            Expr::Binary {
                operator: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Binary {
                    operator: BinaryOp::Multiply,
                    ..
                }
            )),
            other => panic!("expected addition, found {other:?}"),
        }
    }

    #[test]
    fn test_power_is_right_associative_and_beats_negation() {
        match expr("-2 ^ 3 ^ 2") {
            Expr::Unary {
                operator: UnaryOp::Negate,
                operand,
                ..
            } => match *operand {
                Expr::Binary {
                    operator: BinaryOp::Power,
                    right,
                    ..
                } => assert!(matches!(
                    *right,
                    Expr::Binary {
                        operator: BinaryOp::Power,
                        ..
                    }
                )),
                other => panic!("expected power, found {other:?}"),
            },
            other => panic!("expected negation, found {other:?}"),
        }
    }

    #[test]
    fn test_string_call_chains_into_paren_call() {
        // test_f1 "cos" (angles)  ==  test_f1("cos")(angles)
        match expr(r#"test_f1 "cos" (angles)"#) {
            Expr::Call { callee, args, .. } => {
                assert!(matches!(args.as_slice(), [Expr::Identifier { name, .. }] if name == "angles"));
                match *callee {
                    Expr::Call { args, .. } => assert!(matches!(
                        args.as_slice(),
                        [Expr::Literal { value: Literal::String(s), .. }] if s == "cos"
                    )),
                    other => panic!("expected inner call, found {other:?}"),
                }
            }
            other => panic!("expected call, found {other:?}"),
        }
    }

    #[test]
    fn test_angle_chunk() {
        let parsed = chunk(
            "local n = 8\n    angles = F.map(function(i) return i*pi/n end, F.range(-n, n))",
        );
        assert_eq!(parsed.statements.len(), 2);
        assert!(matches!(&parsed.statements[0], Stmt::Local { name, value: Some(_), .. } if name == "n"));
        match &parsed.statements[1] {
            Stmt::Assign {
                target: AssignTarget::Name(name),
                value: Expr::Call { args, .. },
                ..
            } => {
                assert_eq!(name, "angles");
                assert!(matches!(&args[0], Expr::Function(f) if f.params == vec!["i".to_string()]));
            }
            other => panic!("expected assignment, found {other:?}"),
        }
    }

    #[test]
    fn test_function_declarations_and_control_flow() {
        let parsed = chunk(
            r#"
            function lib.twice(x) return x * 2 end
            local function fact(n)
                if n <= 1 then return 1 else return n * fact(n - 1) end
            end
            for i = 1, 10, 2 do total = total + i end
            for i, v in xs do print(i, v) end
            while false do break end
            "#,
        );
        assert!(matches!(&parsed.statements[0], Stmt::FunctionDecl { path, .. } if path == &vec!["lib".to_string(), "twice".to_string()]));
        assert!(matches!(&parsed.statements[1], Stmt::LocalFunction { name, .. } if name == "fact"));
        assert!(matches!(&parsed.statements[2], Stmt::NumericFor { step: Some(_), .. }));
        assert!(matches!(&parsed.statements[3], Stmt::ForIn { index: Some(_), .. }));
        assert!(matches!(&parsed.statements[4], Stmt::While { .. }));
    }

    #[test]
    fn test_table_constructor() {
        match expr("{1, 2; x = 3}") {
            Expr::Table { items, .. } => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[2], TableItem::Named(name, _) if name == "x"));
            }
            other => panic!("expected table, found {other:?}"),
        }
    }

    #[test]
    fn test_expression_only_rejects_trailing_tokens() {
        let err = parse_expression_at("a b", 1, 1).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        let err = parse_expression_at("", 4, 2).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEndOfInput { .. }));
        assert_eq!(err.position().line, 4);
    }

    #[test]
    fn test_non_call_statement_is_rejected() {
        let err = parse_chunk_at("x + 1", 1, 1).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_return_must_end_block() {
        assert!(parse_chunk_at("return 1 x = 2", 1, 1).is_err());
        assert!(parse_chunk_at("return; ", 1, 1).is_ok());
    }

    #[test]
    fn test_break_only_inside_loops() {
        assert!(parse_chunk_at("while true do break end", 1, 1).is_ok());
        assert!(parse_chunk_at("for i = 1, 2 do if i then break end end", 1, 1).is_ok());
        assert!(parse_chunk_at("break", 1, 1).is_err());
        let err = parse_chunk_at("while true do local f = function() break end end", 1, 1)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let err = parse_expression_at(&source, 1, 1).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_block_depth_limit() {
        let source = format!(
            "local x = 0 {} x = 1 {}",
            "if true then ".repeat(20_000),
            "end ".repeat(20_000)
        );
        let err = parse_chunk_at(&source, 1, 1).unwrap_err();
        match err {
            ParseError::InvalidSyntax { message, .. } => assert_eq!(message, "block nesting too deep"),
            other => panic!("unexpected error {other:?}"),
        }

        let nested_loops = format!("{}x = 1{}", "while true do ".repeat(30), " end".repeat(30));
        assert!(parse_chunk_at(&nested_loops, 1, 1).is_ok());
    }
}

//=============================================
// End of file
//=============================================
