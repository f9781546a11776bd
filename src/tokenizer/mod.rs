//=============================================
// cexpand/tokenizer.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Lexer for the macro expression language
// Objective: Turn macro bodies into positioned tokens for the parser
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

//=============================================
//            Section 2: Positions & Tokens
//=============================================

/// Represents the position of a token in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// All token kinds of the macro language
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Nil,

    Identifier(String),

    // Keywords
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    For,
    Function,
    If,
    In,
    Local,
    Not,
    Or,
    Return,
    Then,
    While,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Caret,
    Hash,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Concat,
    Dot,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Boolean(b) => write!(f, "{}", b),
            TokenKind::Nil => write!(f, "nil"),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Eof => write!(f, "end of input"),
            other => match symbol_text(other) {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

fn symbol_text(kind: &TokenKind) -> Option<&'static str> {
    let text = match kind {
        TokenKind::And => "and",
        TokenKind::Break => "break",
        TokenKind::Do => "do",
        TokenKind::Else => "else",
        TokenKind::ElseIf => "elseif",
        TokenKind::End => "end",
        TokenKind::For => "for",
        TokenKind::Function => "function",
        TokenKind::If => "if",
        TokenKind::In => "in",
        TokenKind::Local => "local",
        TokenKind::Not => "not",
        TokenKind::Or => "or",
        TokenKind::Return => "return",
        TokenKind::Then => "then",
        TokenKind::While => "while",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::DoubleSlash => "//",
        TokenKind::Percent => "%",
        TokenKind::Caret => "^",
        TokenKind::Hash => "#",
        TokenKind::Equal => "=",
        TokenKind::EqualEqual => "==",
        TokenKind::NotEqual => "~=",
        TokenKind::Less => "<",
        TokenKind::LessEqual => "<=",
        TokenKind::Greater => ">",
        TokenKind::GreaterEqual => ">=",
        TokenKind::Concat => "..",
        TokenKind::Dot => ".",
        TokenKind::LeftParen => "(",
        TokenKind::RightParen => ")",
        TokenKind::LeftBrace => "{",
        TokenKind::RightBrace => "}",
        TokenKind::LeftBracket => "[",
        TokenKind::RightBracket => "]",
        TokenKind::Comma => ",",
        TokenKind::Semicolon => ";",
        _ => return None,
    };
    Some(text)
}

/// A token with its kind and position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

//=============================================
//            Section 3: Lexer Errors
//=============================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{found}' at {position}")]
    UnexpectedCharacter { found: char, position: Position },
    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },
    #[error("unknown escape '\\{found}' at {position}")]
    InvalidEscape { found: char, position: Position },
    #[error("malformed number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

//=============================================
//            Section 4: Tokenizer
//=============================================

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("and", TokenKind::And),
        ("break", TokenKind::Break),
        ("do", TokenKind::Do),
        ("else", TokenKind::Else),
        ("elseif", TokenKind::ElseIf),
        ("end", TokenKind::End),
        ("false", TokenKind::Boolean(false)),
        ("for", TokenKind::For),
        ("function", TokenKind::Function),
        ("if", TokenKind::If),
        ("in", TokenKind::In),
        ("local", TokenKind::Local),
        ("nil", TokenKind::Nil),
        ("not", TokenKind::Not),
        ("or", TokenKind::Or),
        ("return", TokenKind::Return),
        ("then", TokenKind::Then),
        ("true", TokenKind::Boolean(true)),
        ("while", TokenKind::While),
    ])
});

/// Tokenizer for macro bodies
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self::with_origin(input, 1, 1)
    }

    /// Start counting lines and columns at `line`/`column`, so that tokens of a
    /// macro body carry their position inside the enclosing template.
    pub fn with_origin(input: &str, line: usize, column: usize) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line,
            column,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }

            let ch = self.current_char();
            if ch == '"' || ch == '\'' {
                self.handle_string(ch)?;
            } else if ch.is_ascii_digit()
                || (ch == '.' && self.peek_char().is_some_and(|c| c.is_ascii_digit()))
            {
                self.handle_number()?;
            } else if ch.is_alphabetic() || ch == '_' {
                self.handle_identifier();
            } else {
                self.handle_operator_or_delimiter()?;
            }
        }

        let end = self.current_position();
        self.tokens.push(Token::new(TokenKind::Eof, end));
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.is_at_end() && self.current_char().is_whitespace() {
                self.advance();
            }
            if self.current_char() == '-' && self.peek_char() == Some('-') {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn handle_string(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.current_position();
        self.advance();
        let mut value = String::new();

        loop {
            if self.is_at_end() || self.current_char() == '\n' {
                return Err(LexError::UnterminatedString { position: start });
            }
            let ch = self.advance();
            if ch == quote {
                break;
            }
            if ch == '\\' {
                let escape_pos = self.current_position();
                if self.is_at_end() {
                    return Err(LexError::UnterminatedString { position: start });
                }
                let escaped = self.advance();
                let resolved = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    other => {
                        return Err(LexError::InvalidEscape {
                            found: other,
                            position: escape_pos,
                        });
                    }
                };
                value.push(resolved);
            } else {
                value.push(ch);
            }
        }

        self.tokens.push(Token::new(TokenKind::String(value), start));
        Ok(())
    }

    fn handle_number(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let mut text = String::new();
        let mut is_float = false;

        while self.current_char().is_ascii_digit() {
            text.push(self.advance());
        }
        // `1..2` is a concatenation, not a fraction.
        if self.current_char() == '.' && self.peek_char() != Some('.') {
            is_float = true;
            text.push(self.advance());
            while self.current_char().is_ascii_digit() {
                text.push(self.advance());
            }
        }
        if matches!(self.current_char(), 'e' | 'E') {
            is_float = true;
            text.push(self.advance());
            if matches!(self.current_char(), '+' | '-') {
                text.push(self.advance());
            }
            if !self.current_char().is_ascii_digit() {
                return Err(LexError::InvalidNumber {
                    text,
                    position: start,
                });
            }
            while self.current_char().is_ascii_digit() {
                text.push(self.advance());
            }
        }
        if self.current_char().is_alphabetic() || self.current_char() == '_' {
            text.push(self.current_char());
            return Err(LexError::InvalidNumber {
                text,
                position: start,
            });
        }

        let kind = if is_float {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            // Integer literals too large for i64 degrade to floats.
            text.parse::<i64>()
                .map(TokenKind::Integer)
                .or_else(|_| text.parse::<f64>().map(TokenKind::Float))
                .ok()
        };
        match kind {
            Some(kind) => {
                self.tokens.push(Token::new(kind, start));
                Ok(())
            }
            None => Err(LexError::InvalidNumber {
                text,
                position: start,
            }),
        }
    }

    fn handle_identifier(&mut self) {
        let start = self.current_position();
        let mut name = String::new();
        while self.current_char().is_alphanumeric() || self.current_char() == '_' {
            name.push(self.advance());
        }
        let kind = KEYWORDS
            .get(name.as_str())
            .cloned()
            .unwrap_or(TokenKind::Identifier(name));
        self.tokens.push(Token::new(kind, start));
    }

    fn handle_operator_or_delimiter(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let ch = self.advance();
        let next = self.current_char();

        let kind = match (ch, next) {
            ('/', '/') => self.two_char(TokenKind::DoubleSlash),
            ('=', '=') => self.two_char(TokenKind::EqualEqual),
            ('~', '=') => self.two_char(TokenKind::NotEqual),
            ('<', '=') => self.two_char(TokenKind::LessEqual),
            ('>', '=') => self.two_char(TokenKind::GreaterEqual),
            ('.', '.') => self.two_char(TokenKind::Concat),
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('/', _) => TokenKind::Slash,
            ('%', _) => TokenKind::Percent,
            ('^', _) => TokenKind::Caret,
            ('#', _) => TokenKind::Hash,
            ('=', _) => TokenKind::Equal,
            ('<', _) => TokenKind::Less,
            ('>', _) => TokenKind::Greater,
            ('.', _) => TokenKind::Dot,
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            (other, _) => {
                return Err(LexError::UnexpectedCharacter {
                    found: other,
                    position: start,
                });
            }
        };

        self.tokens.push(Token::new(kind, start));
        Ok(())
    }

    fn two_char(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }
}

/// Convenience wrapper used by the parser entry points.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).tokenize()
}

//=============================================
//            Section 5: Tests
//=============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokenization() {
        let expected_kinds = vec![
            TokenKind::Local,
            TokenKind::Identifier("n".to_string()),
            TokenKind::Equal,
            TokenKind::Integer(8),
            TokenKind::Identifier("angles".to_string()),
            TokenKind::Equal,
            TokenKind::Identifier("i".to_string()),
            TokenKind::Star,
            TokenKind::Identifier("pi".to_string()),
            TokenKind::Slash,
            TokenKind::Identifier("n".to_string()),
            TokenKind::Eof,
        ];
        assert_eq!(kinds("local n = 8\nangles = i*pi/n"), expected_kinds);
    }

    #[test]
    fn test_numbers_with_exponents() {
        assert_eq!(
            kinds("1e-4 2.5 .5 3E2 10"),
            vec![
                TokenKind::Float(1e-4),
                TokenKind::Float(2.5),
                TokenKind::Float(0.5),
                TokenKind::Float(300.0),
                TokenKind::Integer(10),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_concat_after_integer() {
        assert_eq!(
            kinds("1..2"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Concat,
                TokenKind::Integer(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#""cos" 'a\tb' "q\"" "#),
            vec![
                TokenKind::String("cos".into()),
                TokenKind::String("a\tb".into()),
                TokenKind::String("q\"".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("x -- trailing (comment\n~= y"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::NotEqual,
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_origin_offsets_positions() {
        let tokens = Tokenizer::with_origin("a\n  b", 8, 3).tokenize().unwrap();
        assert_eq!(tokens[0].position.line, 8);
        assert_eq!(tokens[0].position.column, 3);
        assert_eq!(tokens[1].position.line, 9);
        assert_eq!(tokens[1].position.column, 3);
    }

    #[test]
    fn test_errors_carry_positions() {
        let err = tokenize("x = \"open").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
        assert_eq!(err.position().column, 5);

        let err = tokenize("a @ b").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                found: '@',
                position: Position::new(1, 3, 2),
            }
        );

        assert!(matches!(
            tokenize("12abc").unwrap_err(),
            LexError::InvalidNumber { .. }
        ));
    }
}

//=============================================
// End of file
//=============================================
