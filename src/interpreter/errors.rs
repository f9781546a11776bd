//=============================================
// cexpand/interpreter/errors.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Stable error codes for script failures
// Objective: Map parse and runtime failures onto E001..E005
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::fmt;

use super::RuntimeError;
use crate::parser::ParseError;
use crate::tokenizer::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    UndefinedName,
    TypeMismatch,
    InvalidOperation,
    RuntimeFailure,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::UndefinedName => "E002",
            ErrorCode::TypeMismatch => "E003",
            ErrorCode::InvalidOperation => "E004",
            ErrorCode::RuntimeFailure => "E005",
        }
    }
}

/// Error surfaced to embedders: a stable code, a message and, when known,
/// the source position the failure was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
    pub position: Option<Position>,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: Option<Position>) -> Self {
        if self.position.is_none() {
            self.position = position;
        }
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code_str(), self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<ParseError> for ScriptError {
    fn from(value: ParseError) -> Self {
        let position = value.position();
        ScriptError::new(ErrorCode::Syntax, value.to_string()).at(Some(position))
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(value: RuntimeError) -> Self {
        ScriptError::new(runtime_error_code(&value), value.to_string())
    }
}

pub fn runtime_error_code(error: &RuntimeError) -> ErrorCode {
    match error {
        RuntimeError::VariableNotFound(_) => ErrorCode::UndefinedName,
        RuntimeError::TypeError(_) => ErrorCode::TypeMismatch,
        RuntimeError::ArgumentError(_)
        | RuntimeError::IndexError(_)
        | RuntimeError::DivisionByZero => ErrorCode::InvalidOperation,
        RuntimeError::StackOverflow(_)
        | RuntimeError::Custom(_)
        | RuntimeError::AssertionFailed(_) => ErrorCode::RuntimeFailure,
    }
}
