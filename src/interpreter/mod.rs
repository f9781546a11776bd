//=============================================
// cexpand/interpreter.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Tree-walking evaluator for the macro expression language
// Objective: Execute chunks and expressions against a shared global scope
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

mod errors;
mod value;

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::ast::{
    AssignTarget, BinaryOp, Chunk, Expr, FunctionBody, Literal, Stmt, TableItem, UnaryOp,
};
use crate::parser::{parse_chunk_at, parse_expression_at};
use crate::stdlib;
use crate::tokenizer::Position;

pub use errors::{ErrorCode, ScriptError, runtime_error_code};
pub use value::{
    Closure, List, NativeArity, NativeFn, NativeFunction, Scope, Table, Value, format_float,
};

//=============================================
//            Section 2: Runtime Errors
//=============================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    VariableNotFound(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("argument error: {0}")]
    ArgumentError(String),
    #[error("index error: {0}")]
    IndexError(String),
    #[error("attempt to perform integer division by zero")]
    DivisionByZero,
    #[error("stack overflow at call depth {0}")]
    StackOverflow(usize),
    #[error("{0}")]
    Custom(String),
    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

//=============================================
//            Section 3: Interpreter State
//=============================================

/// Names of the files taking part in the current expansion, exposed to
/// templates through `input_files()` and `output_file()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionContext {
    pub input_files: Vec<String>,
    pub output_file: Option<String>,
}

enum Flow {
    Normal,
    Break,
    Return(Value),
}

enum LoopControl {
    Continue,
    Exit(Flow),
}

/// Script calls allowed before a stack overflow is reported.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 48;

/// Native stack the evaluator may use below its entry point. Keeps deep
/// recursion an error on 2 MiB threads whatever the call depth limit.
const STACK_BUDGET: usize = 1536 * 1024;

pub struct Interpreter {
    globals: Rc<Scope>,
    context: ExpansionContext,
    call_depth: usize,
    max_call_depth: usize,
    stack_base: Option<usize>,
    last_position: Option<Position>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Bare interpreter without any builtins.
    pub fn new() -> Self {
        Self {
            globals: Scope::root(),
            context: ExpansionContext::default(),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            stack_base: None,
            last_position: None,
        }
    }

    /// Interpreter with the standard library and prelude installed.
    pub fn with_std() -> Result<Self, ScriptError> {
        let mut interpreter = Self::new();
        stdlib::install(&mut interpreter)?;
        Ok(interpreter)
    }

    pub fn context(&self) -> &ExpansionContext {
        &self.context
    }

    pub fn set_context(&mut self, context: ExpansionContext) {
        self.context = context;
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    pub fn globals(&self) -> &Rc<Scope> {
        &self.globals
    }

    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.declare(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.lookup(name)
    }

    //=============================================
    //            Section 4: Entry Points
    //=============================================

    /// Execute a chunk in a fresh scope below the globals. Returns the value
    /// of a top-level `return`, if any.
    pub fn run_chunk(&mut self, chunk: &Chunk) -> Result<Option<Value>, ScriptError> {
        self.reset();
        let scope = Scope::child(&self.globals);
        let result = self.exec_block(&chunk.statements, &scope);
        self.stack_base = None;
        match result {
            Ok(Flow::Return(value)) => Ok(Some(value)),
            Ok(Flow::Normal | Flow::Break) => Ok(None),
            Err(err) => Err(ScriptError::from(err).at(self.last_position)),
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        self.reset();
        let scope = Scope::child(&self.globals);
        let result = self.eval_expr(expr, &scope);
        self.stack_base = None;
        result.map_err(|err| ScriptError::from(err).at(self.last_position))
    }

    /// Parse and run statements; `line`/`column` locate the source in its file.
    pub fn run_source(
        &mut self,
        source: &str,
        line: usize,
        column: usize,
    ) -> Result<Option<Value>, ScriptError> {
        let chunk = parse_chunk_at(source, line, column)?;
        trace!(statements = chunk.statements.len(), "running chunk");
        self.run_chunk(&chunk)
    }

    pub fn eval_source(
        &mut self,
        source: &str,
        line: usize,
        column: usize,
    ) -> Result<Value, ScriptError> {
        let expr = parse_expression_at(source, line, column)?;
        self.evaluate(&expr)
    }

    /// Invoke a closure or builtin. Used by higher-order builtins such as `F.map`.
    pub fn call_value(&mut self, func: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if self.stack_base.is_some() {
            return self.dispatch_call(func, args);
        }
        // Called from outside an evaluation: this frame is the entry point.
        self.stack_base = Some(stack_address());
        let result = self.dispatch_call(func, args);
        self.stack_base = None;
        result
    }

    fn dispatch_call(&mut self, func: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow(self.call_depth));
        }
        self.check_stack()?;

        match func {
            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(RuntimeError::ArgumentError(format!(
                        "function '{}' expects {}, got {}",
                        native.name,
                        native.arity.describe(),
                        args.len()
                    )));
                }
                self.call_depth += 1;
                let result = (native.func)(self, &args);
                self.call_depth -= 1;
                result
            }
            Value::Function(closure) => {
                if args.len() != closure.params.len() {
                    return Err(RuntimeError::ArgumentError(format!(
                        "function '{}' expects {} arguments, got {}",
                        closure.name.as_deref().unwrap_or("anonymous"),
                        closure.params.len(),
                        args.len()
                    )));
                }
                let scope = Scope::child(&closure.scope);
                for (param, arg) in closure.params.iter().zip(args) {
                    scope.declare(param.clone(), arg);
                }
                self.call_depth += 1;
                let result = self.exec_block(&closure.body, &scope);
                self.call_depth -= 1;
                match result? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal | Flow::Break => Ok(Value::Nil),
                }
            }
            other => Err(RuntimeError::TypeError(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    fn reset(&mut self) {
        self.call_depth = 0;
        self.stack_base = Some(stack_address());
        self.last_position = None;
    }

    fn check_stack(&self) -> Result<(), RuntimeError> {
        match self.stack_base {
            Some(base) if base.abs_diff(stack_address()) > STACK_BUDGET => {
                Err(RuntimeError::StackOverflow(self.call_depth))
            }
            _ => Ok(()),
        }
    }

    //=============================================
    //            Section 5: Statements
    //=============================================

    fn exec_block(&mut self, statements: &[Stmt], scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        for statement in statements {
            match self.exec_stmt(statement, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, statement: &Stmt, scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        match statement {
            Stmt::Local { name, value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Nil,
                };
                scope.declare(name.clone(), value);
            }
            Stmt::LocalFunction { name, function } => {
                // Declared first so the body can refer to itself.
                scope.declare(name.clone(), Value::Nil);
                let closure = make_closure(function, scope);
                scope.declare(name.clone(), closure);
            }
            Stmt::FunctionDecl { path, function } => {
                let closure = make_closure(function, scope);
                self.last_position = Some(function.position);
                self.assign_path(path, closure, scope)?;
            }
            Stmt::Assign {
                target,
                value,
                position,
            } => match target {
                AssignTarget::Name(name) => {
                    let value = self.eval_expr(value, scope)?;
                    self.assign_name(name, value, scope);
                }
                AssignTarget::Index { object, key } => {
                    let object = self.eval_expr(object, scope)?;
                    let key = self.eval_expr(key, scope)?;
                    let value = self.eval_expr(value, scope)?;
                    self.last_position = Some(*position);
                    set_index(&object, key, value)?;
                }
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If {
                branches,
                else_branch,
                ..
            } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition, scope)?.is_truthy() {
                        return self.exec_block(body, &Scope::child(scope));
                    }
                }
                if let Some(body) = else_branch {
                    return self.exec_block(body, &Scope::child(scope));
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.eval_expr(condition, scope)?.is_truthy() {
                    if let LoopControl::Exit(flow) = self.loop_iteration(body, Scope::child(scope))?
                    {
                        return Ok(flow);
                    }
                }
            }
            Stmt::NumericFor {
                variable,
                start,
                end,
                step,
                body,
                position,
            } => {
                let start = self.eval_expr(start, scope)?;
                let end = self.eval_expr(end, scope)?;
                let step = match step {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Int(1),
                };
                self.last_position = Some(*position);
                return self.exec_numeric_for(variable, start, end, step, body, scope);
            }
            Stmt::ForIn {
                index,
                variable,
                iterable,
                body,
                position,
            } => {
                let iterable = self.eval_expr(iterable, scope)?;
                self.last_position = Some(*position);
                let pairs: Vec<(Value, Value)> = match &iterable {
                    Value::List(items) => items
                        .borrow()
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (Value::Int(i as i64 + 1), item.clone()))
                        .collect(),
                    Value::Table(entries) => entries
                        .borrow()
                        .iter()
                        .map(|(key, item)| (Value::String(key.clone()), item.clone()))
                        .collect(),
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "cannot iterate over a {} value",
                            other.type_name()
                        )));
                    }
                };
                for (key, item) in pairs {
                    let iteration = Scope::child(scope);
                    if let Some(index) = index {
                        iteration.declare(index.clone(), key);
                    }
                    iteration.declare(variable.clone(), item);
                    if let LoopControl::Exit(flow) = self.loop_iteration(body, iteration)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Break { .. } => return Ok(Flow::Break),
            Stmt::Expression { expr } => {
                self.eval_expr(expr, scope)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_numeric_for(
        &mut self,
        variable: &str,
        start: Value,
        end: Value,
        step: Value,
        body: &[Stmt],
        scope: &Rc<Scope>,
    ) -> Result<Flow, RuntimeError> {
        if let (Value::Int(start), Value::Int(end), Value::Int(step)) = (&start, &end, &step) {
            let (end, step) = (*end, *step);
            if step == 0 {
                return Err(RuntimeError::ArgumentError("'for' step is zero".into()));
            }
            let mut counter = *start;
            while (step > 0 && counter <= end) || (step < 0 && counter >= end) {
                let iteration = Scope::child(scope);
                iteration.declare(variable, Value::Int(counter));
                if let LoopControl::Exit(flow) = self.loop_iteration(body, iteration)? {
                    return Ok(flow);
                }
                counter = match counter.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
            return Ok(Flow::Normal);
        }

        let number = |value: &Value, what: &str| {
            value.as_number().ok_or_else(|| {
                RuntimeError::TypeError(format!(
                    "'for' {} must be a number, got {}",
                    what,
                    value.type_name()
                ))
            })
        };
        let start = number(&start, "initial value")?;
        let end = number(&end, "limit")?;
        let step = number(&step, "step")?;
        // NaN never satisfies a loop bound.
        if start.is_nan() || end.is_nan() || step.is_nan() {
            return Ok(Flow::Normal);
        }
        if step == 0.0 {
            return Err(RuntimeError::ArgumentError("'for' step is zero".into()));
        }
        let mut iteration_count: u64 = 0;
        loop {
            // Derived from the start to avoid accumulating rounding drift.
            let current = start + iteration_count as f64 * step;
            if (step > 0.0 && current > end) || (step < 0.0 && current < end) {
                break;
            }
            let iteration = Scope::child(scope);
            iteration.declare(variable, Value::Float(current));
            if let LoopControl::Exit(flow) = self.loop_iteration(body, iteration)? {
                return Ok(flow);
            }
            iteration_count += 1;
        }
        Ok(Flow::Normal)
    }

    fn loop_iteration(
        &mut self,
        body: &[Stmt],
        scope: Rc<Scope>,
    ) -> Result<LoopControl, RuntimeError> {
        match self.exec_block(body, &scope)? {
            Flow::Normal => Ok(LoopControl::Continue),
            Flow::Break => Ok(LoopControl::Exit(Flow::Normal)),
            flow @ Flow::Return(_) => Ok(LoopControl::Exit(flow)),
        }
    }

    fn assign_name(&mut self, name: &str, value: Value, scope: &Rc<Scope>) {
        if scope.lookup(name).is_some() {
            scope.assign(name, value);
        } else {
            self.globals.declare(name, value);
        }
    }

    fn assign_path(
        &mut self,
        path: &[String],
        value: Value,
        scope: &Rc<Scope>,
    ) -> Result<(), RuntimeError> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(());
        };
        if parents.is_empty() {
            self.assign_name(last, value, scope);
            return Ok(());
        }
        let mut target = scope
            .lookup(&parents[0])
            .ok_or_else(|| RuntimeError::VariableNotFound(parents[0].clone()))?;
        for segment in &parents[1..] {
            target = index_value(&target, &Value::String(segment.clone()))?;
        }
        set_index(&target, Value::String(last.clone()), value)
    }

    //=============================================
    //            Section 6: Expressions
    //=============================================

    fn eval_expr(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        self.check_stack()?;
        match expr {
            Expr::Literal { value, .. } => Ok(literal_value(value)),
            Expr::Identifier { name, position } => match scope.lookup(name) {
                Some(value) => Ok(value),
                None => {
                    self.last_position = Some(*position);
                    Err(RuntimeError::VariableNotFound(name.clone()))
                }
            },
            Expr::Binary {
                left,
                operator: BinaryOp::And,
                right,
                ..
            } => {
                let left = self.eval_expr(left, scope)?;
                if left.is_truthy() {
                    self.eval_expr(right, scope)
                } else {
                    Ok(left)
                }
            }
            Expr::Binary {
                left,
                operator: BinaryOp::Or,
                right,
                ..
            } => {
                let left = self.eval_expr(left, scope)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(right, scope)
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
                position,
            } => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                self.last_position = Some(*position);
                binary_op(*operator, left, right)
            }
            Expr::Unary {
                operator,
                operand,
                position,
            } => {
                let operand = self.eval_expr(operand, scope)?;
                self.last_position = Some(*position);
                unary_op(*operator, operand)
            }
            Expr::Call {
                callee,
                args,
                position,
            } => {
                let func = self.eval_expr(callee, scope)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope)?);
                }
                self.last_position = Some(*position);
                if !func.is_callable() {
                    return Err(RuntimeError::TypeError(format!(
                        "attempt to call a {} value{}",
                        func.type_name(),
                        describe_callee(callee)
                    )));
                }
                self.call_value(&func, values)
            }
            Expr::Index {
                object,
                key,
                position,
            } => {
                let object = self.eval_expr(object, scope)?;
                let key = self.eval_expr(key, scope)?;
                self.last_position = Some(*position);
                index_value(&object, &key)
            }
            Expr::Function(function) => Ok(make_closure(function, scope)),
            Expr::Table { items, position } => {
                let mut positional = Vec::new();
                let mut named = BTreeMap::new();
                for item in items {
                    match item {
                        TableItem::Positional(expr) => positional.push(self.eval_expr(expr, scope)?),
                        TableItem::Named(name, expr) => {
                            let value = self.eval_expr(expr, scope)?;
                            named.insert(name.clone(), value);
                        }
                    }
                }
                match (positional.is_empty(), named.is_empty()) {
                    (_, true) => Ok(Value::list(positional)),
                    (true, false) => Ok(Value::table(named)),
                    (false, false) => {
                        self.last_position = Some(*position);
                        Err(RuntimeError::TypeError(
                            "table constructor cannot mix positional and named fields".into(),
                        ))
                    }
                }
            }
        }
    }
}

//=============================================
//            Section 7: Operators
//=============================================

/// Address of a local in the caller's frame, used to measure stack use.
#[inline(always)]
fn stack_address() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Nil,
        Literal::Boolean(flag) => Value::Bool(*flag),
        Literal::Integer(value) => Value::Int(*value),
        Literal::Float(value) => Value::Float(*value),
        Literal::String(text) => Value::String(text.clone()),
    }
}

fn make_closure(function: &FunctionBody, scope: &Rc<Scope>) -> Value {
    Value::Function(Rc::new(Closure {
        name: function.name.clone(),
        params: function.params.clone(),
        body: Rc::clone(&function.body),
        scope: Rc::clone(scope),
    }))
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Identifier { name, .. } => format!(" (variable '{}')", name),
        Expr::Index { key, .. } => match key.as_ref() {
            Expr::Literal {
                value: Literal::String(field),
                ..
            } => format!(" (field '{}')", field),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Apply a non short-circuiting binary operator.
pub fn binary_op(operator: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use BinaryOp::*;

    match operator {
        Add | Subtract | Multiply | Divide | FloorDivide | Modulo | Power => {
            arithmetic(operator, &left, &right)
        }
        Concat => concat(&left, &right),
        Equal => Ok(Value::Bool(left == right)),
        NotEqual => Ok(Value::Bool(left != right)),
        Less | LessEqual | Greater | GreaterEqual => compare(operator, &left, &right),
        And => Ok(if left.is_truthy() { right } else { left }),
        Or => Ok(if left.is_truthy() { left } else { right }),
    }
}

fn arithmetic(operator: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let integral = match operator {
            BinaryOp::Add => Some(a.wrapping_add(b)),
            BinaryOp::Subtract => Some(a.wrapping_sub(b)),
            BinaryOp::Multiply => Some(a.wrapping_mul(b)),
            BinaryOp::FloorDivide => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let quotient = a.wrapping_div(b);
                if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                    Some(quotient - 1)
                } else {
                    Some(quotient)
                }
            }
            BinaryOp::Modulo => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let remainder = a.wrapping_rem(b);
                if remainder != 0 && ((remainder < 0) != (b < 0)) {
                    Some(remainder + b)
                } else {
                    Some(remainder)
                }
            }
            _ => None,
        };
        if let Some(value) = integral {
            return Ok(Value::Int(value));
        }
    }

    let operand = |value: &Value| {
        value.as_number().ok_or_else(|| {
            RuntimeError::TypeError(format!(
                "attempt to perform arithmetic ({}) on a {} value",
                operator.symbol(),
                value.type_name()
            ))
        })
    };
    let a = operand(left)?;
    let b = operand(right)?;
    let result = match operator {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        BinaryOp::FloorDivide => (a / b).floor(),
        BinaryOp::Modulo => {
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Power => a.powf(b),
        _ => unreachable!("non-arithmetic operator {:?}", operator),
    };
    Ok(Value::Float(result))
}

fn concat(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    fn piece(value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Int(_) | Value::Float(_) => Some(value.to_string()),
            _ => None,
        }
    }

    match (piece(left), piece(right)) {
        (Some(a), Some(b)) => Ok(Value::String(a + &b)),
        (None, _) => Err(RuntimeError::TypeError(format!(
            "attempt to concatenate a {} value",
            left.type_name()
        ))),
        (_, None) => Err(RuntimeError::TypeError(format!(
            "attempt to concatenate a {} value",
            right.type_name()
        ))),
    }
}

fn compare(operator: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuntimeError::TypeError(format!(
                    "attempt to compare {} with {}",
                    left.type_name(),
                    right.type_name()
                )));
            }
        },
    };
    // NaN compares false against everything.
    let result = ordering.is_some_and(|ordering| match operator {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        _ => false,
    });
    Ok(Value::Bool(result))
}

fn unary_op(operator: UnaryOp, operand: Value) -> Result<Value, RuntimeError> {
    match (operator, &operand) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Negate, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
        (UnaryOp::Negate, Value::Float(value)) => Ok(Value::Float(-value)),
        (UnaryOp::Length, Value::String(text)) => Ok(Value::Int(text.len() as i64)),
        (UnaryOp::Length, Value::List(items)) => Ok(Value::Int(items.borrow().len() as i64)),
        (UnaryOp::Length, Value::Table(entries)) => Ok(Value::Int(entries.borrow().len() as i64)),
        (UnaryOp::Negate, other) => Err(RuntimeError::TypeError(format!(
            "attempt to perform arithmetic (-) on a {} value",
            other.type_name()
        ))),
        (UnaryOp::Length, other) => Err(RuntimeError::TypeError(format!(
            "attempt to get length of a {} value",
            other.type_name()
        ))),
    }
}

//=============================================
//            Section 8: Indexing
//=============================================

/// Read `object[key]`. Lists are 1-based; missing entries read as `nil`.
pub fn index_value(object: &Value, key: &Value) -> Result<Value, RuntimeError> {
    match object {
        Value::List(items) => {
            let index = key.as_integer().ok_or_else(|| {
                RuntimeError::IndexError(format!(
                    "list index must be an integer, got {}",
                    key.type_name()
                ))
            })?;
            if index < 1 {
                return Ok(Value::Nil);
            }
            Ok(items
                .borrow()
                .get((index - 1) as usize)
                .cloned()
                .unwrap_or(Value::Nil))
        }
        Value::Table(entries) => match key {
            Value::String(name) => Ok(entries.borrow().get(name).cloned().unwrap_or(Value::Nil)),
            other => Err(RuntimeError::IndexError(format!(
                "table keys must be strings, got {}",
                other.type_name()
            ))),
        },
        other => {
            let field = match key {
                Value::String(name) => format!(" (field '{}')", name),
                _ => String::new(),
            };
            Err(RuntimeError::TypeError(format!(
                "attempt to index a {} value{}",
                other.type_name(),
                field
            )))
        }
    }
}

/// Write `object[key] = value`. Lists grow by appending at `#list + 1`;
/// assigning `nil` to a table field removes it.
pub fn set_index(object: &Value, key: Value, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::List(items) => {
            let index = key.as_integer().ok_or_else(|| {
                RuntimeError::IndexError(format!(
                    "list index must be an integer, got {}",
                    key.type_name()
                ))
            })?;
            let mut items = items.borrow_mut();
            let length = items.len() as i64;
            if (1..=length).contains(&index) {
                items[(index - 1) as usize] = value;
            } else if index == length + 1 {
                items.push(value);
            } else {
                return Err(RuntimeError::IndexError(format!(
                    "index {} out of range for list of length {}",
                    index, length
                )));
            }
            Ok(())
        }
        Value::Table(entries) => {
            let Value::String(name) = key else {
                return Err(RuntimeError::IndexError(format!(
                    "table keys must be strings, got {}",
                    key.type_name()
                )));
            };
            let mut entries = entries.borrow_mut();
            if matches!(value, Value::Nil) {
                entries.remove(&name);
            } else {
                entries.insert(name, value);
            }
            Ok(())
        }
        other => Err(RuntimeError::TypeError(format!(
            "attempt to index a {} value",
            other.type_name()
        ))),
    }
}

//=============================================
//            Section 9: Tests
//=============================================


//=============================================
// End of file
//=============================================
