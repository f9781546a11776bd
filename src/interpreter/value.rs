//=============================================
// cexpand/interpreter/value.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Runtime values of the macro language
// Objective: Value representation, native arity checks, scopes, and text rendering
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::{Interpreter, RuntimeError};
use crate::ast::Stmt;

//=============================================
//            Section 1: Native Function Arity
//=============================================

/// Supported arity constraints for native (built-in) functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    /// The function expects exactly this many arguments.
    Exact(usize),
    /// Inclusive minimum and optional maximum; `None` means no upper bound.
    Range { min: usize, max: Option<usize> },
}

impl NativeArity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            NativeArity::Exact(n) => *n == count,
            NativeArity::Range { min, max } => {
                count >= *min && max.is_none_or(|max| count <= max)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NativeArity::Exact(1) => "1 argument".to_string(),
            NativeArity::Exact(n) => format!("{} arguments", n),
            NativeArity::Range { min, max } => match max {
                Some(max) if min == max => format!("{} arguments", min),
                Some(max) => format!("{}..={} arguments", min, max),
                None if *min == 0 => "any number of arguments".to_string(),
                None => format!("at least {} arguments", min),
            },
        }
    }
}

pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: NativeArity,
    pub func: NativeFn,
}

//=============================================
//            Section 2: Scopes & Closures
//=============================================

/// One level of lexical scope. Closures keep their defining scope alive.
#[derive(Default)]
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Overwrite the nearest existing binding; `false` when no scope declares it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct Closure {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub scope: Rc<Scope>,
}

//=============================================
//            Section 3: Runtime Values
//=============================================

pub type List = Rc<RefCell<Vec<Value>>>;
pub type Table = Rc<RefCell<BTreeMap<String, Value>>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(List),
    Table(Table),
    Function(Rc<Closure>),
    Native(NativeFunction),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn table(entries: BTreeMap<String, Value>) -> Self {
        Value::Table(Rc::new(RefCell::new(entries)))
    }

    pub fn native(name: &'static str, arity: NativeArity, func: NativeFn) -> Self {
        Value::Native(NativeFunction { name, arity, func })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers, and floats with an exact integral value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value)
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value < i64::MAX as f64 =>
            {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;

        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => Rc::ptr_eq(a, b),
            (Table(a), Table(b)) => Rc::ptr_eq(a, b),
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Native(a), Native(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(flag) => write!(f, "Bool({flag})"),
            Value::Int(value) => write!(f, "Int({value})"),
            Value::Float(value) => write!(f, "Float({value:?})"),
            Value::String(text) => write!(f, "String({text:?})"),
            Value::List(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Table(entries) => f.debug_map().entries(entries.borrow().iter()).finish(),
            Value::Function(closure) => {
                write!(f, "<function {}>", closure.name.as_deref().unwrap_or("anonymous"))
            }
            Value::Native(native) => write!(f, "<builtin {}>", native.name),
        }
    }
}

/// `tostring` rendering.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{}", format_float(*value)),
            Value::String(text) => write!(f, "{text}"),
            Value::List(items) => {
                write!(f, "{{")?;
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Table(entries) => {
                write!(f, "{{")?;
                for (index, (key, item)) in entries.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} = {item}")?;
                }
                write!(f, "}}")
            }
            Value::Function(closure) => {
                write!(f, "function: {}", closure.name.as_deref().unwrap_or("anonymous"))
            }
            Value::Native(native) => write!(f, "builtin: {}", native.name),
        }
    }
}

/// Integral floats keep a `.0` suffix so they stay distinguishable from
/// integers; everything else uses the shortest round-trip form.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if value.fract() == 0.0 && magnitude < 1e16 {
        format!("{value:.1}")
    } else if magnitude >= 1e16 || magnitude < 1e-5 {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}


//=============================================
// End of file
//=============================================
