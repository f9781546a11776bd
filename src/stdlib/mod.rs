//=============================================
// cexpand/stdlib.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Built-in functions and modules for the macro language
// Objective: Register core, math, F, string and context builtins plus the prelude
// Formatting: Zobie.format (.solvraformat)
//=============================================

pub mod base;
pub mod context;
pub mod fun;
pub mod math;
pub mod prelude;
pub mod string;

use std::collections::BTreeMap;

use tracing::debug;

use crate::interpreter::{Interpreter, NativeArity, NativeFn, RuntimeError, ScriptError, Value};

//=============================================
//            Section 1: Installation
//=============================================

/// Register every builtin module and evaluate the prelude.
pub fn install(interpreter: &mut Interpreter) -> Result<(), ScriptError> {
    base::register(interpreter);
    math::register(interpreter);
    fun::register(interpreter);
    string::register(interpreter);
    context::register(interpreter);
    interpreter.run_source(prelude::PRELUDE, 1, 1)?;
    debug!(globals = interpreter.globals().names().len(), "standard library installed");
    Ok(())
}

pub(crate) fn register_builtin(
    interpreter: &mut Interpreter,
    name: &'static str,
    arity: NativeArity,
    func: NativeFn,
) {
    interpreter.define_global(name, Value::native(name, arity, func));
}

/// Collects named builtins into a table value such as `F` or `math`.
#[derive(Default)]
pub(crate) struct ModuleBuilder {
    entries: BTreeMap<String, Value>,
}

impl ModuleBuilder {
    pub(crate) fn function(mut self, name: &'static str, arity: NativeArity, func: NativeFn) -> Self {
        self.entries
            .insert(name.to_string(), Value::native(name, arity, func));
        self
    }

    pub(crate) fn value(mut self, name: &str, value: Value) -> Self {
        self.entries.insert(name.to_string(), value);
        self
    }

    pub(crate) fn build(self) -> Value {
        Value::table(self.entries)
    }
}

//=============================================
//            Section 2: Argument Helpers
//=============================================

pub(crate) fn expect_number(value: &Value, name: &str) -> Result<f64, RuntimeError> {
    value.as_number().ok_or_else(|| {
        RuntimeError::TypeError(format!(
            "{name} expects numeric argument, got {}",
            value.type_name()
        ))
    })
}

pub(crate) fn expect_integer(value: &Value, name: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(_) | Value::Float(_) => value.as_integer().ok_or_else(|| {
            RuntimeError::ArgumentError(format!(
                "{name} expects an integer, got {}",
                value
            ))
        }),
        other => Err(RuntimeError::TypeError(format!(
            "{name} expects integer argument, got {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn expect_str<'a>(value: &'a Value, name: &str) -> Result<&'a str, RuntimeError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(RuntimeError::TypeError(format!(
            "{name} expects string argument, got {}",
            other.type_name()
        ))),
    }
}

/// Snapshot of a list argument, so callbacks may mutate the original.
pub(crate) fn expect_list(value: &Value, name: &str) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        other => Err(RuntimeError::TypeError(format!(
            "{name} expects list argument, got {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn expect_callable<'a>(value: &'a Value, name: &str) -> Result<&'a Value, RuntimeError> {
    if value.is_callable() {
        Ok(value)
    } else {
        Err(RuntimeError::TypeError(format!(
            "{name} expects function argument, got {}",
            value.type_name()
        )))
    }
}

//=============================================
// End of file
//=============================================
