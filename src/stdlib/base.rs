//=============================================
// cexpand/stdlib/base.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Core builtins available to every script
// Objective: Conversions, type inspection, failures and diagnostics
// Formatting: Zobie.format (.solvraformat)
//=============================================

use crate::interpreter::{Interpreter, NativeArity, RuntimeError, Value};

use super::register_builtin;

pub fn register(interpreter: &mut Interpreter) {
    register_builtin(interpreter, "tostring", NativeArity::Exact(1), |_interp, args| {
        Ok(Value::String(args[0].to_string()))
    });
    register_builtin(interpreter, "tonumber", NativeArity::Exact(1), |_interp, args| {
        Ok(to_number(&args[0]))
    });
    register_builtin(interpreter, "type", NativeArity::Exact(1), |_interp, args| {
        Ok(Value::String(args[0].type_name().to_string()))
    });
    register_builtin(
        interpreter,
        "error",
        NativeArity::Range {
            min: 0,
            max: Some(1),
        },
        |_interp, args| {
            let message = match args.first() {
                Some(value) => value.to_string(),
                None => "error".to_string(),
            };
            Err(RuntimeError::Custom(message))
        },
    );
    register_builtin(
        interpreter,
        "assert",
        NativeArity::Range {
            min: 1,
            max: Some(2),
        },
        |_interp, args| {
            if args[0].is_truthy() {
                return Ok(args[0].clone());
            }
            let message = match args.get(1) {
                Some(value) => value.to_string(),
                None => "condition is false".to_string(),
            };
            Err(RuntimeError::AssertionFailed(message))
        },
    );
    // Diagnostics go to stderr; stdout may be carrying the expansion.
    register_builtin(
        interpreter,
        "print",
        NativeArity::Range { min: 0, max: None },
        |_interp, args| {
            let line: Vec<String> = args.iter().map(Value::to_string).collect();
            eprintln!("{}", line.join("\t"));
            Ok(Value::Nil)
        },
    );
}

/// Numbers pass through; decimal strings are parsed; anything else is `nil`.
fn to_number(value: &Value) -> Value {
    match value {
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::String(text) => parse_number(text.trim()).unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let well_formed = !text.is_empty()
        && text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !well_formed {
        return None;
    }
    if let Ok(value) = text.parse::<i64>() {
        return Some(Value::Int(value));
    }
    text.parse::<f64>().ok().map(Value::Float)
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{ErrorCode, Interpreter, Value};

    fn eval(source: &str) -> Value {
        Interpreter::with_std()
            .unwrap()
            .eval_source(source, 1, 1)
            .unwrap()
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("tostring(2.5)"), Value::String("2.5".into()));
        assert_eq!(eval("tostring(nil)"), Value::String("nil".into()));
        assert_eq!(eval("tonumber(\" 42 \")"), Value::Int(42));
        assert_eq!(eval("tonumber(\"1e-4\")"), Value::Float(1e-4));
        assert_eq!(eval("tonumber(\"inf\")"), Value::Nil);
        assert_eq!(eval("tonumber(\"0x\")"), Value::Nil);
        assert_eq!(eval("type(F)"), Value::String("table".into()));
        assert_eq!(eval("type({})"), Value::String("list".into()));
        assert_eq!(eval("type(cos)"), Value::String("function".into()));
    }

    #[test]
    fn test_error_and_assert() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let err = interpreter.eval_source("error(\"boom\")", 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::RuntimeFailure);
        assert_eq!(err.message, "boom");

        let err = interpreter.eval_source("assert(1 > 2, \"order\")", 1, 1).unwrap_err();
        assert_eq!(err.message, "assertion failed: order");
        assert_eq!(
            interpreter.eval_source("assert(3)", 1, 1).unwrap(),
            Value::Int(3)
        );
    }
}

//=============================================
// End of file
//=============================================
