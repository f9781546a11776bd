//=============================================
// cexpand/stdlib/math.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Math builtins and the shared unary function table
// Objective: Expose libm-style functions to scripts and to the assertion checker
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::collections::BTreeMap;
use std::f64::consts::PI;

use once_cell::sync::Lazy;

use crate::interpreter::{Interpreter, NativeArity, NativeFn, RuntimeError, Value};

use super::{ModuleBuilder, expect_number};

pub type UnaryFn = fn(f64) -> f64;

/// Unary functions under their C names. `verify` recomputes generated
/// assertions through this table, so it must agree with the script builtins.
static UNARY: Lazy<BTreeMap<&'static str, UnaryFn>> = Lazy::new(|| {
    BTreeMap::from([
        ("abs", f64::abs as UnaryFn),
        ("fabs", f64::abs),
        ("cos", f64::cos),
        ("sin", f64::sin),
        ("tan", f64::tan),
        ("acos", f64::acos),
        ("asin", f64::asin),
        ("atan", f64::atan),
        ("cosh", f64::cosh),
        ("sinh", f64::sinh),
        ("tanh", f64::tanh),
        ("sqrt", f64::sqrt),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
    ])
});

pub fn lookup(name: &str) -> Option<UnaryFn> {
    UNARY.get(name).copied()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    UNARY.keys().copied()
}

macro_rules! float_builtins {
    ($($name:ident => $func:path),* $(,)?) => {
        $(
            fn $name(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
                let x = expect_number(&args[0], stringify!($name))?;
                Ok(Value::Float($func(x)))
            }
        )*

        const FLOAT_BUILTINS: &[(&str, NativeFn)] = &[$((stringify!($name), $name as NativeFn)),*];
    };
}

float_builtins! {
    cos => f64::cos,
    sin => f64::sin,
    tan => f64::tan,
    acos => f64::acos,
    asin => f64::asin,
    cosh => f64::cosh,
    sinh => f64::sinh,
    tanh => f64::tanh,
    sqrt => f64::sqrt,
    exp => f64::exp,
    log10 => f64::log10,
}

/// Integral rounding keeps integers as integers when the result fits.
fn integral(value: f64) -> Value {
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Value::Int(value as i64)
    } else {
        Value::Float(value)
    }
}

fn extreme(args: &[Value], name: &str, pick_left: fn(f64, f64) -> bool) -> Result<Value, RuntimeError> {
    let mut best = &args[0];
    let mut best_number = expect_number(best, name)?;
    for candidate in &args[1..] {
        let number = expect_number(candidate, name)?;
        if pick_left(number, best_number) {
            best = candidate;
            best_number = number;
        }
    }
    Ok(best.clone())
}

fn module() -> ModuleBuilder {
    let mut module = ModuleBuilder::default()
        .value("pi", Value::Float(PI))
        .value("huge", Value::Float(f64::INFINITY))
        .function("abs", NativeArity::Exact(1), |_interp, args| match &args[0] {
            Value::Int(value) => Ok(Value::Int(value.wrapping_abs())),
            other => Ok(Value::Float(expect_number(other, "abs")?.abs())),
        })
        .function("floor", NativeArity::Exact(1), |_interp, args| match &args[0] {
            Value::Int(value) => Ok(Value::Int(*value)),
            other => Ok(integral(expect_number(other, "floor")?.floor())),
        })
        .function("ceil", NativeArity::Exact(1), |_interp, args| match &args[0] {
            Value::Int(value) => Ok(Value::Int(*value)),
            other => Ok(integral(expect_number(other, "ceil")?.ceil())),
        })
        .function(
            "atan",
            NativeArity::Range {
                min: 1,
                max: Some(2),
            },
            |_interp, args| {
                let y = expect_number(&args[0], "atan")?;
                let x = match args.get(1) {
                    Some(value) => expect_number(value, "atan")?,
                    None => 1.0,
                };
                Ok(Value::Float(y.atan2(x)))
            },
        )
        .function(
            "log",
            NativeArity::Range {
                min: 1,
                max: Some(2),
            },
            |_interp, args| {
                let x = expect_number(&args[0], "log")?;
                let result = match args.get(1) {
                    Some(base) => {
                        let base = expect_number(base, "log")?;
                        if base == 2.0 {
                            x.log2()
                        } else if base == 10.0 {
                            x.log10()
                        } else {
                            x.ln() / base.ln()
                        }
                    }
                    None => x.ln(),
                };
                Ok(Value::Float(result))
            },
        )
        .function("fmod", NativeArity::Exact(2), |_interp, args| {
            if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
                if *b == 0 {
                    return Err(RuntimeError::ArgumentError("fmod: zero divisor".into()));
                }
                return Ok(Value::Int(a.wrapping_rem(*b)));
            }
            let a = expect_number(&args[0], "fmod")?;
            let b = expect_number(&args[1], "fmod")?;
            Ok(Value::Float(a % b))
        })
        .function(
            "min",
            NativeArity::Range { min: 1, max: None },
            |_interp, args| extreme(args, "min", |a, b| a < b),
        )
        .function(
            "max",
            NativeArity::Range { min: 1, max: None },
            |_interp, args| extreme(args, "max", |a, b| a > b),
        );
    for (name, func) in FLOAT_BUILTINS {
        module = module.function(*name, NativeArity::Exact(1), *func);
    }
    module
}

/// Install `math` and mirror each of its entries as a global.
pub fn register(interpreter: &mut Interpreter) {
    let table = module().build();
    if let Value::Table(entries) = &table {
        for (name, value) in entries.borrow().iter() {
            interpreter.define_global(name.clone(), value.clone());
        }
    }
    interpreter.define_global("math", table);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Value {
        Interpreter::with_std()
            .unwrap()
            .eval_source(source, 1, 1)
            .unwrap()
    }

    #[test]
    fn test_lookup_table_agrees_with_builtins() {
        for name in ["cos", "sin", "tan", "sqrt", "exp"] {
            let func = lookup(name).unwrap();
            let value = eval(&format!("math.{name}(0.5)"));
            assert_eq!(value, Value::Float(func(0.5)), "{name}");
        }
        assert!(lookup("fabs").is_some());
        assert!(lookup("gamma").is_none());
        assert!(names().any(|name| name == "tan"));
    }

    #[test]
    fn test_globals_mirror_math_table() {
        assert_eq!(eval("cos == math.cos"), Value::Bool(true));
        assert_eq!(eval("pi"), Value::Float(PI));
        assert_eq!(eval("math[\"sin\"](0)"), Value::Float(0.0));
        assert_eq!(eval("-huge < 0"), Value::Bool(true));
    }

    #[test]
    fn test_integer_preserving_functions() {
        assert_eq!(eval("abs(-3)"), Value::Int(3));
        assert_eq!(eval("abs(-2.5)"), Value::Float(2.5));
        assert_eq!(eval("floor(2.7)"), Value::Int(2));
        assert_eq!(eval("ceil(-2.7)"), Value::Int(-2));
        assert_eq!(eval("fmod(-7, 3)"), Value::Int(-1));
        assert_eq!(eval("min(3, 1.5, 2)"), Value::Float(1.5));
        assert_eq!(eval("max(3, 1.5, 2)"), Value::Int(3));
    }

    #[test]
    fn test_two_argument_forms() {
        assert_eq!(eval("atan(1, 1)"), Value::Float(PI / 4.0));
        assert_eq!(eval("log(8, 2)"), Value::Float(3.0));
        assert_eq!(eval("log(1)"), Value::Float(0.0));
    }

    #[test]
    fn test_non_numeric_argument() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let err = interpreter.eval_source("cos(\"x\")", 1, 1).unwrap_err();
        assert!(err.message.contains("cos expects numeric argument"));
    }
}

//=============================================
// End of file
//=============================================
