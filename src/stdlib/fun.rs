//=============================================
// cexpand/stdlib/fun.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: The `F` module of list helpers
// Objective: Ranges, higher-order traversal and list reshaping
// Formatting: Zobie.format (.solvraformat)
//=============================================

use crate::ast::BinaryOp;
use crate::interpreter::{Interpreter, NativeArity, RuntimeError, Value, binary_op};

use super::{ModuleBuilder, expect_callable, expect_integer, expect_list, expect_number};

const MAX_RANGE_LEN: usize = 10_000_000;

pub fn register(interpreter: &mut Interpreter) {
    let module = ModuleBuilder::default()
        .function(
            "range",
            NativeArity::Range {
                min: 1,
                max: Some(3),
            },
            |_interp, args| range(args),
        )
        .function("map", NativeArity::Exact(2), |interp, args| {
            let func = expect_callable(&args[0], "F.map")?;
            let items = expect_list(&args[1], "F.map")?;
            let mut mapped = Vec::with_capacity(items.len());
            for item in items {
                mapped.push(interp.call_value(func, vec![item])?);
            }
            Ok(Value::list(mapped))
        })
        .function("filter", NativeArity::Exact(2), |interp, args| {
            let predicate = expect_callable(&args[0], "F.filter")?;
            let mut kept = Vec::new();
            for item in expect_list(&args[1], "F.filter")? {
                if interp.call_value(predicate, vec![item.clone()])?.is_truthy() {
                    kept.push(item);
                }
            }
            Ok(Value::list(kept))
        })
        .function("foldl", NativeArity::Exact(3), |interp, args| {
            let func = expect_callable(&args[0], "F.foldl")?;
            let mut accumulator = args[1].clone();
            for item in expect_list(&args[2], "F.foldl")? {
                accumulator = interp.call_value(func, vec![accumulator, item])?;
            }
            Ok(accumulator)
        })
        .function("sum", NativeArity::Exact(1), |_interp, args| {
            let mut total = Value::Int(0);
            for item in expect_list(&args[0], "F.sum")? {
                total = binary_op(BinaryOp::Add, total, item)?;
            }
            Ok(total)
        })
        .function(
            "concat",
            NativeArity::Range { min: 0, max: None },
            |_interp, args| {
                let mut joined = Vec::new();
                for list in args {
                    joined.extend(expect_list(list, "F.concat")?);
                }
                Ok(Value::list(joined))
            },
        )
        .function("reverse", NativeArity::Exact(1), |_interp, args| {
            let mut items = expect_list(&args[0], "F.reverse")?;
            items.reverse();
            Ok(Value::list(items))
        })
        .function("zip", NativeArity::Exact(2), |_interp, args| {
            let left = expect_list(&args[0], "F.zip")?;
            let right = expect_list(&args[1], "F.zip")?;
            let pairs = left
                .into_iter()
                .zip(right)
                .map(|(a, b)| Value::list(vec![a, b]))
                .collect();
            Ok(Value::list(pairs))
        })
        .function("take", NativeArity::Exact(2), |_interp, args| {
            let count = expect_integer(&args[0], "F.take")?.max(0) as usize;
            let items = expect_list(&args[1], "F.take")?;
            Ok(Value::list(items.into_iter().take(count).collect()))
        })
        .function("drop", NativeArity::Exact(2), |_interp, args| {
            let count = expect_integer(&args[0], "F.drop")?.max(0) as usize;
            let items = expect_list(&args[1], "F.drop")?;
            Ok(Value::list(items.into_iter().skip(count).collect()))
        })
        .function("len", NativeArity::Exact(1), |_interp, args| match &args[0] {
            Value::List(items) => Ok(Value::Int(items.borrow().len() as i64)),
            Value::Table(entries) => Ok(Value::Int(entries.borrow().len() as i64)),
            Value::String(text) => Ok(Value::Int(text.len() as i64)),
            other => Err(RuntimeError::TypeError(format!(
                "F.len expects list, table or string, got {}",
                other.type_name()
            ))),
        })
        .function(
            "join",
            NativeArity::Range {
                min: 1,
                max: Some(2),
            },
            |_interp, args| {
                let items = expect_list(&args[0], "F.join")?;
                let separator = match args.get(1) {
                    Some(Value::String(text)) => text.as_str(),
                    Some(other) => {
                        return Err(RuntimeError::TypeError(format!(
                            "F.join separator must be a string, got {}",
                            other.type_name()
                        )));
                    }
                    None => "",
                };
                let pieces: Vec<String> = items.iter().map(Value::to_string).collect();
                Ok(Value::String(pieces.join(separator)))
            },
        )
        .build();
    interpreter.define_global("F", module);
}

/// Inclusive range. One argument counts `1..=n`; integer bounds and step
/// yield integers, anything else yields floats.
fn range(args: &[Value]) -> Result<Value, RuntimeError> {
    let (start, end) = match args {
        [end] => (Value::Int(1), end.clone()),
        [start, end, ..] => (start.clone(), end.clone()),
        [] => unreachable!("arity checked by caller"),
    };
    let step = args.get(2).cloned().unwrap_or(Value::Int(1));

    if let (Value::Int(start), Value::Int(end), Value::Int(step)) = (&start, &end, &step) {
        let (start, end, step) = (*start as i128, *end as i128, *step as i128);
        if step == 0 {
            return Err(RuntimeError::ArgumentError("F.range step must not be zero".into()));
        }
        let count = if (step > 0 && start > end) || (step < 0 && start < end) {
            0
        } else {
            usize::try_from((end - start) / step + 1).unwrap_or(usize::MAX)
        };
        check_range_len(count)?;
        let items = (0..count)
            .map(|k| Value::Int((start + k as i128 * step) as i64))
            .collect();
        return Ok(Value::list(items));
    }

    let start = expect_number(&start, "F.range")?;
    let end = expect_number(&end, "F.range")?;
    let step = expect_number(&step, "F.range")?;
    if step == 0.0 || !step.is_finite() {
        return Err(RuntimeError::ArgumentError(
            "F.range step must be finite and non-zero".into(),
        ));
    }
    let span = (end - start) / step;
    if span.is_nan() || span > MAX_RANGE_LEN as f64 {
        check_range_len(usize::MAX)?;
    }
    let count = if span < 0.0 { 0 } else { span.floor() as usize + 1 };
    check_range_len(count)?;
    let items = (0..count)
        .map(|k| Value::Float(start + k as f64 * step))
        .collect();
    Ok(Value::list(items))
}

fn check_range_len(count: usize) -> Result<(), RuntimeError> {
    if count > MAX_RANGE_LEN {
        return Err(RuntimeError::ArgumentError(format!(
            "F.range would produce more than {} elements",
            MAX_RANGE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{Interpreter, Value};

    fn eval(source: &str) -> Value {
        Interpreter::with_std()
            .unwrap()
            .eval_source(source, 1, 1)
            .unwrap()
    }

    fn render(source: &str) -> String {
        eval(source).to_string()
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(render("F.range(3)"), "{1, 2, 3}");
        assert_eq!(render("F.range(-2, 2)"), "{-2, -1, 0, 1, 2}");
        assert_eq!(render("F.range(10, 1, -4)"), "{10, 6, 2}");
        assert_eq!(render("F.range(0, 1, 0.25)"), "{0.0, 0.25, 0.5, 0.75, 1.0}");
        assert_eq!(render("F.range(5, 1)"), "{}");
        assert_eq!(eval("#F.range(-8, 8)"), Value::Int(17));
    }

    #[test]
    fn test_range_rejects_zero_step_and_huge_spans() {
        let mut interpreter = Interpreter::with_std().unwrap();
        assert!(interpreter.eval_source("F.range(1, 2, 0)", 1, 1).is_err());
        assert!(interpreter.eval_source("F.range(1, huge)", 1, 1).is_err());
        assert!(interpreter.eval_source("F.range(1, 1e12)", 1, 1).is_err());
    }

    #[test]
    fn test_higher_order_helpers() {
        assert_eq!(
            render("F.map(function(x) return x * x end, F.range(4))"),
            "{1, 4, 9, 16}"
        );
        assert_eq!(
            render("F.filter(function(x) return x % 2 == 0 end, F.range(6))"),
            "{2, 4, 6}"
        );
        assert_eq!(
            eval("F.foldl(function(acc, x) return acc .. x end, \">\", {1, 2, 3})"),
            Value::String(">123".into())
        );
        assert_eq!(render("F.map(tostring, {1.5})"), "{1.5}");
    }

    #[test]
    fn test_list_reshaping() {
        assert_eq!(eval("F.sum(F.range(100))"), Value::Int(5050));
        assert_eq!(eval("F.sum({1, 0.5})"), Value::Float(1.5));
        assert_eq!(render("F.concat({1}, {}, {2, 3})"), "{1, 2, 3}");
        assert_eq!(render("F.reverse({1, 2, 3})"), "{3, 2, 1}");
        assert_eq!(render("F.zip({1, 2, 3}, {\"a\", \"b\"})"), "{{1, a}, {2, b}}");
        assert_eq!(render("F.take(2, {1, 2, 3})"), "{1, 2}");
        assert_eq!(render("F.drop(2, {1, 2, 3})"), "{3}");
        assert_eq!(render("F.take(-1, {1})"), "{}");
        assert_eq!(eval("F.len({a = 1, b = 2})"), Value::Int(2));
        assert_eq!(eval("F.join({1, 2, 3}, \", \")"), Value::String("1, 2, 3".into()));
    }

    #[test]
    fn test_map_requires_function_and_list() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let err = interpreter.eval_source("F.map(1, {})", 1, 1).unwrap_err();
        assert!(err.message.contains("F.map expects function"));
        let err = interpreter.eval_source("F.map(tostring, 3)", 1, 1).unwrap_err();
        assert!(err.message.contains("F.map expects list"));
    }
}

//=============================================
// End of file
//=============================================
