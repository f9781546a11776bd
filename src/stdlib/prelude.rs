//=============================================
// cexpand/stdlib/prelude.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script-level helpers loaded before any template
// Objective: Assertion generators for C unit-test templates
// Formatting: Zobie.format (.solvraformat)
//=============================================

/// `test_f1(name)(xs)` yields one C assertion per angle, comparing
/// `name(x)` against the value computed here at six decimals.
pub const PRELUDE: &str = r#"
function test_f1(name)
    local f = math[name]
    if f == nil then
        error("test_f1: unknown math function '" .. name .. "'")
    end
    return function(xs)
        return F.map(function(x)
            return string.format("assert(fabs(%s(%f) - %f) < 1e-6);", name, x, f(x))
        end, xs)
    end
end
"#;

#[cfg(test)]
mod tests {
    use crate::interpreter::{Interpreter, Value};

    #[test]
    fn test_f1_builds_assertions() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let value = interpreter
            .eval_source("test_f1 \"sin\" ({0, pi / 2})", 1, 1)
            .unwrap();
        assert_eq!(
            value.to_string(),
            "{assert(fabs(sin(0.000000) - 0.000000) < 1e-6);, \
             assert(fabs(sin(1.570796) - 1.000000) < 1e-6);}"
        );
    }

    #[test]
    fn test_f1_rejects_unknown_function() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let err = interpreter
            .eval_source("test_f1(\"gamma\")", 1, 1)
            .unwrap_err();
        assert!(err.message.contains("unknown math function 'gamma'"));
        assert!(matches!(interpreter.global("test_f1"), Some(Value::Function(_))));
    }
}

//=============================================
// End of file
//=============================================
