//=============================================
// cexpand/stdlib/context.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Expansion context builtins
// Objective: Let templates name the files they are expanded from and into
// Formatting: Zobie.format (.solvraformat)
//=============================================

use crate::interpreter::{Interpreter, NativeArity, Value};

use super::register_builtin;

pub fn register(interpreter: &mut Interpreter) {
    register_builtin(interpreter, "input_files", NativeArity::Exact(0), |interp, _args| {
        Ok(Value::String(interp.context().input_files.join(" ")))
    });
    // `nil` when the expansion goes to stdout.
    register_builtin(interpreter, "output_file", NativeArity::Exact(0), |interp, _args| {
        Ok(interp
            .context()
            .output_file
            .clone()
            .map_or(Value::Nil, Value::String))
    });
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{ExpansionContext, Interpreter, Value};

    #[test]
    fn test_context_reflects_session_files() {
        let mut interpreter = Interpreter::with_std().unwrap();
        assert_eq!(
            interpreter.eval_source("output_file()", 1, 1).unwrap(),
            Value::Nil
        );
        interpreter.set_context(ExpansionContext {
            input_files: vec!["a.c".into(), "b.c".into()],
            output_file: Some(".build/out.c".into()),
        });
        assert_eq!(
            interpreter.eval_source("input_files()", 1, 1).unwrap(),
            Value::String("a.c b.c".into())
        );
        assert_eq!(
            interpreter.eval_source("output_file()", 1, 1).unwrap(),
            Value::String(".build/out.c".into())
        );
    }
}

//=============================================
// End of file
//=============================================
