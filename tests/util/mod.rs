//==============================================
// File: tests/util/mod.rs
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Shared helpers for integration tests
// Objective: Run script fixtures and build template expanders with a fixed context
//==============================================

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use cexpand::interpreter::{ExpansionContext, Interpreter, Value};
use cexpand::template::Expander;

pub const TEMPLATE: &str = include_str!("../../templates/unit_tests.c");
pub const GOLDEN: &str = include_str!("../fixtures/unit_tests_result.c");

/// Run a script fixture relative to the crate root and assert it returns `true`.
pub fn run_script_test(relative_path: &str) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative_path);
    let source = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read {} failed: {}", path.display(), err));
    let mut interpreter = Interpreter::with_std().expect("stdlib");
    let result = interpreter
        .run_source(&source, 1, 1)
        .unwrap_or_else(|err| panic!("execute {}: {}", path.display(), err));
    match result {
        Some(Value::Bool(true)) => {}
        other => panic!(
            "script {} failed: expected true, got {other:?}",
            path.display()
        ),
    }
}

/// Expander whose context matches the committed golden output.
pub fn golden_expander() -> Expander {
    let mut expander = Expander::new().expect("stdlib");
    expander.set_context(ExpansionContext {
        input_files: vec!["tests/unit_tests.c".to_string()],
        output_file: Some(".build/unit_tests.c".to_string()),
    });
    expander
}

/// The bundled template with a different sample count.
pub fn template_with_samples(n: u32) -> String {
    TEMPLATE.replace("local n = 8", &format!("local n = {n}"))
}

//==============================================
// End of file
//==============================================
