//==============================================
// File: tests/scripts.rs
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Run script fixtures
// Objective: Validate the language and stdlib through whole programs
//==============================================

mod util;

use util::run_script_test;

#[test]
fn test_list_helpers() {
    run_script_test("tests/scripts/lists.cx");
}

#[test]
fn test_closures_and_control_flow() {
    run_script_test("tests/scripts/closures.cx");
}

#[test]
fn test_string_formatting() {
    run_script_test("tests/scripts/format.cx");
}

#[test]
fn test_trig_generation() {
    run_script_test("tests/scripts/trig.cx");
}

//==============================================
// End of file
//==============================================
