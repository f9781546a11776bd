//==============================================
// File: tests/golden.rs
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Regression test for the bundled trigonometry template
// Objective: Expand it byte for byte and check the generated assertions
//==============================================

mod util;

use cexpand::verify;
use util::{GOLDEN, TEMPLATE, golden_expander};

#[test]
fn test_template_matches_committed_output() {
    let mut expander = golden_expander();
    let expanded = expander
        .expand_str(TEMPLATE, "tests/unit_tests.c")
        .expect("expand template");
    assert_eq!(expanded, GOLDEN);
}

#[test]
fn test_expansion_is_repeatable_on_one_expander() {
    let mut expander = golden_expander();
    let first = expander.expand_str(TEMPLATE, "a.c").expect("first");
    let second = expander.expand_str(TEMPLATE, "b.c").expect("second");
    assert_eq!(first, second);
}

#[test]
fn test_generated_assertions_are_checked() {
    let report = verify::verify_source(GOLDEN).expect("scan golden output");
    assert_eq!(report.total, 49);
    assert_eq!(report.passed, 45);
    assert_eq!(report.failed, 4);

    // Six printed decimals are not enough for tan near its poles.
    let failing: Vec<(usize, &str)> = report
        .failures()
        .map(|outcome| (outcome.assertion.line, outcome.assertion.function.as_str()))
        .collect();
    assert_eq!(
        failing,
        vec![(52, "tan"), (53, "tan"), (59, "tan"), (60, "tan")]
    );
    for outcome in report.failures() {
        assert!(outcome.deviation < 1e-5, "{outcome:?}");
    }
}

//==============================================
// End of file
//==============================================
