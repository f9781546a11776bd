//==============================================
// File: tests/angle_counts.rs
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Property tests over the template's sample count
// Objective: Check assertion counts for any number of samples per half turn
//==============================================

mod util;

use std::f64::consts::PI;

use cexpand::verify;
use proptest::prelude::*;
use util::{golden_expander, template_with_samples};

fn count(text: &str, function: &str) -> usize {
    text.matches(&format!("assert(fabs({function}(")).count()
}

/// Exact sample angles `i*pi/n`, computed the way the template does.
fn angles(n: u32) -> Vec<f64> {
    let n = i64::from(n);
    (-n..=n).map(|i| i as f64 * PI / n as f64).collect()
}

/// Largest gap between each printed expectation and `f` at the exact angle.
fn worst_deviation(expanded: &str, function: &str, f: fn(f64) -> f64, exact: &[f64]) -> f64 {
    let expected: Vec<f64> = verify::scan(expanded)
        .expect("scan expansion")
        .into_iter()
        .filter(|assertion| assertion.function == function)
        .map(|assertion| assertion.expected)
        .collect();
    assert_eq!(expected.len(), exact.len(), "{function} assertion count");
    exact
        .iter()
        .zip(&expected)
        .map(|(angle, expected)| (f(*angle) - expected).abs())
        .fold(0.0, f64::max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn test_assertion_counts(n in 1u32..=40) {
        let template = template_with_samples(n);
        let expanded = golden_expander()
            .expand_str(&template, "tests/unit_tests.c")
            .expect("expand template");

        let samples = 2 * n as usize + 1;
        prop_assert_eq!(count(&expanded, "cos"), samples);
        prop_assert_eq!(count(&expanded, "sin"), samples);
        // Even sample counts hit both poles of tan exactly.
        let tan = if n % 2 == 0 { samples - 2 } else { samples };
        prop_assert_eq!(count(&expanded, "tan"), tan);
        prop_assert!(expanded.ends_with("    return EXIT_SUCCESS;\n}\n"), "expansion must end with the closing of main");
    }

    #[test]
    fn test_expectations_hold_at_exact_angles(n in 1u32..=40) {
        let expanded = golden_expander()
            .expand_str(&template_with_samples(n), "tests/unit_tests.c")
            .expect("expand template");

        let all = angles(n);
        let away_from_poles: Vec<f64> = all
            .iter()
            .copied()
            .filter(|a| (a.abs() - PI / 2.0).abs() > 1e-4)
            .collect();

        prop_assert!(worst_deviation(&expanded, "cos", f64::cos, &all) < 1e-6);
        prop_assert!(worst_deviation(&expanded, "sin", f64::sin, &all) < 1e-6);
        prop_assert!(worst_deviation(&expanded, "tan", f64::tan, &away_from_poles) < 1e-6);
    }
}

#[test]
fn test_middle_sample_is_zero() {
    let expanded = golden_expander()
        .expand_str(&template_with_samples(3), "t.c")
        .expect("expand template");
    assert!(expanded.contains("    assert(fabs(sin(0.000000) - 0.000000) < 1e-6);\n"));
    assert!(expanded.contains("    assert(fabs(cos(-3.141593) - -1.000000) < 1e-6);\n"));
}

//==============================================
// End of file
//==============================================
