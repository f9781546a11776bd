//=============================================
// cexpand/verify.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Check generated C assertions without a C toolchain
// Objective: Recompute `assert(fabs(F(X) - E) < T);` lines and report the outcome
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::stdlib::math;

static ASSERTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"assert\(\s*fabs\(\s*([A-Za-z_]\w*)\(\s*([^()]+?)\s*\)\s*-\s*([^()]+?)\s*\)\s*<\s*([^()]+?)\s*\)\s*;",
    )
    .unwrap_or_else(|err| unreachable!("assertion pattern is valid: {err}"))
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assertion {
    pub line: usize,
    pub function: String,
    pub argument: f64,
    pub expected: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    #[serde(flatten)]
    pub assertion: Assertion,
    pub actual: f64,
    pub deviation: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in self.failures() {
            let assertion = &outcome.assertion;
            writeln!(
                f,
                "line {}: {}({}) = {} differs from {} by {:e} (tolerance {:e})",
                assertion.line,
                assertion.function,
                assertion.argument,
                outcome.actual,
                assertion.expected,
                outcome.deviation,
                assertion.tolerance
            )?;
        }
        write!(
            f,
            "{} assertions: {} passed, {} failed",
            self.total, self.passed, self.failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("line {line}: unknown function '{function}'")]
    UnknownFunction { line: usize, function: String },
    #[error("line {line}: malformed number '{text}'")]
    MalformedNumber { line: usize, text: String },
}

/// Collect every assertion in a generated source file.
pub fn scan(source: &str) -> Result<Vec<Assertion>, VerifyError> {
    let mut assertions = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        for captures in ASSERTION.captures_iter(text) {
            let function = captures[1].to_string();
            if math::lookup(&function).is_none() {
                return Err(VerifyError::UnknownFunction { line, function });
            }
            assertions.push(Assertion {
                line,
                function,
                argument: number(&captures[2], line)?,
                expected: number(&captures[3], line)?,
                tolerance: number(&captures[4], line)?,
            });
        }
    }
    Ok(assertions)
}

/// Recompute each assertion and tally the results.
pub fn check(assertions: Vec<Assertion>) -> Result<Report, VerifyError> {
    let mut report = Report::default();
    for assertion in assertions {
        let func = math::lookup(&assertion.function).ok_or_else(|| VerifyError::UnknownFunction {
            line: assertion.line,
            function: assertion.function.clone(),
        })?;
        let actual = func(assertion.argument);
        let deviation = (actual - assertion.expected).abs();
        // NaN deviations fail, matching C's `<`.
        let passed = deviation < assertion.tolerance;
        report.total += 1;
        if passed {
            report.passed += 1;
        } else {
            report.failed += 1;
        }
        report.outcomes.push(Outcome {
            assertion,
            actual,
            deviation,
            passed,
        });
    }
    Ok(report)
}

pub fn verify_source(source: &str) -> Result<Report, VerifyError> {
    check(scan(source)?)
}

/// C double literal, optionally signed; a leading `-` may be separated by spaces.
fn number(text: &str, line: usize) -> Result<f64, VerifyError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .parse::<f64>()
        .ok()
        .filter(|_| compact.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
        .ok_or_else(|| VerifyError::MalformedNumber {
            line,
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_generated_lines() {
        let source = "int main(void)\n{\n    assert(fabs(cos(-3.141593) - -1.000000) < 1e-6);\n}\n";
        let assertions = scan(source).unwrap();
        assert_eq!(
            assertions,
            vec![Assertion {
                line: 3,
                function: "cos".into(),
                argument: -3.141593,
                expected: -1.0,
                tolerance: 1e-6,
            }]
        );
    }

    #[test]
    fn test_check_passes_and_fails() {
        let report = verify_source(
            "assert(fabs(sin(0.000000) - 0.000000) < 1e-6);\n\
             assert(fabs(tan(0.785398) - 0.500000) < 1e-6);\n",
        )
        .unwrap();
        assert_eq!((report.total, report.passed, report.failed), (2, 1, 1));
        assert!(!report.is_success());
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.assertion.line, 2);
        assert!(report.to_string().ends_with("2 assertions: 1 passed, 1 failed"));
    }

    #[test]
    fn test_negative_zero_expectation() {
        let report = verify_source("assert(fabs(tan(3.141593) - -0.000000) < 1e-6);").unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_unknown_function_and_bad_numbers() {
        let err = scan("\n assert(fabs(gamma(1.0) - 1.0) < 1e-6);").unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnknownFunction {
                line: 2,
                function: "gamma".into()
            }
        );
        let err = scan("assert(fabs(cos(x) - 1.0) < 1e-6);").unwrap_err();
        assert!(matches!(err, VerifyError::MalformedNumber { line: 1, .. }));
    }

    #[test]
    fn test_report_serializes() {
        let report = verify_source("assert(fabs(cos(0.000000) - 1.000000) < 1e-6);").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["outcomes"][0]["function"], "cos");
        assert_eq!(json["outcomes"][0]["passed"], true);
    }

    #[test]
    fn test_other_lines_are_ignored() {
        assert!(scan("#include <assert.h>\nassert(x);\nreturn EXIT_SUCCESS;\n")
            .unwrap()
            .is_empty());
    }
}

//=============================================
// End of file
//=============================================
