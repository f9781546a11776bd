//=============================================
// cexpand/stdlib/string.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: The `string` module
// Objective: printf-style formatting and basic text helpers
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::iter::Peekable;
use std::str::Chars;

use crate::interpreter::{Interpreter, NativeArity, RuntimeError, Value};

use super::{ModuleBuilder, expect_integer, expect_number, expect_str};

const MAX_REPEAT_BYTES: usize = 64 * 1024 * 1024;

pub fn register(interpreter: &mut Interpreter) {
    let module = ModuleBuilder::default()
        .function(
            "format",
            NativeArity::Range { min: 1, max: None },
            |_interp, args| {
                let template = expect_str(&args[0], "string.format")?;
                Ok(Value::String(format(template, &args[1..])?))
            },
        )
        .function(
            "rep",
            NativeArity::Range {
                min: 2,
                max: Some(3),
            },
            |_interp, args| {
                let text = expect_str(&args[0], "string.rep")?;
                let count = expect_integer(&args[1], "string.rep")?.max(0) as usize;
                let separator = match args.get(2) {
                    Some(value) => expect_str(value, "string.rep")?,
                    None => "",
                };
                let total = (text.len() + separator.len()).saturating_mul(count);
                if total > MAX_REPEAT_BYTES {
                    return Err(RuntimeError::ArgumentError(
                        "string.rep: resulting string too large".into(),
                    ));
                }
                Ok(Value::String(vec![text; count].join(separator)))
            },
        )
        .function("upper", NativeArity::Exact(1), |_interp, args| {
            Ok(Value::String(expect_str(&args[0], "string.upper")?.to_uppercase()))
        })
        .function("lower", NativeArity::Exact(1), |_interp, args| {
            Ok(Value::String(expect_str(&args[0], "string.lower")?.to_lowercase()))
        })
        .function("len", NativeArity::Exact(1), |_interp, args| {
            Ok(Value::Int(expect_str(&args[0], "string.len")?.len() as i64))
        })
        .build();
    interpreter.define_global("string", module);
}

//=============================================
//            Section 1: printf-style formatting
//=============================================

#[derive(Debug, Default)]
struct Conversion {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Render `template` the way C's `printf` would for the supported
/// conversions (`%d %i %x %X %f %F %e %E %g %G %s %%`).
pub fn format(template: &str, args: &[Value]) -> Result<String, RuntimeError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut directive = Conversion::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left = true,
                '+' => directive.plus = true,
                ' ' => directive.space = true,
                '0' => directive.zero = true,
                '#' => directive.alternate = true,
                _ => break,
            }
            chars.next();
        }
        directive.width = read_digits(&mut chars)?.unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(read_digits(&mut chars)?.unwrap_or(0));
        }

        let conversion = chars.next().ok_or_else(|| {
            RuntimeError::ArgumentError("string.format: incomplete conversion at end of format".into())
        })?;
        let arg = args.get(next_arg).ok_or_else(|| {
            RuntimeError::ArgumentError(format!(
                "string.format: bad argument #{} (no value)",
                next_arg + 2
            ))
        })?;
        next_arg += 1;
        out.push_str(&render(&directive, conversion, arg)?);
    }
    Ok(out)
}

fn read_digits(chars: &mut Peekable<Chars<'_>>) -> Result<Option<usize>, RuntimeError> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        let next = value.unwrap_or(0) * 10 + digit as usize;
        if next > 99 {
            return Err(RuntimeError::ArgumentError(
                "string.format: width or precision too long".into(),
            ));
        }
        value = Some(next);
    }
    Ok(value)
}

fn render(directive: &Conversion, conversion: char, arg: &Value) -> Result<String, RuntimeError> {
    let (sign, body, zero_pad) = match conversion {
        'd' | 'i' => {
            let value = integer_arg(arg)?;
            let mut digits = value.unsigned_abs().to_string();
            if let Some(precision) = directive.precision {
                digits = format!("{:0>precision$}", digits);
            }
            (sign_prefix(value < 0, directive), digits, directive.precision.is_none())
        }
        'x' | 'X' => {
            let value = integer_arg(arg)? as u64;
            let mut digits = format!("{:x}", value);
            let mut prefix = String::new();
            if directive.alternate && value != 0 {
                prefix.push_str("0x");
            }
            if conversion == 'X' {
                digits = digits.to_uppercase();
                prefix = prefix.to_uppercase();
            }
            (prefix, digits, true)
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let value = expect_number(arg, "string.format")?;
            let negative = value.is_sign_negative() && !value.is_nan();
            let body = float_body(value.abs(), conversion, directive);
            (sign_prefix(negative, directive), body, value.is_finite())
        }
        's' => {
            let mut text = arg.to_string();
            if let Some(precision) = directive.precision {
                text = text.chars().take(precision).collect();
            }
            (String::new(), text, false)
        }
        other => {
            return Err(RuntimeError::ArgumentError(format!(
                "string.format: invalid conversion '%{}'",
                other
            )));
        }
    };
    Ok(pad(directive, sign, body, zero_pad))
}

fn integer_arg(arg: &Value) -> Result<i64, RuntimeError> {
    match arg {
        Value::Int(value) => Ok(*value),
        Value::Float(_) => arg.as_integer().ok_or_else(|| {
            RuntimeError::ArgumentError(format!(
                "string.format: number {} has no integer representation",
                arg
            ))
        }),
        other => Err(RuntimeError::TypeError(format!(
            "string.format expects numeric argument, got {}",
            other.type_name()
        ))),
    }
}

fn sign_prefix(negative: bool, directive: &Conversion) -> String {
    if negative {
        "-".into()
    } else if directive.plus {
        "+".into()
    } else if directive.space {
        " ".into()
    } else {
        String::new()
    }
}

fn pad(directive: &Conversion, sign: String, body: String, zero_pad: bool) -> String {
    let length = sign.chars().count() + body.chars().count();
    if length >= directive.width {
        return sign + &body;
    }
    let fill = directive.width - length;
    if directive.left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if directive.zero && zero_pad {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}

fn float_body(magnitude: f64, conversion: char, directive: &Conversion) -> String {
    let upper = conversion.is_ascii_uppercase();
    let text = if magnitude.is_nan() {
        "nan".to_string()
    } else if magnitude.is_infinite() {
        "inf".to_string()
    } else {
        let precision = directive.precision.unwrap_or(6);
        match conversion.to_ascii_lowercase() {
            'f' => {
                let mut text = format!("{:.*}", precision, magnitude);
                if directive.alternate && precision == 0 {
                    text.push('.');
                }
                text
            }
            'e' => exponent_form(magnitude, precision, directive.alternate),
            _ => general_form(magnitude, precision, directive.alternate),
        }
    };
    if upper { text.to_uppercase() } else { text }
}

/// `d.ddde±XX`, with at least two exponent digits like C.
fn exponent_form(magnitude: f64, precision: usize, alternate: bool) -> String {
    let raw = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut mantissa = mantissa.to_string();
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    format!(
        "{}e{}{:02}",
        mantissa,
        if exponent < 0 { '-' } else { '+' },
        exponent.unsigned_abs()
    )
}

fn general_form(magnitude: f64, precision: usize, alternate: bool) -> String {
    let significant = precision.max(1);
    let exponent = if magnitude == 0.0 {
        0
    } else {
        let raw = format!("{:.*e}", significant - 1, magnitude);
        raw.split_once('e')
            .and_then(|(_, exponent)| exponent.parse::<i32>().ok())
            .unwrap_or(0)
    };
    let text = if exponent >= -4 && exponent < significant as i32 {
        let decimals = (significant as i32 - 1 - exponent) as usize;
        format!("{:.*}", decimals, magnitude)
    } else {
        exponent_form(magnitude, significant - 1, alternate)
    };
    if alternate {
        text
    } else {
        strip_trailing_zeros(&text)
    }
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exponent) = match text.find('e') {
        Some(index) => text.split_at(index),
        None => (text, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exponent}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(template: &str, args: &[Value]) -> String {
        format(template, args).unwrap()
    }

    #[test]
    fn test_fixed_matches_printf() {
        assert_eq!(fmt("%f", &[Value::Float(std::f64::consts::PI)]), "3.141593");
        assert_eq!(fmt("%f", &[Value::Float(-1.2246467991473532e-16)]), "-0.000000");
        assert_eq!(fmt("%f", &[Value::Int(-1)]), "-1.000000");
        assert_eq!(fmt("%.2f|%8.3f|%-8.1f|", &[Value::Float(2.345), Value::Float(1.5), Value::Float(1.5)]),
            "2.35|   1.500|1.5     |");
        assert_eq!(fmt("%+.1f %+.1f", &[Value::Float(1.0), Value::Float(-1.0)]), "+1.0 -1.0");
        assert_eq!(fmt("%08.3f", &[Value::Float(-3.14159)]), "-003.142");
    }

    #[test]
    fn test_assertion_line_shape() {
        let line = fmt(
            "assert(fabs(%s(%f) - %f) < 1e-6);",
            &[
                Value::String("cos".into()),
                Value::Float(-std::f64::consts::PI),
                Value::Float(-1.0),
            ],
        );
        assert_eq!(line, "assert(fabs(cos(-3.141593) - -1.000000) < 1e-6);");
    }

    #[test]
    fn test_exponent_and_general() {
        assert_eq!(fmt("%e", &[Value::Float(1e-6)]), "1.000000e-06");
        assert_eq!(fmt("%.2E", &[Value::Float(12345.678)]), "1.23E+04");
        assert_eq!(fmt("%g", &[Value::Float(0.0001)]), "0.0001");
        assert_eq!(fmt("%g", &[Value::Float(0.00001)]), "1e-05");
        assert_eq!(fmt("%g", &[Value::Float(123456789.0)]), "1.23457e+08");
        assert_eq!(fmt("%g", &[Value::Float(100.0)]), "100");
        assert_eq!(fmt("%g", &[Value::Float(0.0)]), "0");
        assert_eq!(fmt("%f %e", &[Value::Float(f64::INFINITY), Value::Float(f64::NAN)]), "inf nan");
    }

    #[test]
    fn test_integers_and_strings() {
        assert_eq!(fmt("%d|%5d|%-5i|%05d", &[Value::Int(42), Value::Int(-7), Value::Int(3), Value::Int(-42)]),
            "42|   -7|3    |-0042");
        assert_eq!(fmt("%x %X %#x", &[Value::Int(255), Value::Int(255), Value::Int(16)]), "ff FF 0x10");
        assert_eq!(fmt("%.3d", &[Value::Int(7)]), "007");
        assert_eq!(fmt("[%5s][%-5s][%.2s]", &[
            Value::String("ab".into()),
            Value::String("ab".into()),
            Value::String("abc".into()),
        ]), "[   ab][ab   ][ab]");
        assert_eq!(fmt("%s %s", &[Value::Nil, Value::Float(2.0)]), "nil 2.0");
        assert_eq!(fmt("100%%", &[]), "100%");
    }

    #[test]
    fn test_format_errors() {
        assert!(format("%d", &[]).is_err());
        assert!(format("%d", &[Value::Float(1.5)]).is_err());
        assert!(format("%q", &[Value::Int(1)]).is_err());
        assert!(format("%", &[Value::Int(1)]).is_err());
        assert!(format("%123d", &[Value::Int(1)]).is_err());
        assert!(format("%d", &[Value::String("1".into())]).is_err());
    }

    #[test]
    fn test_text_helpers() {
        let mut interpreter = Interpreter::with_std().unwrap();
        let mut eval = |source: &str| interpreter.eval_source(source, 1, 1).unwrap();
        assert_eq!(eval("string.rep(\"ab\", 3, \"-\")"), Value::String("ab-ab-ab".into()));
        assert_eq!(eval("string.rep(\"ab\", 0)"), Value::String(String::new()));
        assert_eq!(eval("string.upper(\"cos\")"), Value::String("COS".into()));
        assert_eq!(eval("string.lower(\"SIN\")"), Value::String("sin".into()));
        assert_eq!(eval("string.len(\"tan\")"), Value::Int(3));
        assert_eq!(eval("string.format(\"%d-%s\", 3, \"x\")"), Value::String("3-x".into()));
    }
}

//=============================================
// End of file
//=============================================
