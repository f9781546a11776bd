//==============================================
// File: runtime.rs
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Expansion sessions shared by the CLI and the tests
// Objective: Prepare one expander from config and options, expand inputs, write output
//==============================================

//==============================================
// Import & Modules
//==============================================

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ExpandConfig;
use crate::interpreter::{ExpansionContext, ScriptError, Value};
use crate::parser::parse_expression_at;
use crate::template::{ExpandError, Expander};

/// Input name that reads the template from stdin.
pub const STDIN_INPUT: &str = "-";

//==============================================
// Section 1.0 - Options & Errors
//==============================================

#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub libraries: Vec<PathBuf>,
    /// Chunks run after libraries and definitions, before any template.
    pub chunks: Vec<String>,
    /// `NAME=VALUE` definitions, already split.
    pub defines: Vec<(String, String)>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start interpreter: {0}")]
    Startup(#[from] ScriptError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("invalid definition '{0}': expected NAME=VALUE")]
    Definition(String),
}

/// Split `NAME=VALUE`; the name must be a valid identifier.
pub fn parse_definition(text: &str) -> Result<(String, String), SessionError> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| SessionError::Definition(text.to_string()))?;
    let name = name.trim();
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(SessionError::Definition(text.to_string()));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Command-line values become booleans or numbers when they read as one,
/// strings otherwise.
pub fn definition_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Value::Int(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Value::Float(value),
        _ => Value::String(raw.to_string()),
    }
}

//==============================================
// Section 2.0 - Session
//==============================================

pub struct ExpandSession {
    expander: Expander,
    options: ExpandOptions,
}

impl ExpandSession {
    /// Build the expander: config libraries, CLI libraries, config vars,
    /// CLI definitions, then `-e` chunks, in that order.
    pub fn new(options: ExpandOptions, config: &ExpandConfig) -> Result<Self, SessionError> {
        let mut expander = Expander::new()?;
        expander.set_context(ExpansionContext {
            input_files: options.inputs.iter().map(|path| display(path)).collect(),
            output_file: options.output.as_deref().map(display),
        });

        for library in config.libraries.iter().chain(&options.libraries) {
            expander.load_library(library)?;
        }
        for (name, value) in config.script_vars() {
            expander.define(&name, value);
        }
        for (name, raw) in &options.defines {
            expander.define(name, definition_value(raw));
        }
        for (index, chunk) in options.chunks.iter().enumerate() {
            expander.run_chunk(chunk, &format!("<-e #{}>", index + 1))?;
        }

        Ok(Self { expander, options })
    }

    pub fn expander(&mut self) -> &mut Expander {
        &mut self.expander
    }

    /// Expand every input in order and concatenate the results.
    pub fn expand(&mut self) -> Result<String, SessionError> {
        let mut out = String::new();
        for input in &self.options.inputs {
            let expanded = if input.as_os_str() == STDIN_INPUT {
                let mut template = String::new();
                io::stdin()
                    .read_to_string(&mut template)
                    .map_err(SessionError::Stdin)?;
                self.expander.expand_str(&template, "<stdin>")?
            } else {
                self.expander.expand_file(input)?
            };
            info!(input = %input.display(), bytes = expanded.len(), "expanded input");
            out.push_str(&expanded);
        }
        Ok(out)
    }

    /// Expand and write to the configured output. Returns the text instead
    /// when no output file was given.
    pub fn run(mut self) -> Result<Option<String>, SessionError> {
        let text = self.expand()?;
        match &self.options.output {
            Some(path) => {
                write_output(path, &text)?;
                Ok(None)
            }
            None => Ok(Some(text)),
        }
    }

    /// Evaluate `code` as an expression when it parses as one, otherwise
    /// run it as a chunk.
    pub fn evaluate(&mut self, code: &str) -> Result<Option<Value>, SessionError> {
        if parse_expression_at(code, 1, 1).is_ok() {
            let value = self
                .expander
                .interpreter()
                .eval_source(code, 1, 1)
                .map_err(|error| ExpandError::Script {
                    origin: "<eval>".to_string(),
                    error,
                })?;
            return Ok(Some(value));
        }
        Ok(self.expander.run_chunk(code, "<eval>")?)
    }
}

fn write_output(path: &Path, text: &str) -> Result<(), SessionError> {
    let write_error = |source| SessionError::Write {
        path: display(path),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, text).map_err(write_error)?;
    debug!(output = %path.display(), bytes = text.len(), "wrote output");
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

//==============================================
// Section 3.0 - Tests
//==============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        assert_eq!(
            parse_definition("n=8").unwrap(),
            ("n".to_string(), "8".to_string())
        );
        assert_eq!(
            parse_definition("label=a=b").unwrap(),
            ("label".to_string(), "a=b".to_string())
        );
        assert!(parse_definition("novalue").is_err());
        assert!(parse_definition("1n=3").is_err());
        assert!(parse_definition("=3").is_err());
    }

    #[test]
    fn test_definition_values() {
        assert_eq!(definition_value("8"), Value::Int(8));
        assert_eq!(definition_value("1e-4"), Value::Float(1e-4));
        assert_eq!(definition_value("true"), Value::Bool(true));
        assert_eq!(definition_value("inf"), Value::String("inf".into()));
        assert_eq!(definition_value("cos"), Value::String("cos".into()));
    }

    #[test]
    fn test_session_order_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("lib.cx");
        fs::write(&library, "function double(x) return 2 * x end\nn = 1\n").unwrap();
        let input = dir.path().join("in.c");
        fs::write(&input, "$(double(n)) $(label)\n").unwrap();
        let output = dir.path().join("nested").join("out.c");

        let config = ExpandConfig::parse("[vars]\nn = 2\nlabel = \"cfg\"\n").unwrap();
        let options = ExpandOptions {
            inputs: vec![input],
            output: Some(output.clone()),
            libraries: vec![library],
            chunks: vec!["n = n + 1".to_string()],
            defines: vec![("label".to_string(), "cli".to_string())],
        };
        let session = ExpandSession::new(options, &config).unwrap();
        assert_eq!(session.run().unwrap(), None);
        assert_eq!(fs::read_to_string(output).unwrap(), "6 cli\n");
    }

    #[test]
    fn test_session_returns_text_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.c");
        let second = dir.path().join("b.c");
        fs::write(&first, ":(count = 1)A$(count)\n").unwrap();
        fs::write(&second, "B$(count + 1) $(output_file())\n").unwrap();

        let options = ExpandOptions {
            inputs: vec![first, second],
            ..ExpandOptions::default()
        };
        let session = ExpandSession::new(options, &ExpandConfig::default()).unwrap();
        assert_eq!(session.run().unwrap().as_deref(), Some("A1\nB2 \n"));
    }

    #[test]
    fn test_evaluate_expression_or_chunk() {
        let mut session =
            ExpandSession::new(ExpandOptions::default(), &ExpandConfig::default()).unwrap();
        assert_eq!(session.evaluate("1 + 1").unwrap(), Some(Value::Int(2)));
        assert_eq!(session.evaluate("x = 5").unwrap(), None);
        assert_eq!(session.evaluate("return x * 2").unwrap(), Some(Value::Int(10)));
    }

    #[test]
    fn test_missing_library_is_reported() {
        let options = ExpandOptions {
            libraries: vec![PathBuf::from("/nonexistent/lib.cx")],
            ..ExpandOptions::default()
        };
        let err = ExpandSession::new(options, &ExpandConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::Expand(ExpandError::Io { .. })));
    }
}

//==============================================
// End of file
//==============================================
