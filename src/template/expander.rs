//=============================================
// cexpand/template/expander.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Evaluate template macros against one shared interpreter
// Objective: Produce expanded text from scanned segments
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use super::{ExpandError, MacroKind, Segment, TemplateError, scan};
use crate::interpreter::{ExpansionContext, Interpreter, ScriptError, Value};
use crate::tokenizer::Position;

/// Drives template expansion. Every macro of every template expanded by
/// one `Expander` sees the same globals, in document order.
pub struct Expander {
    interpreter: Interpreter,
}

impl Expander {
    pub fn new() -> Result<Self, ScriptError> {
        Ok(Self {
            interpreter: Interpreter::with_std()?,
        })
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn set_context(&mut self, context: ExpansionContext) {
        self.interpreter.set_context(context);
    }

    pub fn define(&mut self, name: &str, value: Value) {
        debug!(name, "defining global");
        self.interpreter.define_global(name, value);
    }

    /// Run a chunk of statements; `origin` names it in error messages.
    pub fn run_chunk(&mut self, source: &str, origin: &str) -> Result<Option<Value>, ExpandError> {
        self.interpreter
            .run_source(source, 1, 1)
            .map_err(|error| script_error(origin, error))
    }

    pub fn load_library(&mut self, path: &Path) -> Result<(), ExpandError> {
        let origin = path.display().to_string();
        let source = read(path)?;
        debug!(library = %origin, "loading library");
        self.run_chunk(&source, &origin)?;
        Ok(())
    }

    pub fn expand_file(&mut self, path: &Path) -> Result<String, ExpandError> {
        let template = read(path)?;
        self.expand_str(&template, &path.display().to_string())
    }

    pub fn expand_str(&mut self, template: &str, origin: &str) -> Result<String, ExpandError> {
        let segments = scan(template).map_err(|source| template_error(origin, source))?;
        let mut out = String::with_capacity(template.len());

        for segment in segments {
            let found = match segment {
                Segment::Text(text) => {
                    out.push_str(&text);
                    continue;
                }
                Segment::Macro(found) => found,
            };
            trace!(
                origin,
                line = found.position.line,
                kind = ?found.kind,
                "expanding macro"
            );
            let (line, column) = (found.position.line, found.position.column);
            let value = match found.kind {
                MacroKind::Expression => self
                    .interpreter
                    .eval_source(&found.body, line, column)
                    .map(Some),
                MacroKind::Chunk => self.interpreter.run_source(&found.body, line, column),
            }
            .map_err(|error| script_error(origin, error))?;

            let rendered = match value {
                Some(value) => {
                    render_value(&value, found.position).map_err(|source| template_error(origin, source))?
                }
                None => String::new(),
            };
            let indent = found.indent.as_deref().unwrap_or("");
            let rendered = reindent(&rendered, indent);

            if found.standalone {
                // The chunk's own line is gone; give any output a line of its own.
                if !rendered.is_empty() {
                    out.push_str(indent);
                    out.push_str(&rendered);
                    out.push('\n');
                }
            } else {
                out.push_str(&rendered);
            }
        }

        debug!(origin, bytes = out.len(), "template expanded");
        Ok(out)
    }
}

/// Text substituted for a macro value. `nil` is empty and lists put each
/// element on its own line.
pub fn render_value(value: &Value, position: Position) -> Result<String, TemplateError> {
    match value {
        Value::Nil => Ok(String::new()),
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => Ok(value.to_string()),
        Value::List(items) => {
            let lines = items
                .borrow()
                .iter()
                .map(|item| render_value(item, position))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        }
        Value::Table(_) | Value::Function(_) | Value::Native(_) => {
            Err(TemplateError::Unrenderable {
                type_name: value.type_name(),
                position,
            })
        }
    }
}

/// Prefix continuation lines with `indent`, leaving empty lines empty.
fn reindent(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn read(path: &Path) -> Result<String, ExpandError> {
    fs::read_to_string(path).map_err(|source| ExpandError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn script_error(origin: &str, error: ScriptError) -> ExpandError {
    ExpandError::Script {
        origin: origin.to_string(),
        error,
    }
}

fn template_error(origin: &str, source: TemplateError) -> ExpandError {
    ExpandError::Template {
        origin: origin.to_string(),
        source,
    }
}


//=============================================
// End of file
//=============================================
