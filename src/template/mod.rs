//=============================================
// cexpand/template.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Template scanning for `$(...)` and `:(...)` macros
// Objective: Split template text into literal segments and positioned macros
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

mod expander;

use thiserror::Error;

use crate::interpreter::ScriptError;
use crate::tokenizer::Position;

pub use expander::{Expander, render_value};

//=============================================
//            Section 2: Segments & Errors
//=============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    /// `$(expr)`: substitute the value of an expression.
    Expression,
    /// `:(chunk)`: run statements, substituting any returned value.
    Chunk,
}

impl MacroKind {
    pub fn opener(self) -> &'static str {
        match self {
            MacroKind::Expression => "$(",
            MacroKind::Chunk => ":(",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub kind: MacroKind,
    pub body: String,
    /// Position of the first character of the body.
    pub position: Position,
    /// Leading whitespace of the macro's line when nothing else precedes it.
    pub indent: Option<String>,
    /// A chunk alone on its line; its line break has been dropped.
    pub standalone: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Macro(Macro),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("unterminated `{opener}` macro starting at {position}")]
    Unterminated {
        opener: &'static str,
        position: Position,
    },
    #[error("cannot render a {type_name} value into the template at {position}")]
    Unrenderable {
        type_name: &'static str,
        position: Position,
    },
}

impl TemplateError {
    pub fn position(&self) -> Position {
        match self {
            TemplateError::Unterminated { position, .. }
            | TemplateError::Unrenderable { position, .. } => *position,
        }
    }
}

/// Failure while expanding one template, tagged with where it came from.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("{origin}: {source}")]
    Template {
        origin: String,
        #[source]
        source: TemplateError,
    },
    #[error("{}: {error}", locate(.origin, .error))]
    Script { origin: String, error: ScriptError },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn locate(origin: &str, error: &ScriptError) -> String {
    match error.position {
        Some(position) => format!("{}:{}:{}", origin, position.line, position.column),
        None => origin.to_string(),
    }
}

//=============================================
//            Section 3: Scanner
//=============================================

/// Split a template into text and macro segments.
pub fn scan(template: &str) -> Result<Vec<Segment>, TemplateError> {
    Scanner::new(template).scan()
}

struct Scanner {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    line_start: usize,
    segments: Vec<Segment>,
    text: String,
}

impl Scanner {
    fn new(template: &str) -> Self {
        Self {
            input: template.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            line_start: 0,
            segments: Vec::new(),
            text: String::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Segment>, TemplateError> {
        while !self.is_at_end() {
            if self.starts_with("$$(") || self.starts_with("::(") {
                // Escaped opener: keep one marker character and the paren.
                self.advance();
                let marker = self.advance();
                let paren = self.advance();
                self.text.push(marker);
                self.text.push(paren);
            } else if self.starts_with("$(") {
                self.scan_macro(MacroKind::Expression)?;
            } else if self.starts_with(":(") {
                self.scan_macro(MacroKind::Chunk)?;
            } else {
                let ch = self.advance();
                self.text.push(ch);
            }
        }
        self.flush_text();
        Ok(self.segments)
    }

    fn scan_macro(&mut self, kind: MacroKind) -> Result<(), TemplateError> {
        let opener_position = self.current_position();
        let prefix: String = self.input[self.line_start..self.position].iter().collect();
        let indent = prefix
            .chars()
            .all(|c| c == ' ' || c == '\t')
            .then(|| prefix.clone());

        self.advance();
        self.advance();
        let body_position = self.current_position();
        let body_start = self.position;
        let body_end = self.find_closing_paren().ok_or(TemplateError::Unterminated {
            opener: kind.opener(),
            position: opener_position,
        })?;
        let body: String = self.input[body_start..body_end].iter().collect();
        while self.position <= body_end {
            self.advance();
        }

        let standalone =
            kind == MacroKind::Chunk && indent.is_some() && self.rest_of_line_is_blank();
        if standalone {
            let kept = self.text.len().saturating_sub(prefix.len());
            self.text.truncate(kept);
            self.skip_line();
            if self.at_empty_line() {
                self.skip_line();
            }
        }

        self.flush_text();
        self.segments.push(Segment::Macro(Macro {
            kind,
            body,
            position: body_position,
            indent,
            standalone,
        }));
        Ok(())
    }

    /// Index of the `)` closing the macro opened just before the cursor.
    /// Parentheses inside string literals and `--` comments do not count.
    fn find_closing_paren(&self) -> Option<usize> {
        let mut depth = 1usize;
        let mut index = self.position;
        while index < self.input.len() {
            match self.input[index] {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                quote @ ('"' | '\'') => {
                    index += 1;
                    while index < self.input.len()
                        && self.input[index] != quote
                        && self.input[index] != '\n'
                    {
                        if self.input[index] == '\\' {
                            index += 1;
                        }
                        index += 1;
                    }
                }
                '-' if self.input.get(index + 1) == Some(&'-') => {
                    while index < self.input.len() && self.input[index] != '\n' {
                        index += 1;
                    }
                    continue;
                }
                _ => {}
            }
            index += 1;
        }
        None
    }

    fn rest_of_line_is_blank(&self) -> bool {
        self.input[self.position..]
            .iter()
            .take_while(|&&c| c != '\n')
            .all(|c| c.is_whitespace())
    }

    fn at_empty_line(&self) -> bool {
        matches!(
            (self.input.get(self.position), self.input.get(self.position + 1)),
            (Some('\n'), _) | (Some('\r'), Some('\n'))
        )
    }

    /// Consume up to and including the next line break.
    fn skip_line(&mut self) {
        while !self.is_at_end() {
            if self.advance() == '\n' {
                break;
            }
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.segments
                .push(Segment::Text(std::mem::take(&mut self.text)));
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        let mut index = self.position;
        for expected in pattern.chars() {
            if self.input.get(index) != Some(&expected) {
                return false;
            }
            index += 1;
        }
        true
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn advance(&mut self) -> char {
        let ch = self.input[self.position];
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
            self.line_start = self.position;
        } else {
            self.column += 1;
        }
        ch
    }
}

//=============================================
//            Section 4: Tests
//=============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn macro_at(segments: &[Segment], index: usize) -> &Macro {
        match &segments[index] {
            Segment::Macro(found) => found,
            other => panic!("expected macro, found {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_one_segment() {
        let segments = scan("int main(void) { return (0); }\n").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Text("int main(void) { return (0); }\n".into())]
        );
        assert!(scan("").unwrap().is_empty());
    }

    #[test]
    fn test_inline_expression_has_no_indent() {
        let segments = scan("/** \\file $(input_files())\n").unwrap();
        assert_eq!(segments.len(), 3);
        let found = macro_at(&segments, 1);
        assert_eq!(found.kind, MacroKind::Expression);
        assert_eq!(found.body, "input_files()");
        assert_eq!((found.position.line, found.position.column), (1, 13));
        assert_eq!(found.indent, None);
        assert!(!found.standalone);
    }

    #[test]
    fn test_indented_expression_records_indent() {
        let segments = scan("{\n    $(test_f1 \"cos\" (angles))\n}").unwrap();
        let found = macro_at(&segments, 1);
        assert_eq!(found.indent.as_deref(), Some("    "));
        assert_eq!(found.body, "test_f1 \"cos\" (angles)");
        assert_eq!(segments[0], Segment::Text("{\n    ".into()));
        assert_eq!(segments[2], Segment::Text("\n}".into()));
    }

    #[test]
    fn test_standalone_chunk_swallows_its_line_and_one_blank() {
        let source = "#include <assert.h>\n\n:(  local n = 8\n    angles = n\n)\n\nint main\n";
        let segments = scan(source).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Text("#include <assert.h>\n\n".into()));
        let found = macro_at(&segments, 1);
        assert!(found.standalone);
        assert_eq!(found.body, "  local n = 8\n    angles = n\n");
        assert_eq!((found.position.line, found.position.column), (3, 3));
        assert_eq!(segments[2], Segment::Text("int main\n".into()));
    }

    #[test]
    fn test_inline_chunk_keeps_surroundings() {
        let segments = scan("a :(x = 1) b\n").unwrap();
        assert_eq!(segments[0], Segment::Text("a ".into()));
        assert!(!macro_at(&segments, 1).standalone);
        assert_eq!(segments[2], Segment::Text(" b\n".into()));
    }

    #[test]
    fn test_parens_in_strings_and_comments() {
        let segments = scan("$(f(\")\", ')') -- )\n)").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(macro_at(&segments, 0).body, "f(\")\", ')') -- )\n");
    }

    #[test]
    fn test_escapes() {
        let segments = scan("cost $$(x) and ::(y)").unwrap();
        assert_eq!(segments, vec![Segment::Text("cost $(x) and :(y)".into())]);
    }

    #[test]
    fn test_unterminated_macro() {
        let err = scan("line\n  $(foo(1)\n").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unterminated {
                opener: "$(",
                position: Position::new(2, 3, 7),
            }
        );
        assert!(err.to_string().contains("line 2, column 3"));
    }
}

//=============================================
// End of file
//=============================================
