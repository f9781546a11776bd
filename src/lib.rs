//=============================================
// cexpand/lib.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Library root for the cexpand template expander
// Objective: Expose the expression engine, template expansion, sessions and verification
// Formatting: Zobie.format (.solvraformat)
//=============================================

pub mod ast;
pub mod config;
pub mod interpreter;
pub mod parser;
pub mod runtime;
pub mod stdlib;
pub mod template;
pub mod tokenizer;
pub mod verify;

pub use config::ExpandConfig;
pub use interpreter::{Interpreter, ScriptError, Value};
pub use runtime::{ExpandOptions, ExpandSession, SessionError};
pub use template::{ExpandError, Expander};

//=============================================
// End of file
//=============================================
