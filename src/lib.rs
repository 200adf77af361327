// File: src/lib.rs
//
// Library interface for the Quasi expression language.
// Source text flows through `lexer::tokenize`, `parser::parse` and
// `interpreter::evaluate`; `interpreter::Interpreter` runs that pipeline one
// line at a time against a persistent environment.

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod source;
