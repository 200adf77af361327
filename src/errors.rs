// File: src/errors.rs
//
// Error handling and reporting for the Quasi expression language.
// Each stage (tokenizer, parser, evaluator, function-table scanner) has its own
// error family; `QuasiError` unifies them and `Diagnostic` renders any of them
// with source context and colored output.

use crate::lexer::OperatorKind;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column, file: None }
    }

    pub fn with_file(line: usize, column: usize, file: String) -> Self {
        Self { line, column, file: Some(file) }
    }

    /// Location for nodes that were built by hand rather than from source text
    pub fn unknown() -> Self {
        Self { line: 0, column: 0, file: None }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Malformed input text, raised by the tokenizer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("invalid character '{ch}'")]
    InvalidCharacter { ch: char, location: SourceLocation },

    #[error("invalid number literal '{literal}'")]
    InvalidNumber { literal: String, location: SourceLocation },

    #[error("unknown operator '{op}'")]
    UnknownOperator { op: String, location: SourceLocation },

    #[error("tried to push an empty token buffer")]
    EmptyToken { location: SourceLocation },
}

impl LexError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            LexError::InvalidCharacter { location, .. }
            | LexError::InvalidNumber { location, .. }
            | LexError::UnknownOperator { location, .. }
            | LexError::EmptyToken { location } => location,
        }
    }
}

/// A token sequence that cannot form an expression tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected an expression, found no input")]
    EmptyInput,

    #[error("unmatched parenthesis")]
    UnmatchedParen { location: SourceLocation },

    #[error("unexpected operator '{op}', expected identifier or scalar")]
    UnexpectedOperator { op: OperatorKind, location: SourceLocation },

    #[error("expected an operator, found '{found}'")]
    ExpectedOperator { found: String, location: SourceLocation },

    #[error("'{found}' cannot appear in an expression")]
    UnexpectedToken { found: String, location: SourceLocation },

    #[error("'{after}' is missing an operand")]
    MissingOperand { after: String, location: SourceLocation },
}

impl ParseError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ParseError::EmptyInput => None,
            ParseError::UnmatchedParen { location }
            | ParseError::UnexpectedOperator { location, .. }
            | ParseError::ExpectedOperator { location, .. }
            | ParseError::UnexpectedToken { location, .. }
            | ParseError::MissingOperand { location, .. } => Some(location),
        }
    }
}

/// Failures while walking an expression tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("variable '{name}' is not defined")]
    UndefinedVariable { name: String, location: SourceLocation },

    #[error("cannot assign to '{found}'")]
    InvalidAssignmentTarget { found: String, location: SourceLocation },

    /// The parser produced a shape the evaluator cannot walk
    #[error("malformed expression tree: {reason}")]
    MalformedTree { reason: String },
}

impl EvalError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            EvalError::UndefinedVariable { location, .. }
            | EvalError::InvalidAssignmentTarget { location, .. } => Some(location),
            EvalError::MalformedTree { .. } => None,
        }
    }
}

/// Failures while building a function table from a source file
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("fn expected a return type or identifier, found '{found}'")]
    ExpectedNameOrType { found: String, location: SourceLocation },

    #[error("expected a return type, found '{found}'")]
    ExpectedReturnType { found: String, location: SourceLocation },

    #[error("malformed parameter list")]
    MalformedParameters { location: SourceLocation },

    #[error("function body is never closed")]
    UnterminatedBody { location: SourceLocation },

    #[error("function declaration has no body or ';'")]
    MissingBody { location: SourceLocation },
}

impl SourceError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            SourceError::ExpectedNameOrType { location, .. }
            | SourceError::ExpectedReturnType { location, .. }
            | SourceError::MalformedParameters { location }
            | SourceError::UnterminatedBody { location }
            | SourceError::MissingBody { location } => location,
        }
    }
}

/// Any failure produced while processing one unit of input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuasiError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl QuasiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuasiError::Lex(_) => ErrorKind::LexError,
            QuasiError::Parse(_) => ErrorKind::ParseError,
            QuasiError::Eval(EvalError::UndefinedVariable { .. }) => ErrorKind::UndefinedVariable,
            QuasiError::Eval(EvalError::MalformedTree { .. }) => ErrorKind::InternalError,
            QuasiError::Eval(_) => ErrorKind::RuntimeError,
            QuasiError::Source(_) => ErrorKind::SourceError,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            QuasiError::Lex(e) => Some(e.location()),
            QuasiError::Parse(e) => e.location(),
            QuasiError::Eval(e) => e.location(),
            QuasiError::Source(e) => Some(e.location()),
        }
    }
}

/// Types of errors that can occur in Quasi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
    UndefinedVariable,
    SourceError,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "Lex Error"),
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
            ErrorKind::UndefinedVariable => write!(f, "Undefined Variable"),
            ErrorKind::SourceError => write!(f, "Source Error"),
            ErrorKind::InternalError => write!(f, "Internal Error"),
        }
    }
}

/// A rendered error report with location and source context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub source_line: Option<String>,
    pub suggestion: Option<String>,
    pub help: Option<String>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: String, location: Option<SourceLocation>) -> Self {
        Self {
            kind,
            message,
            location,
            source_line: None,
            suggestion: None,
            help: None,
            note: None,
        }
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }

    /// Builds a report for `err`, pulling the offending line out of `source`.
    ///
    /// `known_names` are the variables bound at the time of the failure; they
    /// feed the "Did you mean" suggestion for undefined variables.
    pub fn from_error(err: &QuasiError, source: &str, known_names: &[String]) -> Self {
        let location = err.location().filter(|l| l.is_known()).cloned();
        let mut diagnostic = Diagnostic::new(err.kind(), err.to_string(), location.clone());

        if let Some(line) = location.and_then(|l| source.lines().nth(l.line - 1)) {
            diagnostic = diagnostic.with_source(line.to_string());
        }

        match err {
            QuasiError::Lex(LexError::EmptyToken { .. }) => diagnostic.with_note(
                "the tokenizer reached an inconsistent state; please report this input".into(),
            ),
            QuasiError::Parse(ParseError::UnmatchedParen { .. }) => {
                diagnostic.with_help("every '(' needs a matching ')'".into())
            }
            QuasiError::Eval(EvalError::UndefinedVariable { name, .. }) => {
                match find_closest_match(name, known_names) {
                    Some(close) => diagnostic.with_suggestion(close.to_string()),
                    None => diagnostic.with_help(format!("assign it first, e.g. `{} = 0`", name)),
                }
            }
            QuasiError::Eval(EvalError::InvalidAssignmentTarget { .. }) => diagnostic
                .with_help("only a variable name may appear on the left of '='".into()),
            QuasiError::Eval(EvalError::MalformedTree { .. }) => diagnostic
                .with_note("the parser produced an invalid tree; please report this input".into()),
            _ => diagnostic,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if let Some(ref location) = self.location {
            let location_str = format!("  --> {}", location);
            writeln!(f, "{}", location_str.bright_blue())?;

            if let Some(ref source) = self.source_line {
                writeln!(f, "   {}", "|".bright_blue())?;
                writeln!(
                    f,
                    "{} {} {}",
                    format!("{:3}", location.line).bright_blue(),
                    "|".bright_blue(),
                    source
                )?;
                writeln!(
                    f,
                    "   {} {}{}",
                    "|".bright_blue(),
                    " ".repeat(location.column.saturating_sub(1)),
                    "^".red().bold()
                )?;
                writeln!(f, "   {}", "|".bright_blue())?;
            }
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        if let Some(ref note) = self.note {
            writeln!(f, "   {} {}", "=".bright_cyan(), format!("note: {}", note).bright_cyan())?;
        }

        Ok(())
    }
}

/// Edit distance between two strings, used for "Did you mean?" suggestions
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Closest candidate within an edit distance of 3, if any
pub fn find_closest_match<'a>(target: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (levenshtein_distance(target, c), c))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| c.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("total", "total"), 0);
        assert_eq!(levenshtein_distance("count", "coutn"), 2);
    }

    #[test]
    fn test_find_closest_match() {
        let names = vec!["width".to_string(), "height".to_string()];
        assert_eq!(find_closest_match("widht", &names), Some("width"));
        assert_eq!(find_closest_match("hieght", &names), Some("height"));
        assert_eq!(find_closest_match("velocity", &names), None);
        assert_eq!(find_closest_match("x", &[]), None);
    }

    #[test]
    fn test_diagnostic_suggests_bound_name() {
        let err = QuasiError::from(EvalError::UndefinedVariable {
            name: "cout".into(),
            location: SourceLocation::new(1, 1),
        });
        let diagnostic = Diagnostic::from_error(&err, "cout + 1", &["count".to_string()]);

        assert_eq!(diagnostic.kind, ErrorKind::UndefinedVariable);
        assert_eq!(diagnostic.suggestion.as_deref(), Some("count"));
        assert_eq!(diagnostic.source_line.as_deref(), Some("cout + 1"));
        assert!(diagnostic.to_string().contains("Did you mean 'count'?"));
    }

    #[test]
    fn test_diagnostic_without_location() {
        let err = QuasiError::from(ParseError::EmptyInput);
        let diagnostic = Diagnostic::from_error(&err, "", &[]);

        assert_eq!(diagnostic.kind, ErrorKind::ParseError);
        assert!(diagnostic.location.is_none());
        assert!(diagnostic.source_line.is_none());
    }

    #[test]
    fn test_diagnostic_picks_the_offending_line() {
        let err = QuasiError::from(LexError::InvalidCharacter {
            ch: '&',
            location: SourceLocation::new(2, 3),
        });
        let diagnostic = Diagnostic::from_error(&err, "x = 1\n2 & 3\n", &[]);

        assert_eq!(diagnostic.source_line.as_deref(), Some("2 & 3"));
        assert_eq!(diagnostic.kind, ErrorKind::LexError);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(SourceLocation::new(3, 7).to_string(), "3:7");
        assert_eq!(SourceLocation::with_file(1, 2, "a.q".into()).to_string(), "a.q:1:2");
        assert!(!SourceLocation::unknown().is_known());
    }
}
