// File: src/source.rs
//
// Function-table scanner for Quasi source files.
// Walks a token stream, recognizes `fn` declarations and records each named
// function with its parameters, return type and raw body tokens. Function
// bodies are kept as tokens; they are not parsed or evaluated.
//
// Declaration forms:
//   fn name { ... }                 named, returns void
//   fn name f64 { ... }             named with return type
//   fn name(a: i32, b: i32) i32 { ... }
//   fn name f64 then x * x;         single-statement body up to ';'
//   fn name;                        declaration without body
//   fn { ... }, fn f64 { ... }, fn () { ... }, fn (a: i32) { ... }
//                                   anonymous; not recorded

use crate::errors::{SourceError, SourceLocation};
use crate::lexer::{Keyword, OperatorKind, Token, TokenKind, ValueType};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: ValueType,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Name and signature of a function; an empty name marks an anonymous one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionPrototype {
    name: String,
    parameters: Vec<Parameter>,
    return_type: ValueType,
}

impl FunctionPrototype {
    pub fn new(name: &str, return_type: ValueType) -> Self {
        FunctionPrototype { name: name.to_string(), parameters: Vec::new(), return_type }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    prototype: FunctionPrototype,
    body: Option<Vec<Token>>,
    location: SourceLocation,
}

impl Function {
    pub fn new(prototype: FunctionPrototype, location: SourceLocation) -> Self {
        Function { prototype, body: None, location }
    }

    pub fn name(&self) -> &str {
        self.prototype.name()
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.prototype.parameters()
    }

    pub fn return_type(&self) -> ValueType {
        self.prototype.return_type()
    }

    pub fn prototype(&self) -> &FunctionPrototype {
        &self.prototype
    }

    /// Location of the `fn` keyword
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn body(&self) -> Option<&[Token]> {
        self.body.as_deref()
    }

    pub fn attach_body(&mut self, body: Vec<Token>) {
        self.body = Some(body);
    }
}

/// The function table of one source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    functions: Vec<Function>,
}

impl SourceFile {
    /// Records `func` unless it is anonymous
    pub fn push(&mut self, func: Function) {
        if func.prototype.is_anonymous() {
            return;
        }
        self.functions.push(func);
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Scans `tokens` for `fn` declarations. Tokens outside declarations are
    /// skipped.
    ///
    /// # Errors
    /// Returns a `SourceError` for the first malformed declaration.
    pub fn parse(tokens: &[Token]) -> Result<Self, SourceError> {
        let mut src = SourceFile::default();
        let mut i = 0;

        while i < tokens.len() {
            if tokens[i].keyword() != Some(Keyword::Fn) {
                i += 1;
                continue;
            }

            let header_end = tokens[i..]
                .iter()
                .position(ends_header)
                .map(|offset| i + offset)
                .ok_or_else(|| SourceError::MissingBody { location: tokens[i].location() })?;

            let prototype = parse_prototype(&tokens[i..header_end])?;
            let mut func = Function::new(prototype, tokens[i].location());

            let (body, next) = parse_body(tokens, header_end)?;
            if let Some(body) = body.filter(|b| !b.is_empty()) {
                func.attach_body(body);
            }

            src.push(func);
            i = next;
        }

        Ok(src)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (counter, function) in self.functions.iter().enumerate() {
            writeln!(f, "#{}: fn {} {}", counter, function.name(), function.return_type())?;
        }
        Ok(())
    }
}

fn ends_header(token: &Token) -> bool {
    matches!(token.op(), Some(OperatorKind::OpenBrace | OperatorKind::Semicolon))
        || token.keyword() == Some(Keyword::Then)
}

/// Parses `fn ...` up to, not including, the body opener
fn parse_prototype(header: &[Token]) -> Result<FunctionPrototype, SourceError> {
    let Some(second) = header.get(1) else {
        return Ok(FunctionPrototype::default());
    };

    if header.len() == 2 {
        return match &second.kind {
            TokenKind::Identifier(name) => Ok(FunctionPrototype::new(name, ValueType::Void)),
            TokenKind::Type(ty) => Ok(FunctionPrototype::new("", *ty)),
            other => Err(SourceError::ExpectedNameOrType {
                found: other.to_string(),
                location: second.location(),
            }),
        };
    }

    let (name, rest) = match &second.kind {
        TokenKind::Identifier(name) => (name.as_str(), &header[2..]),
        TokenKind::Operator(OperatorKind::OpenParen) => ("", &header[1..]),
        other => {
            return Err(SourceError::ExpectedNameOrType {
                found: other.to_string(),
                location: second.location(),
            });
        }
    };

    let (parameters, rest) = match rest.first().and_then(Token::op) {
        Some(OperatorKind::OpenParen) => parse_parameters(rest)?,
        _ => (Vec::new(), rest),
    };

    let return_type = match rest {
        [] => ValueType::Void,
        [Token { kind: TokenKind::Type(ty), .. }] => *ty,
        [token, ..] => {
            return Err(SourceError::ExpectedReturnType {
                found: token.kind.to_string(),
                location: token.location(),
            });
        }
    };

    Ok(FunctionPrototype::new(name, return_type).with_parameters(parameters))
}

/// Parses `( name: type, ... )` at the start of `tokens`; returns the
/// parameters and the tokens after the closing parenthesis.
fn parse_parameters(tokens: &[Token]) -> Result<(Vec<Parameter>, &[Token]), SourceError> {
    let location = tokens[0].location();
    let close = tokens
        .iter()
        .position(|t| t.op() == Some(OperatorKind::CloseParen))
        .ok_or_else(|| SourceError::MalformedParameters { location: location.clone() })?;

    let inner = &tokens[1..close];
    let mut parameters = Vec::new();

    if !inner.is_empty() {
        for chunk in inner.split(|t| t.op() == Some(OperatorKind::Comma)) {
            match chunk {
                [
                    Token { kind: TokenKind::Identifier(name), .. },
                    Token { kind: TokenKind::Operator(OperatorKind::Colon), .. },
                    Token { kind: TokenKind::Type(ty), .. },
                ] => parameters.push(Parameter { name: name.clone(), ty: *ty }),
                [first, ..] => {
                    return Err(SourceError::MalformedParameters { location: first.location() });
                }
                [] => return Err(SourceError::MalformedParameters { location }),
            }
        }
    }

    Ok((parameters, &tokens[close + 1..]))
}

/// Reads the body that starts at `at`; returns the body tokens, if any, and
/// the index of the first token after the declaration.
fn parse_body(tokens: &[Token], at: usize) -> Result<(Option<Vec<Token>>, usize), SourceError> {
    let opener = &tokens[at];

    if opener.keyword() == Some(Keyword::Then) {
        let semi = tokens[at + 1..]
            .iter()
            .position(|t| t.op() == Some(OperatorKind::Semicolon))
            .map(|offset| at + 1 + offset)
            .ok_or_else(|| SourceError::UnterminatedBody { location: opener.location() })?;
        return Ok((Some(tokens[at + 1..=semi].to_vec()), semi + 1));
    }

    match opener.op() {
        Some(OperatorKind::OpenBrace) => {
            let mut depth = 1usize;
            for (offset, token) in tokens[at + 1..].iter().enumerate() {
                match token.op() {
                    Some(OperatorKind::OpenBrace) => depth += 1,
                    Some(OperatorKind::CloseBrace) => {
                        depth -= 1;
                        if depth == 0 {
                            let close = at + 1 + offset;
                            return Ok((Some(tokens[at + 1..close].to_vec()), close + 1));
                        }
                    }
                    _ => {}
                }
            }
            Err(SourceError::UnterminatedBody { location: opener.location() })
        }
        // a bare `;` declares the function without a body
        _ => Ok((None, at + 1)),
    }
}
