// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Quasi language.
// Converts source text into a sequence of tokens for parsing.
//
// The tokenizer is a single-pass state machine over characters with an
// accumulation buffer. A buffer is flushed into a token whenever a character
// of a different class arrives.
//
// Supports:
// - Scalars: digits and '.' (e.g. 3, 0.5, .25)
// - Identifiers: a letter or '_' followed by letters, digits or '_'
// - Keywords: fn, let, const, return, then, pub
// - Types: void, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64
// - Operators: + - * ** / = ( ) { } : , ; == != < > <= >=
// - Comments starting with # up to the end of the line

use crate::errors::{LexError, SourceLocation};
use std::fmt;

/// Every operator and punctuation symbol of the lexical surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
    OpenParen,
    CloseParen,
    Assign,
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,
    Semicolon,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl OperatorKind {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => OperatorKind::Add,
            "-" => OperatorKind::Sub,
            "*" => OperatorKind::Mul,
            "**" => OperatorKind::Exp,
            "/" => OperatorKind::Div,
            "=" => OperatorKind::Assign,
            "(" => OperatorKind::OpenParen,
            ")" => OperatorKind::CloseParen,
            "{" => OperatorKind::OpenBrace,
            "}" => OperatorKind::CloseBrace,
            ":" => OperatorKind::Colon,
            "," => OperatorKind::Comma,
            ";" => OperatorKind::Semicolon,
            "==" => OperatorKind::Equal,
            "!=" => OperatorKind::NotEqual,
            "<" => OperatorKind::Less,
            ">" => OperatorKind::Greater,
            "<=" => OperatorKind::LessEqual,
            ">=" => OperatorKind::GreaterEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Exp => "**",
            OperatorKind::Div => "/",
            OperatorKind::Assign => "=",
            OperatorKind::OpenParen => "(",
            OperatorKind::CloseParen => ")",
            OperatorKind::OpenBrace => "{",
            OperatorKind::CloseBrace => "}",
            OperatorKind::Colon => ":",
            OperatorKind::Comma => ",",
            OperatorKind::Semicolon => ";",
            OperatorKind::Equal => "==",
            OperatorKind::NotEqual => "!=",
            OperatorKind::Less => "<",
            OperatorKind::Greater => ">",
            OperatorKind::LessEqual => "<=",
            OperatorKind::GreaterEqual => ">=",
        }
    }

    /// Binding strength; lower binds looser. Leaves and non-expression
    /// operators report 0.
    pub fn precedence(self) -> i32 {
        match self {
            OperatorKind::OpenParen => -5,
            OperatorKind::Assign => -4,
            OperatorKind::Add | OperatorKind::Sub => -3,
            OperatorKind::Mul | OperatorKind::Div => -2,
            OperatorKind::Exp => -1,
            _ => 0,
        }
    }

    /// Operators that may join two operands in an expression
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OperatorKind::Add
                | OperatorKind::Sub
                | OperatorKind::Mul
                | OperatorKind::Div
                | OperatorKind::Exp
                | OperatorKind::Assign
        )
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, OperatorKind::Exp | OperatorKind::Assign)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Fn,
    Let,
    Const,
    Return,
    Then,
    Pub,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "fn" => Some(Keyword::Fn),
            "let" => Some(Keyword::Let),
            "const" => Some(Keyword::Const),
            "return" => Some(Keyword::Return),
            "then" => Some(Keyword::Then),
            "pub" => Some(Keyword::Pub),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Fn => "fn",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Return => "return",
            Keyword::Then => "then",
            Keyword::Pub => "pub",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in type names usable in function declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Void,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ValueType {
    pub fn from_word(word: &str) -> Option<Self> {
        let ty = match word {
            "void" => ValueType::Void,
            "i8" => ValueType::I8,
            "u8" => ValueType::U8,
            "i16" => ValueType::I16,
            "u16" => ValueType::U16,
            "i32" => ValueType::I32,
            "u32" => ValueType::U32,
            "i64" => ValueType::I64,
            "u64" => ValueType::U64,
            "f32" => ValueType::F32,
            "f64" => ValueType::F64,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::I8 => "i8",
            ValueType::U8 => "u8",
            ValueType::I16 => "i16",
            ValueType::U16 => "u16",
            ValueType::I32 => "i32",
            ValueType::U32 => "u32",
            ValueType::I64 => "i64",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Scalar(f64),
    Operator(OperatorKind),
    Identifier(String),
    Keyword(Keyword),
    Type(ValueType),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Scalar(n) => write!(f, "{}", n),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Keyword(kwd) => write!(f, "{}", kwd),
            TokenKind::Type(ty) => write!(f, "{}", ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    pub fn op(&self) -> Option<OperatorKind> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kwd) => Some(kwd),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            TokenKind::Identifier(name) => write!(f, "[ IDENT: {} ]", name),
            TokenKind::Scalar(n) => write!(f, "[ SCALAR: {} ]", n),
            TokenKind::Operator(op) => write!(f, "[ OP: {} ]", op),
            TokenKind::Keyword(kwd) => write!(f, "[ KEYWORD: {} ]", kwd),
            TokenKind::Type(ty) => write!(f, "[ TYPE: {} ]", ty),
        }
    }
}

const OPERATOR_CHARS: &str = "+-*/=(){}:,;!<>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Identifier,
    Operator,
    Number,
    Comment,
}

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters that end the token being accumulated
fn is_boundary(c: char) -> bool {
    c.is_ascii_whitespace() || c == '#' || is_operator_char(c)
}

/// Two-character operators are built by extending a single pending character
fn merges(buffer: &str, c: char) -> bool {
    matches!((buffer, c), ("*", '*') | ("=", '=') | ("!", '=') | ("<", '=') | (">", '='))
}

fn is_valid_number(literal: &str) -> bool {
    if literal.starts_with('.') && literal.ends_with('.') {
        return false;
    }
    literal.chars().filter(|&c| c == '.').count() <= 1
}

struct Lexer {
    tokens: Vec<Token>,
    buffer: String,
    state: State,
    start_line: usize,
    start_column: usize,
}

impl Lexer {
    fn new() -> Self {
        Lexer {
            tokens: Vec::new(),
            buffer: String::new(),
            state: State::None,
            start_line: 1,
            start_column: 1,
        }
    }

    fn feed(&mut self, c: char, line: usize, column: usize) -> Result<(), LexError> {
        match self.state {
            State::Comment => {
                if c == '\n' {
                    self.state = State::None;
                }
                Ok(())
            }
            State::None => self.start(c, line, column),
            State::Identifier if is_identifier_char(c) => {
                self.buffer.push(c);
                Ok(())
            }
            State::Number if c.is_ascii_digit() || c == '.' => {
                self.buffer.push(c);
                Ok(())
            }
            State::Number if is_identifier_char(c) => Err(LexError::InvalidNumber {
                literal: format!("{}{}", self.buffer, c),
                location: self.start_location(),
            }),
            State::Operator if merges(&self.buffer, c) => {
                self.buffer.push(c);
                Ok(())
            }
            State::Operator => {
                self.flush()?;
                self.start(c, line, column)
            }
            _ if is_boundary(c) => {
                self.flush()?;
                self.start(c, line, column)
            }
            _ => Err(LexError::InvalidCharacter {
                ch: c,
                location: SourceLocation::new(line, column),
            }),
        }
    }

    /// Classifies `c` from the idle state
    fn start(&mut self, c: char, line: usize, column: usize) -> Result<(), LexError> {
        let state = if c.is_ascii_alphabetic() || c == '_' {
            State::Identifier
        } else if c.is_ascii_digit() || c == '.' {
            State::Number
        } else if is_operator_char(c) {
            State::Operator
        } else if c.is_ascii_whitespace() {
            return Ok(());
        } else if c == '#' {
            self.state = State::Comment;
            return Ok(());
        } else {
            return Err(LexError::InvalidCharacter {
                ch: c,
                location: SourceLocation::new(line, column),
            });
        };

        self.state = state;
        self.start_line = line;
        self.start_column = column;
        self.buffer.push(c);
        Ok(())
    }

    fn start_location(&self) -> SourceLocation {
        SourceLocation::new(self.start_line, self.start_column)
    }

    /// Turns the buffer into a token according to the current state
    fn flush(&mut self) -> Result<(), LexError> {
        let location = self.start_location();
        if self.buffer.is_empty() {
            return Err(LexError::EmptyToken { location });
        }

        let buffer = std::mem::take(&mut self.buffer);
        let kind = match self.state {
            State::Identifier => {
                if let Some(kwd) = Keyword::from_word(&buffer) {
                    TokenKind::Keyword(kwd)
                } else if let Some(ty) = ValueType::from_word(&buffer) {
                    TokenKind::Type(ty)
                } else {
                    TokenKind::Identifier(buffer)
                }
            }
            State::Number => {
                let value = if is_valid_number(&buffer) { buffer.parse::<f64>().ok() } else { None };
                match value {
                    Some(n) => TokenKind::Scalar(n),
                    None => return Err(LexError::InvalidNumber { literal: buffer, location }),
                }
            }
            State::Operator => match OperatorKind::from_symbol(&buffer) {
                Some(op) => TokenKind::Operator(op),
                None => return Err(LexError::UnknownOperator { op: buffer, location }),
            },
            State::None | State::Comment => return Err(LexError::EmptyToken { location }),
        };

        self.tokens.push(Token::new(kind, self.start_line, self.start_column));
        self.state = State::None;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.tokens)
    }
}

/// Tokenizes Quasi source code into a vector of tokens.
///
/// Lines and columns are 1-based and point at the first character of each
/// token. An input ending inside a comment or in whitespace is not an error.
///
/// # Errors
/// Returns the first `LexError` met; no partial token list is produced.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new();
    let mut line = 1;
    let mut column = 1;

    for c in source.chars() {
        lexer.feed(c, line, column)?;
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_arithmetic_tokens() {
        assert_eq!(
            kinds("x = 2.5 * (y + 1)"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Operator(OperatorKind::Assign),
                TokenKind::Scalar(2.5),
                TokenKind::Operator(OperatorKind::Mul),
                TokenKind::Operator(OperatorKind::OpenParen),
                TokenKind::Identifier("y".into()),
                TokenKind::Operator(OperatorKind::Add),
                TokenKind::Scalar(1.0),
                TokenKind::Operator(OperatorKind::CloseParen),
            ]
        );
    }

    #[test]
    fn test_no_whitespace_needed_between_classes() {
        assert_eq!(
            kinds("a1+.5"),
            vec![
                TokenKind::Identifier("a1".into()),
                TokenKind::Operator(OperatorKind::Add),
                TokenKind::Scalar(0.5),
            ]
        );
    }

    #[test]
    fn test_double_star_is_exponent() {
        assert_eq!(
            kinds("2**3"),
            vec![
                TokenKind::Scalar(2.0),
                TokenKind::Operator(OperatorKind::Exp),
                TokenKind::Scalar(3.0),
            ]
        );
        // A third star starts a new operator
        assert_eq!(
            kinds("2***3")[1..3],
            [TokenKind::Operator(OperatorKind::Exp), TokenKind::Operator(OperatorKind::Mul)]
        );
    }

    #[test]
    fn test_comparison_operators_merge() {
        assert_eq!(
            kinds("== != <= >= < >"),
            vec![
                TokenKind::Operator(OperatorKind::Equal),
                TokenKind::Operator(OperatorKind::NotEqual),
                TokenKind::Operator(OperatorKind::LessEqual),
                TokenKind::Operator(OperatorKind::GreaterEqual),
                TokenKind::Operator(OperatorKind::Less),
                TokenKind::Operator(OperatorKind::Greater),
            ]
        );
    }

    #[test]
    fn test_consecutive_parens_are_separate_tokens() {
        assert_eq!(
            kinds("((x))"),
            vec![
                TokenKind::Operator(OperatorKind::OpenParen),
                TokenKind::Operator(OperatorKind::OpenParen),
                TokenKind::Identifier("x".into()),
                TokenKind::Operator(OperatorKind::CloseParen),
                TokenKind::Operator(OperatorKind::CloseParen),
            ]
        );
    }

    #[test]
    fn test_keywords_and_types() {
        assert_eq!(
            kinds("fn main_loop f64 then"),
            vec![
                TokenKind::Keyword(Keyword::Fn),
                TokenKind::Identifier("main_loop".into()),
                TokenKind::Type(ValueType::F64),
                TokenKind::Keyword(Keyword::Then),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("x # the answer\n+ 1 # trailing"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Operator(OperatorKind::Add),
                TokenKind::Scalar(1.0),
            ]
        );
        assert_eq!(kinds("x#comment"), vec![TokenKind::Identifier("x".into())]);
        assert!(kinds("# only a comment").is_empty());
        assert!(kinds("   \n\t").is_empty());
    }

    #[test]
    fn test_token_locations() {
        let tokens = tokenize("a +\n  12").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("2 & 3").unwrap_err();
        assert_eq!(
            err,
            LexError::InvalidCharacter { ch: '&', location: SourceLocation::new(1, 3) }
        );
        assert!(matches!(tokenize("2&3"), Err(LexError::InvalidCharacter { ch: '&', .. })));
        assert!(matches!(tokenize("ab$"), Err(LexError::InvalidCharacter { ch: '$', .. })));
        assert!(matches!(tokenize("+@"), Err(LexError::InvalidCharacter { ch: '@', .. })));
        assert!(matches!(tokenize("é"), Err(LexError::InvalidCharacter { .. })));
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(tokenize("1.2.3"), Err(LexError::InvalidNumber { .. })));
        assert!(matches!(tokenize("."), Err(LexError::InvalidNumber { .. })));
        assert!(matches!(tokenize(".5."), Err(LexError::InvalidNumber { .. })));
        match tokenize("12ab") {
            Err(LexError::InvalidNumber { literal, location }) => {
                assert_eq!(literal, "12a");
                assert_eq!(location, SourceLocation::new(1, 1));
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_dot_numbers_are_accepted() {
        assert_eq!(kinds("5."), vec![TokenKind::Scalar(5.0)]);
        assert_eq!(kinds(".25"), vec![TokenKind::Scalar(0.25)]);
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(
            tokenize("!x").unwrap_err(),
            LexError::UnknownOperator { op: "!".into(), location: SourceLocation::new(1, 1) }
        );
    }

    #[test]
    fn test_operator_table_round_trips_symbols() {
        for op in [
            OperatorKind::Add,
            OperatorKind::Exp,
            OperatorKind::Assign,
            OperatorKind::Semicolon,
            OperatorKind::GreaterEqual,
        ] {
            assert_eq!(OperatorKind::from_symbol(op.symbol()), Some(op));
        }
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(OperatorKind::OpenParen.precedence(), -5);
        assert_eq!(OperatorKind::Assign.precedence(), -4);
        assert_eq!(OperatorKind::Sub.precedence(), -3);
        assert_eq!(OperatorKind::Div.precedence(), -2);
        assert_eq!(OperatorKind::Exp.precedence(), -1);
        assert_eq!(OperatorKind::Comma.precedence(), 0);
    }
}
