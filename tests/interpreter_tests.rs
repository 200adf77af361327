// Integration tests for the Quasi interpreter
//
// These tests drive complete lines of source text through the tokenizer,
// parser and evaluator and check the results. Tests cover:
// - Operator precedence and associativity
// - Unary operators and parenthesised groups
// - Assignment and rebinding across lines
// - Floating-point edge cases
// - Error reporting for each stage
// - Function tables built from source files

use quasi::errors::{EvalError, LexError, ParseError, QuasiError};
use quasi::interpreter::{evaluate, Environment, Interpreter};
use quasi::lexer::{tokenize, ValueType};
use quasi::parser::parse;
use quasi::source::SourceFile;

/// Runs every line in one session and returns the last result
fn run_lines(lines: &[&str]) -> (Result<Option<f64>, QuasiError>, Interpreter) {
    let mut interp = Interpreter::new();
    let mut last = Ok(None);
    for line in lines {
        last = interp.eval_line(line);
    }
    (last, interp)
}

fn eval(source: &str) -> f64 {
    match run_lines(&[source]).0 {
        Ok(Some(value)) => value,
        other => panic!("`{}` did not evaluate: {:?}", source, other),
    }
}

#[test]
fn test_precedence() {
    assert_eq!(eval("2 + 3 * 4"), 14.0);
    assert_eq!(eval("(2 + 3) * 4"), 20.0);
    assert_eq!(eval("2 * 3 + 4 * 5"), 26.0);
    assert_eq!(eval("2 ** 3 * 4 + 5"), 37.0);
    assert_eq!(eval("1 + 2 * 3 ** 2"), 19.0);
}

#[test]
fn test_exponent_chain_is_right_associative() {
    assert_eq!(eval("2 ** 3 ** 2"), 512.0);
}

#[test]
fn test_subtraction_and_division_chains_are_left_associative() {
    // equal-precedence chains rotate, giving conventional grouping
    assert_eq!(eval("10 - 2 - 3"), 5.0);
    assert_eq!(eval("100 / 10 / 5"), 2.0);
    assert_eq!(eval("1 - 2 + 3"), 2.0);
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval("-5 + 3"), -2.0);
    assert_eq!(eval("- -5"), 5.0);
    assert_eq!(eval("+7"), 7.0);
    assert_eq!(eval("2 * -3"), -6.0);
    assert_eq!(eval("-(2 + 3)"), -5.0);
}

#[test]
fn test_unary_minus_binds_only_its_operand() {
    let (result, _) = run_lines(&["x = 3", "- x + 2"]);
    assert_eq!(result, Ok(Some(-1.0)));

    // the sign belongs to the base, not to the power
    assert_eq!(eval("-2 ** 2"), 4.0);
}

#[test]
fn test_assignment_and_rebinding() {
    let (result, interp) = run_lines(&["x = 5", "x + 1"]);
    assert_eq!(result, Ok(Some(6.0)));
    assert_eq!(interp.environment().get("x"), Some(5.0));

    let (result, interp) = run_lines(&["x = 5", "x = x + 1"]);
    assert_eq!(result, Ok(Some(6.0)));
    assert_eq!(interp.environment().get("x"), Some(6.0));
}

#[test]
fn test_assignment_binds_a_value_not_an_expression() {
    let (result, _) = run_lines(&["a = 2", "b = a * 10", "a = 3", "b"]);
    assert_eq!(result, Ok(Some(20.0)));
}

#[test]
fn test_chained_assignment() {
    let (result, interp) = run_lines(&["x = y = 4", "x + y"]);
    assert_eq!(result, Ok(Some(8.0)));
    assert_eq!(interp.environment().names(), vec!["x", "y"]);
}

#[test]
fn test_assignment_inside_expression_is_visible_to_the_right() {
    assert_eq!(eval("(x = 4) * x"), 16.0);
}

#[test]
fn test_division_follows_floating_point() {
    assert_eq!(eval("1 / 0"), f64::INFINITY);
    assert_eq!(eval("-1 / 0"), f64::NEG_INFINITY);
    assert!(eval("0 / 0").is_nan());
}

#[test]
fn test_fractional_and_negative_exponents() {
    assert_eq!(eval("4 ** 0.5"), 2.0);
    assert_eq!(eval("2 ** -1"), 0.5);
}

#[test]
fn test_comments_and_blank_lines() {
    assert_eq!(eval("1 + 1 # two"), 2.0);
    let (result, _) = run_lines(&["# nothing", ""]);
    assert_eq!(result, Ok(None));
}

#[test]
fn test_valid_expressions_never_produce_malformed_trees() {
    let sources = [
        "a = 1",
        "a + 2 * (3 - a) / 4 ** 0.5",
        "-(a) - -a + +a",
        "((((a))))",
        "b = (a = 2) ** -a",
        "a * b - a / b + a ** b",
        "c = -a * (b - 1) ** 2 - 3",
    ];

    let mut env = Environment::new();
    for source in sources {
        let tokens = tokenize(source).unwrap();
        let tree = parse(&tokens).unwrap();
        match evaluate(&tree, &mut env) {
            Err(EvalError::MalformedTree { reason }) => panic!("`{}`: {}", source, reason),
            other => assert!(other.is_ok(), "`{}` failed: {:?}", source, other),
        }
    }
}

#[test]
fn test_invalid_character_is_a_lex_error() {
    let (result, _) = run_lines(&["2 & 3"]);
    assert!(matches!(result, Err(QuasiError::Lex(LexError::InvalidCharacter { ch: '&', .. }))));
}

#[test]
fn test_unclosed_paren_is_a_parse_error() {
    let (result, _) = run_lines(&["(2 + 3"]);
    assert!(matches!(result, Err(QuasiError::Parse(ParseError::UnmatchedParen { .. }))));
}

#[test]
fn test_undefined_variable_is_an_eval_error() {
    let (result, _) = run_lines(&["y + 1"]);
    match result {
        Err(QuasiError::Eval(EvalError::UndefinedVariable { name, location })) => {
            assert_eq!(name, "y");
            assert_eq!((location.line, location.column), (1, 1));
        }
        other => panic!("expected UndefinedVariable, got {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_target() {
    let (result, _) = run_lines(&["x = 1", "1 + x = 3"]);
    assert!(matches!(result, Err(QuasiError::Eval(EvalError::InvalidAssignmentTarget { .. }))));
}

#[test]
fn test_errors_abort_only_their_line() {
    let (result, interp) = run_lines(&["x = 2", "x $ 1", "(x", "x = x + q", "x * 10"]);
    assert_eq!(result, Ok(Some(20.0)));
    assert_eq!(interp.environment().get("x"), Some(2.0));
}

#[test]
fn test_failed_right_hand_side_binds_nothing() {
    let (result, interp) = run_lines(&["a = 1 + missing"]);
    assert!(result.is_err());
    assert!(!interp.environment().contains("a"));
}

#[test]
fn test_interpreter_with_seeded_environment() {
    let mut env = Environment::new();
    env.set("pi", 3.0);
    let mut interp = Interpreter::with_environment(env);
    assert_eq!(interp.eval_line("pi * 2 ** 2"), Ok(Some(12.0)));
}

#[test]
fn test_function_table_from_source() {
    let code = "\
# geometry helpers
fn area(w: f64, h: f64) f64 {
    w * h
}

fn half f64 then x / 2;
fn log;
";
    let tokens = tokenize(code).unwrap();
    let src = SourceFile::parse(&tokens).unwrap();

    assert_eq!(src.len(), 3);
    assert_eq!(src.get("area").unwrap().parameters().len(), 2);
    assert_eq!(src.get("half").unwrap().return_type(), ValueType::F64);
    assert_eq!(src.get("area").unwrap().location().line, 2);
    assert_eq!(src.to_string(), "#0: fn area f64\n#1: fn half f64\n#2: fn log void\n");
}
