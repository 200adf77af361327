// File: src/main.rs
//
// Main entry point for the Quasi interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, eval or repl).

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use quasi::errors::{Diagnostic, QuasiError};
use quasi::interpreter::Interpreter;
use quasi::lexer::tokenize;
use quasi::parser::parse;
use quasi::repl::{format_number, Repl};
use quasi::source::SourceFile;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    name = "quasi",
    about = "Quasi: a small expression language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None,
    arg_required_else_help = true
)]
struct Cli {
    /// Report each stage of processing on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize source files and build their function tables
    Run {
        /// Paths to the source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluate expressions in order, sharing one set of variables
    Eval {
        /// Print the parsed tree of each expression
        #[arg(long)]
        tree: bool,

        /// Expressions such as "x = 2" "x ** 10"
        #[arg(required = true, allow_hyphen_values = true)]
        expressions: Vec<String>,
    },

    /// Launch the interactive REPL
    Repl,
}

fn status(verbose: bool, message: &str) {
    if verbose {
        eprintln!("{} {}", "-->".bright_blue(), message);
    }
}

fn report(err: &QuasiError, source: &str, names: &[String], file: Option<&str>) {
    let mut diagnostic = Diagnostic::from_error(err, source, names);
    if let (Some(file), Some(location)) = (file, diagnostic.location.as_mut()) {
        location.file = Some(file.to_string());
    }
    eprint!("{}", diagnostic);
}

fn run_files(files: &[PathBuf], verbose: bool) -> bool {
    let mut ok = true;

    for file in files {
        let name = file.display().to_string();
        let code = match fs::read_to_string(file) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{} failed to read '{}': {}", "Error:".bright_red().bold(), name, err);
                ok = false;
                continue;
            }
        };

        status(verbose, &format!("compiling {}", name));
        status(verbose, "tokenizing...");
        let table = tokenize(&code).map_err(QuasiError::from).and_then(|tokens| {
            status(verbose, "parsing...");
            SourceFile::parse(&tokens).map_err(QuasiError::from)
        });

        match table {
            Ok(src) => {
                if verbose {
                    println!("Functions:");
                    print!("{}", src);
                }
            }
            Err(err) => {
                report(&err, &code, &[], Some(&name));
                ok = false;
            }
        }
    }

    ok
}

fn eval_one(
    interpreter: &mut Interpreter,
    source: &str,
    show_tree: bool,
    verbose: bool,
) -> Result<Option<f64>, QuasiError> {
    status(verbose, &format!("tokenizing `{}`", source.trim()));
    let tokens = tokenize(source)?;
    if verbose {
        for token in &tokens {
            eprintln!("    {}", token.to_string().dimmed());
        }
    }
    if tokens.is_empty() {
        return Ok(None);
    }

    status(verbose, "parsing...");
    let expr = parse(&tokens)?;
    if show_tree {
        println!("{} {}", "tree:".bright_cyan(), expr);
    }

    status(verbose, "evaluating...");
    Ok(Some(interpreter.eval_expr(&expr)?))
}

fn eval_expressions(expressions: &[String], show_tree: bool, verbose: bool) -> bool {
    let mut interpreter = Interpreter::new();
    let mut ok = true;

    for source in expressions {
        match eval_one(&mut interpreter, source, show_tree, verbose) {
            Ok(Some(value)) => println!("{}", format_number(value)),
            Ok(None) => {}
            Err(err) => {
                report(&err, source, &interpreter.environment().names(), None);
                ok = false;
            }
        }
    }

    ok
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    status(cli.verbose, "verbose output is enabled");

    let ok = match cli.command {
        Commands::Run { files } => run_files(&files, cli.verbose),
        Commands::Eval { tree, expressions } => eval_expressions(&expressions, tree, cli.verbose),
        Commands::Repl => match Repl::new().and_then(|mut repl| repl.run()) {
            Ok(()) => true,
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red(), err);
                false
            }
        },
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
