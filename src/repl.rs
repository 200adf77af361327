// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Quasi expression language.
// Provides an interactive shell for evaluating expressions with:
// - Multi-line input while parentheses are unbalanced
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit, :vars, :reset)
// - Variables that persist across inputs
// - Errors that abort only the current input

use crate::errors::Diagnostic;
use crate::interpreter::Interpreter;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL session that maintains interpreter state and handles user interaction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
}

impl Repl {
    /// Creates a new REPL session with a fresh interpreter
    pub fn new() -> Result<Self, ReadlineError> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { interpreter: Interpreter::new(), editor })
    }

    fn show_banner(&self) {
        println!(
            "{} {}",
            "Quasi".bright_cyan().bold(),
            format!("v{} - expression shell", env!("CARGO_PKG_VERSION")).bright_cyan()
        );
        println!(
            "  Use {} for commands or {} to exit",
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), ReadlineError> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "quasi> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        }
                        break;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+D or :quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Returns false when the session should end
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" | ":h" => {
                self.show_help();
                true
            }
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                false
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
                true
            }
            ":vars" | ":v" => {
                self.show_variables();
                true
            }
            ":reset" | ":r" => {
                self.interpreter.reset();
                println!("{}", "Environment reset".bright_green());
                true
            }
            _ => {
                println!(
                    "{} Unknown command: {}. Type {} for available commands.",
                    "Error:".bright_red(),
                    cmd.bright_yellow(),
                    ":help".bright_yellow()
                );
                true
            }
        }
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q ".dimmed());
        println!("  {}{}  Clear the screen", ":clear".bright_yellow(), " or :c".dimmed());
        println!("  {}{}  Show defined variables", ":vars".bright_yellow(), " or :v ".dimmed());
        println!("  {}{}  Forget all variables", ":reset".bright_yellow(), " or :r".dimmed());
        println!();
        println!("{}", "Expressions:".bright_cyan().bold());
        println!("  Operators: + - * / ** ( ) and = for assignment; # starts a comment.");
        println!("  Leave a parenthesis open to continue on the next line.");
        println!();
        println!("  {}", "quasi> r = 2".dimmed());
        println!("  {}", "quasi> 3.14159 * r ** 2".dimmed());
        println!();
    }

    fn show_variables(&self) {
        let env = self.interpreter.environment();
        if env.is_empty() {
            println!("  {}", "(no variables defined)".dimmed());
            return;
        }

        for name in env.names() {
            if let Some(value) = env.get(&name) {
                println!("  {} = {}", name.bright_yellow(), format_number(value).bright_white());
            }
        }
    }

    fn eval_input(&mut self, input: &str) {
        match self.interpreter.eval_line(input) {
            Ok(Some(value)) => {
                println!("{} {}", "=>".bright_blue(), format_number(value).bright_white());
            }
            Ok(None) => {}
            Err(err) => {
                let names = self.interpreter.environment().names();
                eprint!("{}", Diagnostic::from_error(&err, input, &names));
            }
        }
    }
}

/// Input is complete once every `(` outside a comment has been closed
pub fn is_input_complete(input: &str) -> bool {
    let mut depth = 0i32;

    for line in input.lines() {
        let code = line.split('#').next().unwrap_or("");
        for ch in code.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
    }

    depth <= 0
}

/// Formats a value, printing integral values without a fractional part
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
