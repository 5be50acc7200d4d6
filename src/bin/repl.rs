use std::cell::RefCell;
use std::rc::Rc;

use lispy::{Environment, TokenKind, evaluate_str, init_tracing, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

const HISTORY_FILE: &str = "lispy_history.txt";

struct LispyCompleter {
    env: Rc<RefCell<Environment>>,
}

impl LispyCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        LispyCompleter { env }
    }
}

impl rustyline::completion::Completer for LispyCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let candidates = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last().map(|t| &t.kind) {
                Some(TokenKind::Symbol(prefix)) if line[..pos].ends_with(prefix.as_str()) => {
                    let mut matches: Vec<String> = self
                        .env
                        .borrow()
                        .get_identifiers()
                        .into_iter()
                        .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
                        .collect();
                    matches.sort();
                    matches
                }
                _ => vec![],
            },
            Err(_) => vec![],
        };
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: LispyValidator,
    #[rustyline(Highlighter)]
    highlighter: LispyHighlighter,
    #[rustyline(Completer)]
    completer: LispyCompleter,
}

fn is_matching(opening: char, closing: char) -> bool {
    (opening == '(' && closing == ')') || (opening == '{' && closing == '}')
}

struct LispyValidator;

impl Validator for LispyValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut stack = Vec::new();

        for (i, c) in ctx.input().chars().enumerate() {
            match c {
                '(' | '{' => stack.push(c),
                ')' | '}' => match stack.pop() {
                    Some(opening) if is_matching(opening, c) => {}
                    _ => {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched '{}' at position {}",
                            c, i
                        ))));
                    }
                },
                _ => {}
            }
        }

        if stack.is_empty() {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

struct LispyHighlighter;

impl Highlighter for LispyHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut highlighted = String::new();

        for (i, c) in line.chars().enumerate() {
            match c {
                '(' | '{' => {
                    stack.push((c, highlighted.len()));
                    highlighted.push(c);
                }
                ')' | '}' => {
                    if let Some((opening, matching_pos)) = stack.pop() {
                        if is_matching(opening, c) {
                            if matching_pos + 1 == pos || i + 1 == pos {
                                highlighted.push_str(&format!("\x1b[34m{}\x1b[0m", c)); // Blue for matching brackets
                                highlighted.replace_range(
                                    matching_pos..=matching_pos,
                                    &format!("\x1b[1;34m{}\x1b[0m", opening),
                                );
                            } else {
                                highlighted.push(c);
                            }
                        } else {
                            highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for mismatched brackets
                            highlighted.replace_range(
                                matching_pos..=matching_pos,
                                &format!("\x1b[1;31m{}\x1b[0m", opening),
                            );
                        }
                    } else {
                        highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for unmatched closing brackets
                    }
                }
                _ => highlighted.push(c),
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    init_tracing();
    println!("Lispy Version 0.1.0");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new_global_populated();
    let h = InputValidator {
        highlighter: LispyHighlighter,
        validator: LispyValidator,
        completer: LispyCompleter::new(global_env.clone()),
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("lispy> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                // Evaluation errors are values and print like any other result
                match evaluate_str(trimmed_input, &global_env) {
                    Ok(value) => println!("{}", value),
                    Err(parse_err) => parse_err.pretty_print(trimmed_input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
