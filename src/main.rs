use std::fs;
use std::io::{self, BufRead};
use std::process::ExitCode;

use lispy::{Environment, evaluate_str, init_tracing};

// Evaluates each non-blank line in one shared root environment.
fn run_lines<I: IntoIterator<Item = String>>(lines: I) {
    let global_env = Environment::new_global_populated();
    for line in lines {
        let trimmed_input = line.trim();
        if trimmed_input.is_empty() {
            continue;
        }
        match evaluate_str(trimmed_input, &global_env) {
            Ok(value) => println!("{}", value),
            Err(parse_err) => parse_err.pretty_print(trimmed_input),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    match std::env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(source) => run_lines(source.lines().map(str::to_string)),
            Err(err) => {
                eprintln!("Could not read '{}': {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => run_lines(io::stdin().lock().lines().map_while(Result::ok)),
    }
    ExitCode::SUCCESS
}
