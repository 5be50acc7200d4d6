// Declare modules publicly so they are part of the library interface
pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod reader;
pub mod source;
pub mod types;

pub use environment::Environment;
pub use evaluator::{EvalError, EvalResult, evaluate, evaluate_str};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, TreeNode, parse_str};
pub use reader::read;
pub use source::Span;
pub use types::{Builtin, Closure, Function, Value};

static TRACING_INIT: std::sync::Once = std::sync::Once::new();

/// Installs a `tracing` subscriber for the binaries.
///
/// Only does anything when `RUST_LOG` is set, e.g. `RUST_LOG=lispy=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
