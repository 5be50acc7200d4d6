use crate::ParseError;
use ariadne::{Label, Report, ReportKind, Source};

impl ParseError {
    /// Builds the ariadne report for this error against the line it came from.
    pub fn report(&self, input: &str) -> Report<'_, (&'static str, std::ops::Range<usize>)> {
        let report = match self {
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, ("REPL", found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new(("REPL", found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let idx = input.len();
                Report::build(ReportKind::Error, ("REPL", idx..idx))
                    .with_message("Unexpected EOF")
                    .with_label(
                        Label::new(("REPL", idx..idx)).with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::LexerError(lex_err) => {
                Report::build(ReportKind::Error, ("REPL", lex_err.span.to_range()))
                    .with_message("Lexer Error")
                    .with_label(
                        Label::new(("REPL", lex_err.span.to_range()))
                            .with_message(lex_err.error.to_string()),
                    )
            }
        };
        report.finish()
    }

    /// Prints the report to stderr, falling back to the plain message.
    pub fn pretty_print(&self, input: &str) {
        if self
            .report(input)
            .eprint(("REPL", Source::from(input)))
            .is_err()
        {
            eprintln!("{}", self);
        }
    }
}
