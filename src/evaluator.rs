use crate::environment::Environment;
use crate::parser::{ParseError, parse_str};
use crate::reader::read;
use crate::types::{Closure, Function, Value};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

// --- Evaluation Error ---

/// Every way an evaluation step can fail. The `Display` text is the message
/// carried by the resulting `Value::Error`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Unbound symbol '{0}'")]
    UnboundSymbol(String),
    #[error(
        "Function '{function}' passed incorrect number of arguments. Expected {expected}. Got {got}."
    )]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        got: usize,
    },
    #[error(
        "Function '{function}' passed incorrect type for argument {position}. Expected '{expected}'. Got '{got}'."
    )]
    TypeMismatch {
        function: &'static str,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },
    #[error("Function '{0}' passed {{}}.")]
    EmptyList(&'static str),
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Function format invalid. Symbol '&' not followed by single symbol.")]
    InvalidVariadic,
    #[error("Function '{function}' cannot define non-symbol. Expected 'Symbol'. Got '{got}'.")]
    NonSymbol {
        function: &'static str,
        got: &'static str,
    },
    #[error("Function '{function}' cannot bind {symbols} symbol(s) to {values} value(s).")]
    BindingCount {
        function: &'static str,
        symbols: usize,
        values: usize,
    },
    #[error("Function passed too many arguments. Expected {expected}. Got {got}.")]
    TooManyArguments { expected: usize, got: usize },
    #[error("S-expression must start with a function. Got '{0}'")]
    NotAFunction(&'static str),
    #[error("Invalid number.")]
    InvalidNumber,
}

// Errors leave the Rust error channel here and continue as ordinary data.
impl From<EvalError> for Value {
    fn from(err: EvalError) -> Self {
        Value::Error(err.to_string())
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

const VARIADIC_MARKER: &str = "&";

// --- Evaluate Function ---

/// Reduces `value` to normal form within `env`.
///
/// Symbols are looked up, S-expressions are applied, and everything else
/// evaluates to itself.
pub fn evaluate(value: Value, env: &Rc<RefCell<Environment>>) -> Value {
    match value {
        Value::Symbol(name) => env.borrow().get(&name),
        Value::SExpression(items) => evaluate_sexpression(items, env),
        other => other,
    }
}

/// Evaluates the children of an S-expression left to right, then applies the
/// first to the rest. The first `Error` child becomes the whole result.
pub fn evaluate_sexpression(items: Vec<Value>, env: &Rc<RefCell<Environment>>) -> Value {
    if items.is_empty() {
        return Value::SExpression(items);
    }

    let mut evaluated = Vec::with_capacity(items.len());
    for item in items {
        let result = evaluate(item, env);
        if result.is_error() {
            return result;
        }
        evaluated.push(result);
    }

    let mut arguments = evaluated.into_iter();
    let Some(first) = arguments.next() else {
        return Value::SExpression(Vec::new());
    };
    if arguments.len() == 0 {
        return first;
    }

    match first {
        Value::Function(function) => call(env, function, arguments.collect()),
        other => EvalError::NotAFunction(other.type_name()).into(),
    }
}

/// Applies `function` to already-evaluated `arguments`.
pub fn call(env: &Rc<RefCell<Environment>>, function: Function, arguments: Vec<Value>) -> Value {
    let result = match function {
        Function::Builtin(builtin) => (builtin.func)(env, arguments),
        Function::Closure(closure) => call_closure(env, *closure, arguments),
    };
    result.unwrap_or_else(Value::from)
}

fn formal_name(formal: &Value) -> EvalResult<&str> {
    formal.as_symbol().ok_or(EvalError::NonSymbol {
        function: "\\",
        got: formal.type_name(),
    })
}

/// Binds arguments to formals in the closure's own scope.
///
/// Fully applied closures run their body with the caller's scope attached as
/// parent. Otherwise the closure is returned with the remaining formals.
fn call_closure(
    env: &Rc<RefCell<Environment>>,
    closure: Closure,
    arguments: Vec<Value>,
) -> EvalResult {
    let Closure {
        formals,
        body,
        env: mut scope,
    } = closure;
    let expected = formals.len();
    let given = arguments.len();

    let mut formals = formals.into_iter();
    let mut arguments = arguments.into_iter();
    while arguments.len() > 0 {
        let Some(formal) = formals.next() else {
            return Err(EvalError::TooManyArguments {
                expected,
                got: given,
            });
        };
        let name = formal_name(&formal)?;

        if name == VARIADIC_MARKER {
            if formals.len() != 1 {
                return Err(EvalError::InvalidVariadic);
            }
            let rest = formals.next().ok_or(EvalError::InvalidVariadic)?;
            scope.put(formal_name(&rest)?, Value::QExpression(arguments.by_ref().collect()));
            break;
        }

        if let Some(argument) = arguments.next() {
            scope.put(name, argument);
        }
    }

    let mut remaining: Vec<Value> = formals.collect();
    // A trailing `& rest` with no arguments left binds `rest` to `{}`.
    if remaining.first().and_then(Value::as_symbol) == Some(VARIADIC_MARKER) {
        if remaining.len() != 2 {
            return Err(EvalError::InvalidVariadic);
        }
        let rest = remaining.remove(1);
        remaining.clear();
        scope.put(formal_name(&rest)?, Value::QExpression(Vec::new()));
    }

    if remaining.is_empty() {
        trace!(arguments = given, "applying closure");
        let scope = scope.enclose(env.clone());
        Ok(evaluate(Value::SExpression(body), &scope))
    } else {
        trace!(
            arguments = given,
            remaining = remaining.len(),
            "partial application"
        );
        Ok(Value::lambda(remaining, body, scope))
    }
}

/// Parses, reads and evaluates `input` as one line of source.
///
/// Only parse failures are Rust errors; evaluation failures come back as
/// `Value::Error`.
pub fn evaluate_str(input: &str, env: &Rc<RefCell<Environment>>) -> Result<Value, ParseError> {
    let tree = parse_str(input)?;
    Ok(evaluate(read(&tree), env))
}
