use crate::environment::Environment;
use crate::evaluator::EvalResult;
use std::cell::RefCell;
use std::fmt; // For custom display formatting
use std::rc::Rc;

/// Signature shared by every native operation in the builtin table.
pub type BuiltinFn = fn(&Rc<RefCell<Environment>>, Vec<Value>) -> EvalResult;

/// The runtime datum. Code and data share this one representation.
///
/// Every `Value` owns its children outright, so `clone` is a deep copy:
/// expressions copy element by element and closures copy their captured
/// bindings along with formals and body.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(i64),
    Error(String),               // First-class error, propagated as data
    Symbol(String),              // e.g. +, def, add-n
    SExpression(Vec<Value>),     // (f a b): evaluated by application
    QExpression(Vec<Value>),     // {a b}: quoted, evaluation-inert
    Function(Function),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    Closure(Box<Closure>), // Boxed so `Value` stays small
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str, // For display/debug only
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

// Builtins are equal when they are the same native operation, so aliases
// like `+` and `add` compare equal.
impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.func, other.func)
    }
}

/// A user-defined function.
///
/// `formals` shrinks as arguments are bound by partial application, and the
/// bound values live in `env`. `env` has no parent while stored; the caller's
/// scope is attached only for the duration of a call.
#[derive(Debug, Clone)]
pub struct Closure {
    pub formals: Vec<Value>,
    pub body: Vec<Value>,
    pub env: Environment,
}

// Captured environments are not compared.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        self.formals == other.formals && self.body == other.body
    }
}

impl Value {
    pub fn number(n: i64) -> Self {
        Value::Number(n)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn sexpr(items: Vec<Value>) -> Self {
        Value::SExpression(items)
    }

    pub fn qexpr(items: Vec<Value>) -> Self {
        Value::QExpression(items)
    }

    pub fn builtin(name: &'static str, func: BuiltinFn) -> Self {
        Value::Function(Function::Builtin(Builtin { name, func }))
    }

    /// A closure over `formals` and `body` with the given captured bindings.
    pub fn lambda(formals: Vec<Value>, body: Vec<Value>, env: Environment) -> Self {
        Value::Function(Function::Closure(Box::new(Closure { formals, body, env })))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::SExpression(_) => "S-Expression",
            Value::QExpression(_) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    items: &[Value],
    open: char,
    close: char,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(message) => write!(f, "Error: {}", message),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::SExpression(items) => write_items(f, items, '(', ')'),
            Value::QExpression(items) => write_items(f, items, '{', '}'),
            Value::Function(Function::Builtin(_)) => write!(f, "<builtin>"),
            Value::Function(Function::Closure(closure)) => {
                write!(f, "(\\ ")?;
                write_items(f, &closure.formals, '{', '}')?;
                write!(f, " ")?;
                write_items(f, &closure.body, '{', '}')?;
                write!(f, ")")
            }
        }
    }
}
