use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::Environment;
use crate::evaluator::{EvalError, EvalResult, evaluate};
use crate::types::{BuiltinFn, Value};

/// Every native operation, in registration order. Aliases share a function,
/// so they compare equal.
pub const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("\\", builtin_lambda),
    ("lambda", builtin_lambda),
    ("def", builtin_def),
    ("put", builtin_put),
    ("=", builtin_put),
    // --- List Builtins ---
    ("list", builtin_list),
    ("head", builtin_head),
    ("tail", builtin_tail),
    ("join", builtin_join),
    ("eval", builtin_eval),
    // --- Arithmetic ---
    ("add", builtin_add),
    ("+", builtin_add),
    ("sub", builtin_sub),
    ("-", builtin_sub),
    ("mul", builtin_mul),
    ("*", builtin_mul),
    ("div", builtin_div),
    ("/", builtin_div),
    ("mod", builtin_mod),
    ("%", builtin_mod),
    // --- Conditionals and comparison ---
    ("if", builtin_if),
    ("==", builtin_eq),
    ("eq", builtin_eq),
    ("!=", builtin_ne),
    ("ne", builtin_ne),
    (">", builtin_gt),
    ("gt", builtin_gt),
    ("<", builtin_lt),
    ("lt", builtin_lt),
    (">=", builtin_ge),
    ("ge", builtin_ge),
    ("<=", builtin_le),
    ("le", builtin_le),
];

// --- Argument helpers ---

/// Checks the argument count and hands the arguments back as an array.
fn take_exact<const N: usize>(
    args: Vec<Value>,
    function: &'static str,
) -> Result<[Value; N], EvalError> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| EvalError::ArgumentCount {
        function,
        expected: N,
        got,
    })
}

fn type_mismatch(
    function: &'static str,
    position: usize,
    expected: &'static str,
    found: &Value,
) -> EvalError {
    EvalError::TypeMismatch {
        function,
        position,
        expected,
        got: found.type_name(),
    }
}

fn expect_qexpr(
    value: Value,
    function: &'static str,
    position: usize,
) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::QExpression(items) => Ok(items),
        other => Err(type_mismatch(function, position, "Q-Expression", &other)),
    }
}

fn expect_non_empty(value: Value, function: &'static str) -> Result<Vec<Value>, EvalError> {
    let items = expect_qexpr(value, function, 1)?;
    if items.is_empty() {
        Err(EvalError::EmptyList(function))
    } else {
        Ok(items)
    }
}

fn expect_number(value: &Value, function: &'static str, position: usize) -> Result<i64, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(type_mismatch(function, position, "Number", other)),
    }
}

// --- List Builtins ---

pub fn builtin_list(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (list 1 2 3) -> {1 2 3}
    Ok(Value::QExpression(args))
}

pub fn builtin_head(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (head {1 2 3}) -> {1}
    let [list] = take_exact::<1>(args, "head")?;
    let mut items = expect_non_empty(list, "head")?;
    items.truncate(1);
    Ok(Value::QExpression(items))
}

pub fn builtin_tail(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (tail {1 2 3}) -> {2 3}
    let [list] = take_exact::<1>(args, "tail")?;
    let mut items = expect_non_empty(list, "tail")?;
    items.remove(0);
    Ok(Value::QExpression(items))
}

pub fn builtin_join(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (join {1 2} {3 4}) -> {1 2 3 4}
    let mut joined = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        joined.extend(expect_qexpr(arg, "join", i + 1)?);
    }
    Ok(Value::QExpression(joined))
}

pub fn builtin_eval(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (eval {+ 1 2}) -> 3
    let [expr] = take_exact::<1>(args, "eval")?;
    let items = expect_qexpr(expr, "eval", 1)?;
    Ok(evaluate(Value::SExpression(items), env))
}

// --- Arithmetic ---

/// Left fold over the arguments, starting from the first one.
fn fold_numbers<F: Fn(i64, i64) -> Result<i64, EvalError>>(
    args: Vec<Value>,
    operator: &'static str,
    func: F,
) -> EvalResult {
    let numbers = args
        .iter()
        .enumerate()
        .map(|(i, arg)| expect_number(arg, operator, i + 1))
        .collect::<Result<Vec<i64>, EvalError>>()?;
    let Some((&first, rest)) = numbers.split_first() else {
        return Err(EvalError::ArgumentCount {
            function: operator,
            expected: 1,
            got: 0,
        });
    };
    let mut acc = first;
    for &n in rest {
        acc = func(acc, n)?;
    }
    Ok(Value::Number(acc))
}

fn checked_divisor(n: i64) -> Result<i64, EvalError> {
    if n == 0 {
        Err(EvalError::DivisionByZero)
    } else {
        Ok(n)
    }
}

pub fn builtin_add(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "+", |acc, n| Ok(acc.wrapping_add(n)))
}

pub fn builtin_sub(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (- x) -> -x
    // (- x y z) -> x - y - z
    if let [only] = &args[..] {
        return Ok(Value::Number(expect_number(only, "-", 1)?.wrapping_neg()));
    }
    fold_numbers(args, "-", |acc, n| Ok(acc.wrapping_sub(n)))
}

pub fn builtin_mul(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "*", |acc, n| Ok(acc.wrapping_mul(n)))
}

pub fn builtin_div(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // Truncates toward zero
    fold_numbers(args, "/", |acc, n| Ok(acc.wrapping_div(checked_divisor(n)?)))
}

pub fn builtin_mod(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "%", |acc, n| Ok(acc.wrapping_rem(checked_divisor(n)?)))
}

// --- Functions and variables ---

pub fn builtin_lambda(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (\ {x y} {+ x y})
    let [formals, body] = take_exact::<2>(args, "\\")?;
    let formals = expect_qexpr(formals, "\\", 1)?;
    let body = expect_qexpr(body, "\\", 2)?;
    if let Some(bad) = formals.iter().find(|formal| formal.as_symbol().is_none()) {
        return Err(EvalError::NonSymbol {
            function: "\\",
            got: bad.type_name(),
        });
    }
    let captured = Environment::capture(env, &formals, &body);
    Ok(Value::lambda(formals, body, captured))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Global,
    Local,
}

fn bind_symbols(
    env: &Rc<RefCell<Environment>>,
    args: Vec<Value>,
    function: &'static str,
    scope: Scope,
) -> EvalResult {
    let mut args = args.into_iter();
    let Some(symbols) = args.next() else {
        return Err(EvalError::ArgumentCount {
            function,
            expected: 1,
            got: 0,
        });
    };
    let symbols = expect_qexpr(symbols, function, 1)?;
    let values: Vec<Value> = args.collect();
    if symbols.len() != values.len() {
        return Err(EvalError::BindingCount {
            function,
            symbols: symbols.len(),
            values: values.len(),
        });
    }
    let mut names = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        match symbol.as_symbol() {
            Some(name) => names.push(name),
            None => {
                return Err(EvalError::NonSymbol {
                    function,
                    got: symbol.type_name(),
                });
            }
        }
    }

    for (name, value) in names.into_iter().zip(values) {
        match scope {
            Scope::Global => Environment::define_global(env, name, value),
            Scope::Local => env.borrow_mut().put(name, value),
        }
    }
    Ok(Value::SExpression(Vec::new()))
}

pub fn builtin_def(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (def {x y} 1 2) binds in the root scope
    bind_symbols(env, args, "def", Scope::Global)
}

pub fn builtin_put(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (= {x} 1) binds in the current scope
    bind_symbols(env, args, "=", Scope::Local)
}

// --- Conditionals and comparison ---

pub fn builtin_if(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    // (if cond {then} {else}): only the chosen branch is evaluated
    let [condition, then_branch, else_branch] = take_exact::<3>(args, "if")?;
    let condition = expect_number(&condition, "if", 1)?;
    let then_branch = expect_qexpr(then_branch, "if", 2)?;
    let else_branch = expect_qexpr(else_branch, "if", 3)?;
    let chosen = if condition != 0 {
        then_branch
    } else {
        else_branch
    };
    Ok(evaluate(Value::SExpression(chosen), env))
}

fn compare_values(args: Vec<Value>, operator: &'static str, equal: bool) -> EvalResult {
    let [left, right] = take_exact::<2>(args, operator)?;
    Ok(Value::Number(i64::from((left == right) == equal)))
}

pub fn builtin_eq(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_values(args, "==", true)
}

pub fn builtin_ne(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_values(args, "!=", false)
}

fn compare_numbers<F: Fn(i64, i64) -> bool>(
    args: Vec<Value>,
    operator: &'static str,
    compare: F,
) -> EvalResult {
    let [left, right] = take_exact::<2>(args, operator)?;
    let left = expect_number(&left, operator, 1)?;
    let right = expect_number(&right, operator, 2)?;
    Ok(Value::Number(i64::from(compare(left, right))))
}

pub fn builtin_gt(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_numbers(args, ">", |left, right| left > right)
}

pub fn builtin_lt(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_numbers(args, "<", |left, right| left < right)
}

pub fn builtin_ge(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_numbers(args, ">=", |left, right| left >= right)
}

pub fn builtin_le(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> EvalResult {
    compare_numbers(args, "<=", |left, right| left <= right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nums(ns: &[i64]) -> Vec<Value> {
        ns.iter().copied().map(Value::number).collect()
    }

    fn qexpr(ns: &[i64]) -> Value {
        Value::qexpr(nums(ns))
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<&str> = BUILTINS.iter().map(|(name, _)| *name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_list_operations() {
        let env = Environment::new();
        assert_eq!(builtin_list(&env, nums(&[1, 2])), Ok(qexpr(&[1, 2])));
        assert_eq!(builtin_head(&env, vec![qexpr(&[1, 2, 3])]), Ok(qexpr(&[1])));
        assert_eq!(builtin_tail(&env, vec![qexpr(&[1, 2, 3])]), Ok(qexpr(&[2, 3])));
        assert_eq!(builtin_tail(&env, vec![qexpr(&[1])]), Ok(qexpr(&[])));
        assert_eq!(
            builtin_join(&env, vec![qexpr(&[1]), qexpr(&[]), qexpr(&[2, 3])]),
            Ok(qexpr(&[1, 2, 3]))
        );
    }

    #[test]
    fn test_list_errors() {
        let env = Environment::new();
        assert_eq!(
            builtin_head(&env, vec![qexpr(&[])]),
            Err(EvalError::EmptyList("head"))
        );
        assert_eq!(
            builtin_tail(&env, vec![qexpr(&[1]), qexpr(&[2])]),
            Err(EvalError::ArgumentCount {
                function: "tail",
                expected: 1,
                got: 2
            })
        );
        assert_eq!(
            builtin_join(&env, vec![qexpr(&[1]), Value::number(2)]),
            Err(EvalError::TypeMismatch {
                function: "join",
                position: 2,
                expected: "Q-Expression",
                got: "Number"
            })
        );
        assert_eq!(
            builtin_eval(&env, vec![Value::number(1)]),
            Err(EvalError::TypeMismatch {
                function: "eval",
                position: 1,
                expected: "Q-Expression",
                got: "Number"
            })
        );
    }

    #[test]
    fn test_arithmetic_folds() {
        let env = Environment::new();
        assert_eq!(builtin_add(&env, nums(&[1, 2, 3])), Ok(Value::number(6)));
        assert_eq!(builtin_sub(&env, nums(&[5])), Ok(Value::number(-5)));
        assert_eq!(builtin_sub(&env, nums(&[10, 3, 2])), Ok(Value::number(5)));
        assert_eq!(builtin_mul(&env, nums(&[2, 3, 4])), Ok(Value::number(24)));
        assert_eq!(builtin_div(&env, nums(&[20, 2, 5])), Ok(Value::number(2)));
        assert_eq!(builtin_div(&env, nums(&[-7, 2])), Ok(Value::number(-3)));
        assert_eq!(builtin_mod(&env, nums(&[-7, 2])), Ok(Value::number(-1)));
        assert_eq!(builtin_add(&env, nums(&[7])), Ok(Value::number(7)));
    }

    #[test]
    fn test_arithmetic_does_not_panic_on_overflow() {
        let env = Environment::new();
        assert_eq!(
            builtin_add(&env, nums(&[i64::MAX, 1])),
            Ok(Value::number(i64::MIN))
        );
        assert_eq!(
            builtin_div(&env, nums(&[i64::MIN, -1])),
            Ok(Value::number(i64::MIN))
        );
        assert_eq!(
            builtin_sub(&env, nums(&[i64::MIN])),
            Ok(Value::number(i64::MIN))
        );
    }

    #[test]
    fn test_arithmetic_errors() {
        let env = Environment::new();
        assert_eq!(builtin_div(&env, nums(&[1, 0])), Err(EvalError::DivisionByZero));
        assert_eq!(builtin_mod(&env, nums(&[1, 0])), Err(EvalError::DivisionByZero));
        assert_eq!(
            builtin_add(&env, vec![Value::number(1), qexpr(&[2])]),
            Err(EvalError::TypeMismatch {
                function: "+",
                position: 2,
                expected: "Number",
                got: "Q-Expression"
            })
        );
        assert_eq!(
            builtin_mul(&env, vec![]),
            Err(EvalError::ArgumentCount {
                function: "*",
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_lambda_rejects_non_symbol_formals() {
        let env = Environment::new();
        assert_eq!(
            builtin_lambda(&env, vec![qexpr(&[1]), qexpr(&[])]),
            Err(EvalError::NonSymbol {
                function: "\\",
                got: "Number"
            })
        );
        assert_eq!(
            builtin_lambda(&env, vec![Value::qexpr(vec![])]),
            Err(EvalError::ArgumentCount {
                function: "\\",
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_def_and_put_scopes() {
        let global_env = Environment::new();
        let local_env = Environment::default().enclose(global_env.clone());

        let defined = builtin_def(
            &local_env,
            vec![
                Value::qexpr(vec![Value::symbol("a"), Value::symbol("b")]),
                Value::number(1),
                Value::number(2),
            ],
        );
        assert_eq!(defined, Ok(Value::sexpr(vec![])));
        assert_eq!(global_env.borrow().get("b"), Value::number(2));

        builtin_put(
            &local_env,
            vec![Value::qexpr(vec![Value::symbol("c")]), Value::number(3)],
        )
        .unwrap();
        assert_eq!(local_env.borrow().get("c"), Value::number(3));
        assert!(global_env.borrow().get("c").is_error());
    }

    #[test]
    fn test_def_errors() {
        let env = Environment::new();
        assert_eq!(
            builtin_def(&env, vec![Value::qexpr(vec![Value::symbol("a")])]),
            Err(EvalError::BindingCount {
                function: "def",
                symbols: 1,
                values: 0
            })
        );
        assert_eq!(
            builtin_def(&env, vec![qexpr(&[1]), Value::number(1)]),
            Err(EvalError::NonSymbol {
                function: "def",
                got: "Number"
            })
        );
        assert_eq!(
            builtin_put(&env, vec![Value::number(1)]),
            Err(EvalError::TypeMismatch {
                function: "=",
                position: 1,
                expected: "Q-Expression",
                got: "Number"
            })
        );
        // Nothing was bound by the failed calls
        assert!(env.borrow().get_identifiers().is_empty());
    }

    #[test]
    fn test_comparisons() {
        let env = Environment::new();
        assert_eq!(builtin_gt(&env, nums(&[2, 1])), Ok(Value::number(1)));
        assert_eq!(builtin_lt(&env, nums(&[2, 1])), Ok(Value::number(0)));
        assert_eq!(builtin_ge(&env, nums(&[2, 2])), Ok(Value::number(1)));
        assert_eq!(builtin_le(&env, nums(&[3, 2])), Ok(Value::number(0)));
        assert_eq!(
            builtin_eq(&env, vec![qexpr(&[1, 2]), qexpr(&[1, 2])]),
            Ok(Value::number(1))
        );
        assert_eq!(
            builtin_ne(&env, vec![qexpr(&[1, 2]), qexpr(&[1, 2])]),
            Ok(Value::number(0))
        );
        assert_eq!(
            builtin_eq(&env, vec![Value::number(1), qexpr(&[1])]),
            Ok(Value::number(0))
        );
        assert_eq!(
            builtin_gt(&env, vec![Value::number(1), qexpr(&[1])]),
            Err(EvalError::TypeMismatch {
                function: ">",
                position: 2,
                expected: "Number",
                got: "Q-Expression"
            })
        );
    }
}
