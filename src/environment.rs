use crate::builtins::BUILTINS;
use crate::evaluator::EvalError;
use crate::types::{BuiltinFn, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

// --- Environment Definition ---

#[derive(Debug, Clone, Default)]
pub struct Environment {
    // Shared, never owned: a scope does not keep its parent's bindings alive
    // beyond the lifetime of the caller that attached it.
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Value>, // Maps symbol names to owned Values
}

impl Environment {
    /// Creates a new, top-level (root) environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Creates the root environment with every builtin registered.
    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new(); // Create empty global env
        {
            // Borrow mutably only inside this scope
            let mut env = env_ptr.borrow_mut();
            for &(name, func) in BUILTINS {
                env.add_builtin(name, func);
            }
        }
        debug!(count = BUILTINS.len(), "registered builtins");
        env_ptr
    }

    /// Turns a detached scope (a closure's bindings) into a live one whose
    /// parent is `outer`.
    pub fn enclose(self, outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: self.bindings,
        }))
    }

    /// Looks up a symbol, walking outward through parent scopes.
    ///
    /// Returns a copy of the bound value, or an `Error` value when the name is
    /// bound nowhere in the chain.
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.bindings.get(name) {
            return value.clone();
        }
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow().get(name),
            None => EvalError::UnboundSymbol(name.to_string()).into(),
        }
    }

    /// Binds `name` in *this* frame, replacing any previous value here.
    pub fn put(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Binds `name` in the root of the chain that `env` belongs to.
    pub fn define_global(env: &Rc<RefCell<Environment>>, name: &str, value: Value) {
        let root = Environment::root(env);
        debug!(name, "global definition");
        root.borrow_mut().put(name, value);
    }

    /// Follows parent links until a scope without a parent is found.
    pub fn root(env: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        let mut current = env.clone();
        loop {
            let outer = current.borrow().outer.clone();
            match outer {
                Some(outer_env_ptr) => current = outer_env_ptr,
                None => return current,
            }
        }
    }

    /// Deep copy of this scope's bindings. The parent link is shared, not copied.
    pub fn fork(&self) -> Environment {
        self.clone()
    }

    /// Bindings a new closure takes with it from the scope it is created in.
    ///
    /// Only symbols that occur in `body`, are not among `formals`, and are bound
    /// below the root are copied. Everything else is still resolved through
    /// the caller's scope when the closure runs.
    pub fn capture(
        env: &Rc<RefCell<Environment>>,
        formals: &[Value],
        body: &[Value],
    ) -> Environment {
        let mut names = HashSet::new();
        collect_symbols(body, &mut names);
        for formal in formals.iter().filter_map(Value::as_symbol) {
            names.remove(formal);
        }

        let scope = env.borrow();
        let mut captured = Environment::default();
        for name in names {
            if let Some(value) = scope.lookup_below_root(name) {
                captured.put(name, value);
            }
        }
        captured
    }

    fn lookup_below_root(&self, name: &str) -> Option<Value> {
        let outer_env_ptr = self.outer.as_ref()?;
        match self.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => outer_env_ptr.borrow().lookup_below_root(name),
        }
    }

    /// Helper to add a builtin operation to the environment.
    fn add_builtin(&mut self, name: &'static str, func: BuiltinFn) {
        self.put(name, Value::builtin(name, func));
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match self.outer {
            Some(ref outer_env_ptr) => outer_env_ptr.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets every identifier visible from this environment.
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}

fn collect_symbols<'a>(items: &'a [Value], names: &mut HashSet<&'a str>) {
    for item in items {
        match item {
            Value::Symbol(name) => {
                names.insert(name);
            }
            Value::SExpression(children) | Value::QExpression(children) => {
                collect_symbols(children, names)
            }
            _ => {}
        }
    }
}
