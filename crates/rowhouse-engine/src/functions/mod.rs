//! The function registry: the engine's single dynamic-dispatch point.
//!
//! Named functions resolve case-insensitively to either a scalar
//! function (`execute(args, distinct)`) or an aggregate function
//! (`create_state` / `accumulate` / `finalize`). The executor never
//! switches on concrete function identity.

mod aggregate;
mod scalar;

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::value::Value;

/// Implementation signature of a scalar function.
pub type ScalarImpl = fn(&[Value], bool) -> Result<Value>;

/// A registered scalar function.
#[derive(Clone)]
pub struct ScalarFunction {
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    imp: ScalarImpl,
}

impl ScalarFunction {
    /// Runs the function after checking the argument count.
    ///
    /// # Errors
    ///
    /// Returns an `arity` error for a wrong argument count, or whatever
    /// the implementation raises.
    pub fn execute(&self, args: &[Value], distinct: bool) -> Result<Value> {
        check_arity(self.name, self.min_args, self.max_args, args.len())?;
        (self.imp)(args, distinct)
    }

    /// The canonical function name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Mutable per-group accumulator of an aggregate function.
pub trait AggregateState {
    /// Folds one row's argument values into the state.
    ///
    /// # Errors
    ///
    /// Returns a `type` error when an argument kind is unsupported.
    fn accumulate(&mut self, args: &[Value]) -> Result<()>;

    /// Produces the aggregate value.
    ///
    /// # Errors
    ///
    /// Implementations may fail on unsupported accumulated states.
    fn finalize(&mut self) -> Result<Value>;
}

/// A registered aggregate function.
#[derive(Clone)]
pub struct AggregateFunction {
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    factory: fn() -> Box<dyn AggregateState>,
}

impl AggregateFunction {
    /// Creates a fresh accumulator.
    #[must_use]
    pub fn create_state(&self) -> Box<dyn AggregateState> {
        (self.factory)()
    }

    /// Checks an argument count against this aggregate's arity.
    ///
    /// # Errors
    ///
    /// Returns an `arity` error for a wrong argument count.
    pub fn check_arity(&self, actual: usize) -> Result<()> {
        check_arity(self.name, self.min_args, self.max_args, actual)
    }

    /// Scalar-compatibility shim: a one-value state, accumulated once
    /// and finalized.
    ///
    /// # Errors
    ///
    /// Propagates arity and accumulation errors.
    pub fn execute_scalar(&self, args: &[Value]) -> Result<Value> {
        self.check_arity(args.len())?;
        let mut state = self.create_state();
        state.accumulate(args)?;
        state.finalize()
    }

    /// The canonical function name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// A registry entry.
#[derive(Clone)]
pub enum Function {
    /// A scalar function.
    Scalar(ScalarFunction),
    /// An aggregate function.
    Aggregate(AggregateFunction),
}

fn check_arity(
    name: &str,
    min_args: usize,
    max_args: Option<usize>,
    actual: usize,
) -> Result<()> {
    let ok = actual >= min_args && max_args.map_or(true, |max| actual <= max);
    if ok {
        return Ok(());
    }
    let expected = match max_args {
        Some(max) if max == min_args => format!("{min_args}"),
        Some(max) => format!("{min_args} to {max}"),
        None => format!("at least {min_args}"),
    };
    Err(EngineError::Arity {
        name: String::from(name),
        expected,
        actual,
    })
}

/// Case-insensitive mapping from function name to implementation.
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Creates a registry populated with the built-in function library.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        scalar::register(&mut registry);
        aggregate::register(&mut registry);
        registry
    }

    /// Registers a scalar function.
    pub fn register_scalar(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        imp: ScalarImpl,
    ) {
        self.functions.insert(
            name.to_lowercase(),
            Function::Scalar(ScalarFunction {
                name,
                min_args,
                max_args,
                imp,
            }),
        );
    }

    /// Registers an aggregate function.
    pub fn register_aggregate(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        factory: fn() -> Box<dyn AggregateState>,
    ) {
        self.functions.insert(
            name.to_lowercase(),
            Function::Aggregate(AggregateFunction {
                name,
                min_args,
                max_args,
                factory,
            }),
        );
    }

    /// Registers `alias` as another name for `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` has not been registered; aliases are wired at
    /// setup time where the target is statically known.
    pub fn alias(&mut self, alias: &str, target: &str) {
        let entry = self.functions[&target.to_lowercase()].clone();
        self.functions.insert(alias.to_lowercase(), entry);
    }

    /// Looks up a function case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(&name.to_lowercase())
    }

    /// True if the name resolves to an aggregate function.
    #[must_use]
    pub fn is_aggregate(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Function::Aggregate(_)))
    }

    /// Looks up an aggregate function.
    #[must_use]
    pub fn get_aggregate(&self, name: &str) -> Option<&AggregateFunction> {
        match self.get(name) {
            Some(Function::Aggregate(agg)) => Some(agg),
            _ => None,
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
