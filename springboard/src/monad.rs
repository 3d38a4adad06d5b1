//! Bind capability.
//!
//! Values that know how to sequence a follow-up expose it through
//! [`Bindable`]. Foreign values never implement the trait themselves: they are
//! adapted at a single conversion point, [`ForeignBindable::adapt_with`], which
//! applies a structural check.
//!
//! The check is a heuristic, not a type check. A value passes when it is an
//! object carrying a callable `flatMap`, `chain` or `bind` (first present name
//! wins), that function is not a known unrelated built-in, and it is not opaque
//! native code unless it was explicitly bound. False positives and negatives are
//! silent.

use crate::value::{Builtin, Function, Record, Value};
use anyhow::{Result, anyhow};
use std::sync::LazyLock;

/// Conventional bind names, in lookup priority.
pub const BIND_NAMES: [&str; 3] = ["flatMap", "chain", "bind"];

/// Prefix carried by explicitly bound functions.
const BOUND_PREFIX: &str = "bound";

static DEFAULT_DETECTOR: LazyLock<MonadDetector> = LazyLock::new(MonadDetector::default);

/// Structural bind detector with an extensible denylist of built-ins that
/// happen to share a bind name.
#[derive(Debug, Clone)]
pub struct MonadDetector {
    denylist: Vec<Builtin>,
}

impl Default for MonadDetector {
    fn default() -> Self {
        Self {
            denylist: vec![Builtin::FunctionBind, Builtin::ListFlatMap],
        }
    }
}

impl MonadDetector {
    /// Adds a built-in to the denylist.
    pub fn deny(&mut self, builtin: Builtin) -> &mut Self {
        if !self.denylist.contains(&builtin) {
            self.denylist.push(builtin);
        }
        self
    }

    pub fn is_denied(&self, function: &Function) -> bool {
        function
            .builtin()
            .is_some_and(|builtin| self.denylist.contains(&builtin))
    }

    /// Returns the bind-equivalent function of `value`, if it has a callable one.
    ///
    /// Only the first truthy property among [`BIND_NAMES`] is considered; a
    /// non-callable `flatMap` hides a callable `chain`.
    pub fn get_bind(&self, value: &Value) -> Option<Function> {
        let candidate = BIND_NAMES
            .iter()
            .filter_map(|name| value.property(name))
            .find(Value::is_truthy)?;
        match candidate {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn is_monad_like(&self, value: &Value) -> bool {
        self.checked_bind(value).is_some()
    }

    /// The bind function of `value`, if `value` passes the structural check.
    fn checked_bind(&self, value: &Value) -> Option<Function> {
        if !value.is_object() {
            return None;
        }
        let bind = self.get_bind(value)?;
        let accepted =
            !self.is_denied(&bind) && (!bind.is_native() || bind.name().starts_with(BOUND_PREFIX));
        accepted.then_some(bind)
    }
}

pub fn get_bind(value: &Value) -> Option<Function> {
    DEFAULT_DETECTOR.get_bind(value)
}

pub fn is_monad_like(value: &Value) -> bool {
    DEFAULT_DETECTOR.is_monad_like(value)
}

/// Capability to sequence a follow-up function after a value.
pub trait Bindable {
    /// Feeds the wrapped value to `f` and returns whatever `f` produces.
    fn bind(&self, f: &Function) -> Result<Value>;

    /// The bindable as a plain [`Value`].
    fn to_value(&self) -> Value;
}

/// Default single-value container.
#[derive(Debug, Clone, PartialEq)]
pub struct Just(Value);

impl Just {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl Bindable for Just {
    fn bind(&self, f: &Function) -> Result<Value> {
        f.call(std::slice::from_ref(&self.0))
    }

    /// A record exposing `value`, `map`, and `chain` (aliased as `flatMap` and `bind`).
    fn to_value(&self) -> Value {
        let chain = {
            let value = self.0.clone();
            Function::new("chain", 1, move |args| apply_callback(args, &value))
        };
        let map = {
            let value = self.0.clone();
            Function::new("map", 1, move |args| {
                Ok(Just::new(apply_callback(args, &value)?).to_value())
            })
        };
        Record::new()
            .with("value", self.0.clone())
            .with("map", map)
            .with("chain", chain.clone())
            .with("flatMap", chain.clone())
            .with("bind", chain)
            .into()
    }
}

fn apply_callback(args: &[Value], value: &Value) -> Result<Value> {
    let f = args
        .first()
        .and_then(Value::as_function)
        .ok_or_else(|| anyhow!("expected a function argument"))?;
    f.call(std::slice::from_ref(value))
}

/// A foreign value that passed the structural bind check.
#[derive(Debug, Clone)]
pub struct ForeignBindable {
    value: Value,
    bind: Function,
}

impl ForeignBindable {
    /// Adapts `value` using the default detector, handing it back on failure.
    pub fn adapt(value: Value) -> Result<Self, Value> {
        Self::adapt_with(&DEFAULT_DETECTOR, value)
    }

    pub fn adapt_with(detector: &MonadDetector, value: Value) -> Result<Self, Value> {
        match detector.checked_bind(&value) {
            Some(bind) => Ok(Self { value, bind }),
            None => Err(value),
        }
    }
}

impl Bindable for ForeignBindable {
    fn bind(&self, f: &Function) -> Result<Value> {
        self.bind.call_with(&self.value, &[Value::Function(f.clone())])
    }

    fn to_value(&self) -> Value {
        self.value.clone()
    }
}

/// Result of lifting a value into the bindable domain.
#[derive(Debug, Clone)]
pub enum Lifted {
    Just(Just),
    Foreign(ForeignBindable),
}

impl Lifted {
    pub fn into_value(self) -> Value {
        match self {
            Lifted::Just(just) => just.to_value(),
            Lifted::Foreign(foreign) => foreign.value,
        }
    }
}

impl Bindable for Lifted {
    fn bind(&self, f: &Function) -> Result<Value> {
        match self {
            Lifted::Just(just) => just.bind(f),
            Lifted::Foreign(foreign) => foreign.bind(f),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Lifted::Just(just) => just.to_value(),
            Lifted::Foreign(foreign) => foreign.to_value(),
        }
    }
}

/// Keeps monad-like values as they are and wraps everything else in [`Just`].
pub fn lift_m(value: Value) -> Lifted {
    match ForeignBindable::adapt(value) {
        Ok(foreign) => Lifted::Foreign(foreign),
        Err(value) => Lifted::Just(Just::new(value)),
    }
}

pub fn lift_into_default(value: Value) -> Value {
    lift_m(value).into_value()
}
