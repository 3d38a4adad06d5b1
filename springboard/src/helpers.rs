//! Generic functional helpers over [`Value`]s.

use crate::value::{Function, Value};
use anyhow::{Result, anyhow};
use std::rc::Rc;

pub fn identity<T>(value: T) -> T {
    value
}

pub fn is_callable(value: &Value) -> bool {
    matches!(value, Value::Function(_))
}

/// Whether `value` exposes a callable `then`.
pub fn is_promise_like(value: &Value) -> bool {
    value.method("then").is_some()
}

/// A function that ignores its arguments and returns unit.
pub fn noop() -> Function {
    Function::new("noop", 0, |_| Ok(Value::Unit))
}

/// Returns a function collecting arguments across calls, in any grouping,
/// until `arity` of them are available, then calls `f` with all of them.
///
/// `arity` defaults to the declared arity of `f`.
pub fn curry(f: &Function, arity: Option<usize>) -> Function {
    let arity = arity.unwrap_or_else(|| f.arity());
    next_curried(f.clone(), arity, Rc::from([]))
}

fn next_curried(f: Function, arity: usize, collected: Rc<[Value]>) -> Function {
    let name = format!("curried {}", f.name());
    let remaining = arity.saturating_sub(collected.len());
    Function::new(&name, remaining, move |next| {
        let args: Vec<Value> = collected.iter().chain(next).cloned().collect();
        if args.len() >= arity {
            f.call(&args)
        } else {
            Ok(Value::Function(next_curried(f.clone(), arity, args.into())))
        }
    })
}

/// Appends `value` to `seed` through the seed's own `concat`.
pub fn fold(seed: &Value, value: Value) -> Result<Value> {
    seed.call_method("concat", &[value])
}

/// Maps `f` over `list` and folds the results together.
///
/// With a seed, folding starts from it, so empty lists are fine. Without one,
/// folding starts from `f(list[0])`, and an empty list yields `None`.
pub fn fold_map(f: &Function, list: &[Value], empty: Option<Value>) -> Result<Option<Value>> {
    let (mut acc, rest) = match (empty, list.split_first()) {
        (Some(seed), _) => (seed, list),
        (None, Some((first, rest))) => (f.call(std::slice::from_ref(first))?, rest),
        (None, None) => return Ok(None),
    };
    for item in rest {
        acc = fold(&acc, f.call(std::slice::from_ref(item))?)?;
    }
    Ok(Some(acc))
}

/// [`fold`] as a curried two-argument function value.
pub fn fold_fn() -> Function {
    let folder = Function::new("fold", 2, |args| match args {
        [seed, value, ..] => fold(seed, value.clone()),
        _ => Err(anyhow!("fold expects a seed and a value")),
    });
    curry(&folder, Some(2))
}

/// [`fold_map`] as a curried function value. It fires once the function and
/// the list are given; a third argument passed in the same call is the seed.
/// Folding an empty list without a seed returns unit.
pub fn fold_map_fn() -> Function {
    let folder = Function::new("foldMap", 3, |args| {
        let f = args
            .first()
            .and_then(Value::as_function)
            .ok_or_else(|| anyhow!("foldMap expects a function"))?;
        let list = args
            .get(1)
            .and_then(Value::as_list)
            .ok_or_else(|| anyhow!("foldMap expects a list"))?;
        Ok(fold_map(f, list, args.get(2).cloned())?.unwrap_or(Value::Unit))
    });
    curry(&folder, Some(2))
}
