//! This module provides the trampoline that drains continuation trees.
//!
//! A chain of dependent steps ("do this, then that") is naturally recursive:
//! each follow-up is only discovered once the step before it resolves. The
//! trampoline walks such chains with an explicit, heap-resident stack of node
//! ids instead of the native call stack, so the native stack depth stays
//! constant no matter how long the chain is.

pub mod signal;

use crate::pool::{ContId, ContinuationError, ContinuationPool, Left};
use anyhow::Result;
use signal::{RunEnv, is_run_signal};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Either a plain value or a pending continuation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    Value(T),
    Continuation(ContId),
}

impl<T> Step<T> {
    pub fn is_continuation(&self) -> bool {
        matches!(self, Step::Continuation(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Step::Value(value) => Some(value),
            Step::Continuation(_) => None,
        }
    }
}

/// Explicit evaluation stack. Shallow chains never touch the heap.
type EvalStack = SmallVec<[ContId; 16]>;

/// Evaluates `step` down to a plain value.
///
/// Plain values are returned untouched. Otherwise the continuation tree is
/// evaluated depth-first along its left spine; each node is pushed onto the
/// explicit stack with its left-hand result memoized in place. Once a plain
/// value is reached the stack is unwound, feeding the running value through
/// every right-hand follow-up and recycling each node as it is popped. A
/// follow-up that yields another continuation "bounces" evaluation back into
/// descent before the rest of the stack is unwound.
///
/// Errors from thunks and follow-ups propagate unchanged. Before propagating,
/// every node still on the stack is recycled, so the pool does not leak nodes
/// on failure. Panics unwinding out of user closures still abandon them.
pub fn trampoline<T>(pool: &mut ContinuationPool<T>, step: Step<T>) -> Result<T> {
    let root = match step {
        Step::Value(value) => return Ok(value),
        Step::Continuation(id) => id,
    };

    trace!(%root, "trampoline start");
    let mut stack = EvalStack::new();
    let result = drain(pool, root, &mut stack);

    if result.is_err() && !stack.is_empty() {
        debug!(abandoned = stack.len(), "recycling continuations after error");
        for id in stack.drain(..) {
            // Stale ids (pool reset mid-flight) are skipped.
            let _ = pool.recycle(id);
        }
    }
    result
}

fn drain<T>(pool: &mut ContinuationPool<T>, root: ContId, stack: &mut EvalStack) -> Result<T> {
    let mut current = root;

    'descent: loop {
        // Resolve the left spine, pushing every node on the way down.
        loop {
            let left = pool.take_left(current)?;
            stack.push(current);

            let resolved = match left {
                Some(Left::Thunk(thunk)) => thunk(pool)?,
                Some(Left::Ready(step)) => step,
                None => return Err(ContinuationError::MissingLeft(current).into()),
            };

            match resolved {
                Step::Continuation(next) => {
                    pool.set_left(current, Step::Continuation(next))?;
                    current = next;
                }
                Step::Value(value) => {
                    pool.set_left(current, Step::Value(value))?;
                    break;
                }
            }
        }

        // The innermost node holds the value that starts the unwind.
        let mut running = match pool.take_left(current)? {
            Some(Left::Ready(Step::Value(value))) => value,
            _ => return Err(ContinuationError::Unresolved(current).into()),
        };

        while let Some(id) = stack.pop() {
            let right = pool.take_right(id)?;
            pool.recycle(id)?;

            if let Some(right) = right {
                match right(pool, running)? {
                    Step::Continuation(next) => {
                        trace!(from = %id, to = %next, depth = stack.len(), "bounce");
                        current = next;
                        continue 'descent;
                    }
                    Step::Value(value) => running = value,
                }
            }
        }

        trace!(%root, "trampoline done");
        return Ok(running);
    }
}

/// Runs a pending step on behalf of an effect wrapper.
///
/// With a run signal the step is handed back unevaluated, so an external
/// scheduler can drive it later. Otherwise it is trampolined to a value.
pub fn run<T, E>(pool: &mut ContinuationPool<T>, step: Step<T>, env: &RunEnv<E>) -> Result<Step<T>> {
    if is_run_signal(env) {
        Ok(step)
    } else {
        trampoline(pool, step).map(Step::Value)
    }
}
