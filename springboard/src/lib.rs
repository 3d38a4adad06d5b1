//! Springboard
//!
//! A stack-safe evaluation engine for deeply chained, lazily built
//! computations. Consumers describe "do this, then that" as trees of two-slot
//! continuation nodes allocated from a [`ContinuationPool`]; [`trampoline`]
//! drains such a tree to a plain value using an explicit stack, so the native
//! call stack does not grow with the length of the chain, and recycles every
//! node back into the pool as it goes.
//!
//! Alongside the engine the crate carries the pieces its consumers lean on: a
//! best-effort bind detector ([`monad`]), a small dynamic value domain for
//! duck-typed interop ([`value`]), and generic functional helpers
//! ([`helpers`], [`deferred`]).
//!
//! # Example
//! ```
//! use springboard::{ContinuationPool, Step, trampoline};
//!
//! let mut pool = ContinuationPool::<u64>::new();
//! let mut step = pool.defer(|_| Ok(Step::Value(0)));
//! for _ in 0..10_000 {
//!     step = pool.then(step, |_, n| Ok(Step::Value(n + 1)));
//! }
//! assert_eq!(trampoline(&mut pool, step).unwrap(), 10_000);
//! assert_eq!(pool.in_use(), 0);
//! ```
//!
//! The engine is single-threaded and not reentrant: a pool must not be shared
//! by two evaluations in flight at the same time.

pub mod deferred;
pub mod helpers;
pub mod interpreter;
pub mod monad;
pub mod pool;
pub mod value;

pub use interpreter::signal::{RunEnv, RunSignal, is_run_signal, run_signal};
pub use interpreter::{Step, run, trampoline};
pub use pool::{ContId, ContinuationError, ContinuationPool, Left, PoolConfig, PoolStats};
