use anyhow::Result;
use springboard::{ContinuationPool, PoolConfig, PoolStats, Step, trampoline};
use std::fmt;
use tracing::info;

/// Outcome of one driver run.
#[derive(Debug)]
pub struct Report {
    pub result: u64,
    pub before: PoolStats,
    pub after: PoolStats,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "result: {}", self.result)?;
        writeln!(f, "pool before: {}", self.before)?;
        write!(f, "pool after:  {}", self.after)
    }
}

/// Builds the whole chain up front as `depth` nested `then` steps.
pub fn run_chain(config: PoolConfig, depth: u64) -> Result<Report> {
    let mut pool = ContinuationPool::with_config(config);
    let before = pool.stats();

    let step = nested_chain(&mut pool, depth);
    info!(depth, pool = %pool.stats(), "chain built");

    let result = trampoline(&mut pool, step)?;
    Ok(Report {
        result,
        before,
        after: pool.stats(),
    })
}

/// Builds each step lazily from the previous step's result.
pub fn run_bounce(config: PoolConfig, depth: u64) -> Result<Report> {
    let mut pool = ContinuationPool::with_config(config);
    let before = pool.stats();

    let step = pool.defer(move |pool| Ok(bounce_from(pool, 0, depth)));
    let result = trampoline(&mut pool, step)?;
    Ok(Report {
        result,
        before,
        after: pool.stats(),
    })
}

fn nested_chain(pool: &mut ContinuationPool<u64>, depth: u64) -> Step<u64> {
    let mut step = pool.defer(|_| Ok(Step::Value(0)));
    for _ in 0..depth {
        step = pool.then(step, |_, n| Ok(Step::Value(n + 1)));
    }
    step
}

fn bounce_from(pool: &mut ContinuationPool<u64>, n: u64, depth: u64) -> Step<u64> {
    if n >= depth {
        return Step::Value(n);
    }
    pool.then(Step::Value(n), move |pool, n| Ok(bounce_from(pool, n + 1, depth)))
}
