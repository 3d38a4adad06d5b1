#[macro_use]
mod common;

use anyhow::bail;
use common::TestResult;
use springboard::helpers::{curry, fold_map};
use springboard::monad::is_monad_like;
use springboard::value::{Function, Record, Value};
use springboard::{
    ContinuationPool, Left, PoolConfig, RunEnv, Step, run, run_signal, trampoline,
};
use std::cell::RefCell;
use std::rc::Rc;

const DEPTH: i64 = 100_000;

/// One of the steps composed in the deep chain tests.
fn step_fn(i: i64, x: i64) -> i64 {
    (x * 31 + i) % 1_000_003
}

fn direct_composition(n: i64) -> i64 {
    (1..=n).fold(1, |x, i| step_fn(i, x))
}

/// Builds a chain of `n` follow-ups resolving each step only when the
/// previous one produced its value.
fn bounce_from(pool: &mut ContinuationPool<i64>, i: i64, x: i64, n: i64) -> Step<i64> {
    if i > n {
        return Step::Value(x);
    }
    pool.then(Step::Value(x), move |pool, x| {
        Ok(bounce_from(pool, i + 1, step_fn(i, x), n))
    })
}

check_trampoline!(
    test_plain_value,
    build = |_| Step::Value(42),
    result = TestResult::Value(42)
);

check_trampoline!(
    test_pass_through,
    build = |pool| pool.defer(|_| Ok(Step::Value(5))),
    result = TestResult::Value(5)
);

check_trampoline!(
    test_single_then,
    build = |pool| {
        let left = pool.defer(|_| Ok(Step::Value(5)));
        pool.then(left, |_, x| Ok(Step::Value(x + 1)))
    },
    result = TestResult::Value(6)
);

check_trampoline!(
    test_bounce,
    build = |pool| {
        let id = pool.continuation_then(Left::thunk(|_| Ok(Step::Value(1))), |pool, x| {
            let next = pool.continuation_then(Left::thunk(move |_| Ok(Step::Value(x + 1))), |_, y| {
                Ok(Step::Value(y * 2))
            });
            Ok(Step::Continuation(next))
        });
        Step::Continuation(id)
    },
    result = TestResult::Value(4)
);

check_trampoline!(
    test_placeholder_filled_later,
    build = |pool| {
        let id = pool.make_continuation();
        pool.set_left(id, Left::value(20)).unwrap();
        pool.set_right(id, |_, x| Ok(Step::Value(x + 2))).unwrap();
        Step::Continuation(id)
    },
    result = TestResult::Value(22)
);

check_trampoline!(
    test_left_returning_continuation,
    build = |pool| {
        let outer = pool.defer(|pool| {
            let inner = pool.defer(|_| Ok(Step::Value(3)));
            Ok(pool.then(inner, |_, x| Ok(Step::Value(x * 10))))
        });
        pool.then(outer, |_, x| Ok(Step::Value(x + 1)))
    },
    result = TestResult::Value(31)
);

check_trampoline!(
    test_unset_placeholder_fails,
    build = |pool| Step::Continuation(pool.make_continuation()),
    result = TestResult::ErrorRegex(r"Continuation #\d+ has no left-hand step".to_string())
);

check_trampoline!(
    test_thunk_error_propagates,
    build = |pool| {
        let failing = pool.defer(|_| bail!("thunk failed at step 3"));
        let step = pool.then(failing, |_, x| Ok(Step::Value(x + 1)));
        pool.then(step, |_, x| Ok(Step::Value(x + 1)))
    },
    result = TestResult::Error("thunk failed at step 3".to_string())
);

check_trampoline!(
    test_follow_up_error_mid_unwind,
    build = |pool| {
        let mut step = pool.defer(|_| Ok(Step::Value(0)));
        for i in 0..10 {
            step = pool.then(step, move |_, x| {
                if i == 5 {
                    bail!("follow-up failed at step {}", i);
                }
                Ok(Step::Value(x + 1))
            });
        }
        step
    },
    result = TestResult::ErrorRegex(r"^follow-up failed at step \d+$".to_string())
);

check_trampoline!(
    test_deep_nested_chain,
    build = |pool| {
        let mut step = pool.defer(|_| Ok(Step::Value(1)));
        for i in 1..=DEPTH {
            step = pool.then(step, move |_, x| Ok(Step::Value(step_fn(i, x))));
        }
        step
    },
    result = TestResult::Value(direct_composition(DEPTH))
);

check_trampoline!(
    test_deep_bouncing_chain,
    build = |pool| pool.defer(|pool| Ok(bounce_from(pool, 1, 1, DEPTH))),
    result = TestResult::Value(direct_composition(DEPTH))
);

check_trampoline!(
    test_deep_left_spine,
    build = |pool| {
        let mut step = Step::Continuation(pool.continuation(Left::value(0)));
        for _ in 0..DEPTH {
            step = Step::Continuation(pool.continuation(step));
        }
        step
    },
    result = TestResult::Value(0)
);

#[test]
fn test_reduce_over_effects() {
    // Each step records its side effect, in order, before the next is built.
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pool = ContinuationPool::<i64>::new();

    let mut step = Step::Value(0);
    for item in 0..DEPTH {
        let log = Rc::clone(&log);
        step = pool.then(step, move |_, acc| {
            log.borrow_mut().push(item);
            Ok(Step::Value(acc + item))
        });
    }

    let total = trampoline(&mut pool, step).unwrap();
    assert_eq!(total, (0..DEPTH).sum::<i64>());
    assert_eq!(log.borrow().len() as i64, DEPTH);
    assert!(log.borrow().windows(2).all(|w| w[0] < w[1]));
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_pool_is_reused_across_runs() {
    let mut pool = ContinuationPool::<i64>::new();
    for round in 0..3 {
        let left = pool.defer(move |_| Ok(Step::Value(round)));
        let step = pool.then(left, |_, x| Ok(Step::Value(x * 2)));
        assert_eq!(trampoline(&mut pool, step).unwrap(), round * 2);
    }
    assert_eq!(pool.stats().capacity, 100);
    assert_eq!(pool.stats().in_use, 0);
}

#[test]
fn test_growth_past_capacity() {
    let mut pool = ContinuationPool::<i64>::with_config(PoolConfig {
        initial_capacity: 10,
        first_growth: 100,
    });
    let held: Vec<_> = (0..10).map(|_| pool.make_continuation()).collect();
    assert_eq!(pool.stats().free(), 0);

    let extra = pool.make_continuation();
    assert!(pool.capacity() >= 20);
    assert!(pool.is_live(extra));
    assert!(!held.contains(&extra));

    pool.grow(25);
    assert!(pool.capacity() >= 45);
    let step = pool.defer(|_| Ok(Step::Value(1)));
    assert_eq!(trampoline(&mut pool, step).unwrap(), 1);
}

#[test]
fn test_reset_then_reuse() {
    let mut pool = ContinuationPool::<i64>::new();
    let stale = pool.make_continuation();
    pool.reset();
    assert_eq!(pool.capacity(), 0);
    assert!(pool.recycle(stale).is_err());

    let step = pool.defer(|_| Ok(Step::Value(9)));
    assert_eq!(trampoline(&mut pool, step).unwrap(), 9);
    assert_eq!(pool.capacity(), 100);
}

#[test]
fn test_run_signal_defers_evaluation() {
    let mut pool = ContinuationPool::<i64>::new();
    let left = pool.defer(|_| Ok(Step::Value(20)));
    let step = pool.then(left, |_, x| Ok(Step::Value(x + 1)));

    let signal = run_signal(RunEnv::Env("scheduler"));
    let pending = run(&mut pool, step, &signal).unwrap();
    assert!(pending.is_continuation());

    // The scheduler drives it later
    assert_eq!(trampoline(&mut pool, pending).unwrap(), 21);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_detector_examples() {
    let flat_map = Function::new("flatMap", 1, |args| Ok(args[0].clone()));
    assert!(is_monad_like(&Record::new().with("flatMap", flat_map).into()));
    assert!(!is_monad_like(&Record::new().into()));
    assert!(!is_monad_like(&Value::list([Value::Int(1), Value::Int(2)])));
}

#[test]
fn test_helper_examples() {
    let sub = Function::new("sub", 2, |args| {
        Ok(Value::Int(
            args[0].as_int().unwrap_or_default() - args[1].as_int().unwrap_or_default(),
        ))
    });
    let direct = sub.call(&[Value::Int(1), Value::Int(2)]).unwrap();
    let curried = curry(&sub, Some(2));
    let partial = curried.call(&[Value::Int(1)]).unwrap();
    assert_eq!(partial.as_function().unwrap().call(&[Value::Int(2)]).unwrap(), direct);
    assert_eq!(curried.call(&[Value::Int(1), Value::Int(2)]).unwrap(), direct);

    let singleton = Function::new("singleton", 1, |args| Ok(Value::list([args[0].clone()])));
    let list = [Value::Int(1), Value::Int(2), Value::Int(3)];
    assert_eq!(fold_map(&singleton, &list, None).unwrap(), Some(Value::list(list.clone())));
    assert_eq!(
        fold_map(&singleton, &[], Some(Value::list([]))).unwrap(),
        Some(Value::list([]))
    );
}
