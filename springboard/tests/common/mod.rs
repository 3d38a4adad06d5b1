//! Common test utilities and macros

use springboard::{ContinuationPool, Step, trampoline};

#[derive(Debug)]
pub enum TestResult {
    Value(i64),
    Error(String),
    ErrorRegex(String),
}

impl PartialEq for TestResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TestResult::Value(a), TestResult::Value(b)) => a == b,
            (TestResult::Error(a), TestResult::Error(b)) => a == b,
            (TestResult::ErrorRegex(pattern), TestResult::Error(msg)) => {
                regex::Regex::new(pattern).unwrap().is_match(msg)
            }
            (TestResult::Error(msg), TestResult::ErrorRegex(pattern)) => {
                regex::Regex::new(pattern).unwrap().is_match(msg)
            }
            _ => false,
        }
    }
}

/// Builds a continuation tree in a fresh pool and drains it.
///
/// Also checks that the evaluation hands every node it consumed back to the
/// pool, whether it succeeded or not.
pub fn run_trampoline_test<F>(build: F) -> TestResult
where
    F: FnOnce(&mut ContinuationPool<i64>) -> Step<i64>,
{
    let mut pool = ContinuationPool::new();
    let in_use = pool.in_use();

    let step = build(&mut pool);
    let result = trampoline(&mut pool, step);

    assert_eq!(pool.in_use(), in_use, "continuation nodes leaked");
    match result {
        Ok(value) => TestResult::Value(value),
        Err(e) => TestResult::Error(e.to_string()),
    }
}

#[macro_export]
macro_rules! check_trampoline {
    ($test_name:ident, build=$build:expr, result=$expected:expr) => {
        #[test]
        fn $test_name() {
            let result = crate::common::run_trampoline_test($build);
            assert_eq!(result, $expected);
        }
    };
}
