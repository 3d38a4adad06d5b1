//! Run signals.
//!
//! An effect wrapper asked to "run" normally forces its continuation through
//! the trampoline. When the request comes from an external scheduler instead,
//! the environment is wrapped in a [`RunSignal`], telling the wrapper to hand
//! back the pending continuation untouched. See [`super::run`].

/// Marker wrapper around a run environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSignal<E> {
    env: E,
}

impl<E> RunSignal<E> {
    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn into_env(self) -> E {
        self.env
    }
}

/// The environment passed to a run request, marked or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnv<E> {
    Env(E),
    Signal(RunSignal<E>),
}

impl<E> RunEnv<E> {
    /// The wrapped environment, with or without the marker.
    pub fn env(&self) -> &E {
        match self {
            RunEnv::Env(env) => env,
            RunEnv::Signal(signal) => signal.env(),
        }
    }
}

/// Marks `env` as a run signal. Already marked environments are returned as is.
pub fn run_signal<E>(env: RunEnv<E>) -> RunEnv<E> {
    match env {
        RunEnv::Env(env) => RunEnv::Signal(RunSignal { env }),
        signal @ RunEnv::Signal(_) => signal,
    }
}

pub fn is_run_signal<E>(env: &RunEnv<E>) -> bool {
    matches!(env, RunEnv::Signal(_))
}
