//! Continuation node pool.
//!
//! Continuation nodes are short lived: a consumer builds a tree of them, the
//! trampoline drains it and hands every node back. Instead of allocating a
//! fresh node per step, the pool keeps an arena of nodes and a free list
//! addressed by a single "next free" index, much like a stack pointer.
//!
//! Layout:
//! - `nodes` is the arena. A [`ContId`] indexes into it.
//! - `slots[next_free..]` hold the ids of free nodes.
//! - `slots[..next_free]` are holes left behind by allocation.
//!
//! Allocation takes the id just above the pointer and advances it; recycling
//! clears the node and pushes its id back just below the pointer. The pool is
//! grown in batches when the free region runs out, and only shrinks on
//! [`ContinuationPool::reset`].
//!
//! The pool is not reentrant. It is meant to be owned by a single thread of
//! control and passed by `&mut` into the trampoline and into the thunks it runs.

pub mod sanitizer;

use crate::interpreter::Step;
use anyhow::Result;
use sanitizer::LiveSlots;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// A deferred step: runs once, and may build further continuations.
pub type Thunk<T> = Box<dyn FnOnce(&mut ContinuationPool<T>) -> Result<Step<T>>>;

/// A follow-up action taking the resolved left-hand value.
pub type Then<T> = Box<dyn FnOnce(&mut ContinuationPool<T>, T) -> Result<Step<T>>>;

/// Handle to a continuation node living in a [`ContinuationPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContId(usize);

impl ContId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ContId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Left-hand slot of a continuation node.
pub enum Left<T> {
    /// Not yet evaluated.
    Thunk(Thunk<T>),
    /// Already resolved, either to a plain value or to a nested continuation.
    Ready(Step<T>),
}

impl<T> Left<T> {
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(&mut ContinuationPool<T>) -> Result<Step<T>> + 'static,
    {
        Left::Thunk(Box::new(f))
    }

    pub fn value(value: T) -> Self {
        Left::Ready(Step::Value(value))
    }
}

impl<T> From<Step<T>> for Left<T> {
    fn from(step: Step<T>) -> Self {
        Left::Ready(step)
    }
}

impl<T: fmt::Debug> fmt::Debug for Left<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Left::Thunk(_) => f.write_str("Thunk(..)"),
            Left::Ready(step) => f.debug_tuple("Ready").field(step).finish(),
        }
    }
}

/// A two-slot continuation node.
struct Node<T> {
    left: Option<Left<T>>,
    right: Option<Then<T>>,
}

impl<T> Node<T> {
    const fn empty() -> Self {
        Self {
            left: None,
            right: None,
        }
    }

    fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }
}

/// Sizing knobs for a [`ContinuationPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Nodes created up front by [`ContinuationPool::with_config`].
    pub initial_capacity: usize,
    /// Batch size used when an empty pool has to grow.
    /// Non-empty pools double instead.
    pub first_growth: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 100,
            first_growth: 100,
        }
    }
}

/// Snapshot of the pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    /// Nodes handed out. This is the free pointer.
    pub in_use: usize,
}

impl PoolStats {
    pub fn free(&self) -> usize {
        self.capacity - self.in_use
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capacity {}, in use {}, free {}",
            self.capacity,
            self.in_use,
            self.free()
        )
    }
}

/// Errors raised by the pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContinuationError {
    /// The node was recycled already, or the pool was reset since it was handed out.
    #[error("Continuation {0} is not live")]
    NotLive(ContId),
    /// The node was evaluated while its left-hand slot was still unset.
    #[error("Continuation {0} has no left-hand step")]
    MissingLeft(ContId),
    /// The node was unwound before its left-hand slot resolved to a value.
    #[error("Continuation {0} was unwound before resolving")]
    Unresolved(ContId),
}

/// Arena of reusable continuation nodes plus its free list.
pub struct ContinuationPool<T> {
    config: PoolConfig,
    nodes: Vec<Node<T>>,
    /// Free list. `None` marks a hole at an in-use position.
    slots: Vec<Option<ContId>>,
    next_free: usize,
    sanitizer: LiveSlots,
}

impl<T> Default for ContinuationPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ContinuationPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationPool")
            .field("config", &self.config)
            .field("capacity", &self.capacity())
            .field("next_free", &self.next_free)
            .finish()
    }
}

impl<T> ContinuationPool<T> {
    /// Creates a pool pre-grown with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let mut pool = Self {
            config,
            nodes: Vec::new(),
            slots: Vec::new(),
            next_free: 0,
            sanitizer: LiveSlots::default(),
        };
        if config.initial_capacity > 0 {
            pool.grow(config.initial_capacity);
        }
        pool
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes currently handed out (the free pointer).
    pub fn in_use(&self) -> usize {
        self.next_free
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
        }
    }

    pub fn is_live(&self, id: ContId) -> bool {
        self.sanitizer.contains(id.0)
    }

    /// Hands out an empty node, growing the pool first if the free region is
    /// exhausted. An empty pool grows by `first_growth`, otherwise it doubles.
    pub fn allocate(&mut self) -> ContId {
        if self.next_free == self.slots.len() {
            let by = match self.slots.len() {
                0 => self.config.first_growth,
                len => len,
            };
            self.grow(by);
        }

        let id = self.slots[self.next_free]
            .take()
            .expect("Free region should only hold node ids");
        self.sanitizer.register(id.0);
        self.next_free += 1;
        id
    }

    /// Clears a node and returns it to the free region.
    ///
    /// # Returns
    /// * `Ok(())` - The node is free again
    /// * `Err(ContinuationError::NotLive)` - The node was not handed out
    pub fn recycle(&mut self, id: ContId) -> Result<(), ContinuationError> {
        if !self.sanitizer.deregister(id.0) {
            return Err(ContinuationError::NotLive(id));
        }
        self.nodes[id.0].clear();
        self.next_free -= 1;
        self.slots[self.next_free] = Some(id);
        debug_assert_eq!(self.sanitizer.count(), self.next_free);
        Ok(())
    }

    /// Appends at least one, and otherwise exactly `by`, fresh empty nodes.
    pub fn grow(&mut self, by: usize) {
        let by = by.max(1);
        let start = self.nodes.len();
        debug!(capacity = start, by, "growing continuation pool");

        self.nodes.reserve(by);
        self.slots.reserve(by);
        for index in start..start + by {
            self.nodes.push(Node::empty());
            self.slots.push(Some(ContId(index)));
        }
        self.sanitizer.grow(by);
    }

    /// Discards every node and resets capacity and free pointer to zero.
    ///
    /// Must not be called while an evaluation is in flight: ids held by an
    /// active trampoline become stale. Stale ids are reported as
    /// [`ContinuationError::NotLive`] until the pool grows past them again,
    /// after which they alias fresh nodes.
    pub fn reset(&mut self) {
        debug!(
            capacity = self.capacity(),
            in_use = self.next_free,
            "resetting continuation pool"
        );
        self.nodes.clear();
        self.slots.clear();
        self.next_free = 0;
        self.sanitizer.clear();
    }

    /// Allocates a placeholder node with both slots unset.
    pub fn make_continuation(&mut self) -> ContId {
        self.allocate()
    }

    /// Allocates a pass-through node: its resolved left-hand value is the result.
    pub fn continuation(&mut self, left: impl Into<Left<T>>) -> ContId {
        let id = self.allocate();
        self.nodes[id.0].left = Some(left.into());
        id
    }

    /// Allocates a node that feeds its resolved left-hand value into `right`.
    pub fn continuation_then<F>(&mut self, left: impl Into<Left<T>>, right: F) -> ContId
    where
        F: FnOnce(&mut ContinuationPool<T>, T) -> Result<Step<T>> + 'static,
    {
        let id = self.allocate();
        let node = &mut self.nodes[id.0];
        node.left = Some(left.into());
        node.right = Some(Box::new(right));
        id
    }

    pub fn set_left(&mut self, id: ContId, left: impl Into<Left<T>>) -> Result<(), ContinuationError> {
        self.node_mut(id)?.left = Some(left.into());
        Ok(())
    }

    pub fn set_right<F>(&mut self, id: ContId, right: F) -> Result<(), ContinuationError>
    where
        F: FnOnce(&mut ContinuationPool<T>, T) -> Result<Step<T>> + 'static,
    {
        self.node_mut(id)?.right = Some(Box::new(right));
        Ok(())
    }

    /// Wraps a thunk into a pending step.
    pub fn defer<F>(&mut self, thunk: F) -> Step<T>
    where
        F: FnOnce(&mut ContinuationPool<T>) -> Result<Step<T>> + 'static,
    {
        Step::Continuation(self.continuation(Left::thunk(thunk)))
    }

    /// Sequences `f` after `step`.
    pub fn then<F>(&mut self, step: Step<T>, f: F) -> Step<T>
    where
        F: FnOnce(&mut ContinuationPool<T>, T) -> Result<Step<T>> + 'static,
    {
        Step::Continuation(self.continuation_then(step, f))
    }

    pub(crate) fn take_left(&mut self, id: ContId) -> Result<Option<Left<T>>, ContinuationError> {
        Ok(self.node_mut(id)?.left.take())
    }

    pub(crate) fn take_right(&mut self, id: ContId) -> Result<Option<Then<T>>, ContinuationError> {
        Ok(self.node_mut(id)?.right.take())
    }

    fn node_mut(&mut self, id: ContId) -> Result<&mut Node<T>, ContinuationError> {
        if self.sanitizer.contains(id.0) {
            Ok(&mut self.nodes[id.0])
        } else {
            Err(ContinuationError::NotLive(id))
        }
    }
}
