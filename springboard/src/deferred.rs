//! Deferred values.
//!
//! Bridges callback-style completion into the value domain: a [`Resolver`]
//! can be handed to whatever completes the work, while the matching
//! [`Pending`] is awaited or polled by the consumer. The two ends are a
//! one-shot channel; resolvers share its sender so that any clone may
//! complete it, once.

use futures_channel::oneshot::{self, Canceled};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Read side of a deferred value. Resolves to the first value handed to its
/// [`Resolver`], or to [`Canceled`] if every resolver is dropped first.
#[derive(Debug)]
pub struct Pending<T>(oneshot::Receiver<T>);

/// Write side of a deferred value. Clones resolve the same [`Pending`].
#[derive(Debug)]
pub struct Resolver<T>(Rc<RefCell<Option<oneshot::Sender<T>>>>);

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

/// A pending value and its resolver.
#[derive(Debug)]
pub struct Deferred<T> {
    pub pending: Pending<T>,
    pub resolver: Resolver<T>,
}

impl<T> Deferred<T> {
    pub fn into_parts(self) -> (Pending<T>, Resolver<T>) {
        (self.pending, self.resolver)
    }
}

pub fn get_deferred<T>() -> Deferred<T> {
    let (sender, receiver) = oneshot::channel();
    Deferred {
        pending: Pending(receiver),
        resolver: Resolver(Rc::new(RefCell::new(Some(sender)))),
    }
}

impl<T> Resolver<T> {
    /// Completes the pending value. Only the first call has an effect.
    ///
    /// # Returns
    /// * `true` - This call delivered the value
    /// * `false` - The value was already resolved, or the [`Pending`] side
    ///   is gone; `value` is dropped
    pub fn resolve(&self, value: T) -> bool {
        // Release the borrow before sending: waking may run arbitrary code.
        let sender = self.0.borrow_mut().take();
        match sender {
            Some(sender) => sender.send(value).is_ok(),
            None => false,
        }
    }

    /// Whether `resolve` was already called through some clone.
    pub fn is_resolved(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl<T> Pending<T> {
    /// Takes the value if it has arrived.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - The value was resolved and is now taken
    /// * `Ok(None)` - Not resolved yet
    /// * `Err(Canceled)` - Every resolver was dropped, or the value was taken already
    pub fn try_take(&mut self) -> Result<Option<T>, Canceled> {
        self.0.try_recv()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Canceled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}
