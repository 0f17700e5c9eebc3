//! Handlers with a stable identity
//!
//! A `StableCallback` is created once per container and kept in keyed
//! state. Each build swaps in a fresh body with [`StableCallback::replace`],
//! so the handler picks up the latest captured values while the host keeps
//! seeing the same handler and never has to rebind it.

use std::fmt;
use std::sync::{Arc, Mutex};

type Body<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// A handler whose identity survives rebuilds
pub struct StableCallback<A: ?Sized> {
    body: Arc<Mutex<Body<A>>>,
}

impl<A: ?Sized> Clone for StableCallback<A> {
    fn clone(&self) -> Self {
        Self {
            body: Arc::clone(&self.body),
        }
    }
}

impl<A: ?Sized> fmt::Debug for StableCallback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StableCallback")
            .field("id", &Arc::as_ptr(&self.body))
            .finish()
    }
}

impl<A: ?Sized + 'static> Default for StableCallback<A> {
    fn default() -> Self {
        Self::new(|_| {})
    }
}

impl<A: ?Sized + 'static> StableCallback<A> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(Mutex::new(Arc::new(f))),
        }
    }

    /// Swap in a new body, keeping the handler identity
    pub fn replace<F>(&self, f: F)
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        *self.body.lock().unwrap() = Arc::new(f);
    }

    /// Invoke the current body
    ///
    /// The body runs without the internal lock held, so it may call
    /// `replace` on this callback.
    pub fn call(&self, arg: &A) {
        let body = Arc::clone(&*self.body.lock().unwrap());
        body(arg);
    }

    /// Check whether two callbacks are the same handler
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}
