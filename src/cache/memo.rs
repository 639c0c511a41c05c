//! In-memory cache values

use crate::error::{MemoError, MemoResult};
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A value that may still be computing, shareable between any number of waiters
pub type DeferredValue = Shared<BoxFuture<'static, Result<Value, Arc<MemoError>>>>;

/// A cached value as held in memory
///
/// `Deferred` values are lazy: whoever awaits them first drives the
/// underlying computation, and every clone observes the same outcome.
#[derive(Clone)]
pub enum Memo {
    /// A value that is already available
    Ready(Value),

    /// A value produced by an asynchronous computation
    Deferred(DeferredValue),
}

impl Memo {
    /// Wrap an asynchronous computation
    pub fn deferred<F>(computation: F) -> Self
    where
        F: Future<Output = MemoResult<Value>> + Send + 'static,
    {
        Self::Deferred(computation.map(|result| result.map_err(Arc::new)).boxed().shared())
    }

    /// A deferred value that has already settled with `value`
    pub fn resolved(value: Value) -> Self {
        let settled = future::ready(Ok::<_, Arc<MemoError>>(value));
        Self::Deferred(settled.boxed().shared())
    }

    /// Whether this value came from an asynchronous computation
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// The value, if it is available without waiting
    pub fn as_ready(&self) -> Option<&Value> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    /// Wait for the value
    pub async fn resolve(self) -> MemoResult<Value> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Deferred(pending) => pending.await.map_err(MemoError::Shared),
        }
    }

    /// The value if it can be produced without suspending
    ///
    /// Returns `None` for a deferred value that is still computing.
    pub fn try_resolve(&self) -> Option<MemoResult<Value>> {
        match self {
            Self::Ready(value) => Some(Ok(value.clone())),
            Self::Deferred(pending) => pending
                .clone()
                .now_or_never()
                .map(|result| result.map_err(MemoError::Shared)),
        }
    }

    /// Whether both values are the same deferred computation
    pub(crate) fn shares_computation(&self, other: &DeferredValue) -> bool {
        match self {
            Self::Deferred(pending) => pending.ptr_eq(other),
            Self::Ready(_) => false,
        }
    }
}

impl From<Value> for Memo {
    fn from(value: Value) -> Self {
        Self::Ready(value)
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(pending) => match pending.peek() {
                Some(result) => f.debug_tuple("Deferred").field(result).finish(),
                None => f.write_str("Deferred(<pending>)"),
            },
        }
    }
}
