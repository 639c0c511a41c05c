//! Function memoization over the two-tier cache
//!
//! A memoized function is keyed by a fingerprint of its volume, its
//! [`Computation`] identity, and its serialized arguments. Identity is
//! supplied by the caller as a name plus a version tag; bump the tag
//! whenever the function's behavior changes so stale results are not reused.
//!
//! Misses are signalled by `None` rather than an in-band value, so any
//! serializable result (including `null`, `()` and `None`) can be cached.

pub mod fingerprint;

pub use fingerprint::fingerprint;

use crate::cache::{CacheOptions, Memo, MemoCache};
use crate::error::{BoxError, MemoError, MemoResult};
use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

/// Context name used when a memoized function is given none
pub const DEFAULT_CONTEXT: &str = "global";

/// Function name used for anonymous computations
pub const LAMBDA: &str = "lambda";

/// Something that names the context a function is memoized in
///
/// Implemented for strings; implement it for your own types to group their
/// memoized functions under one name.
pub trait MemoContext {
    fn context_name(&self) -> &str;
}

impl MemoContext for str {
    fn context_name(&self) -> &str {
        self
    }
}

impl MemoContext for &str {
    fn context_name(&self) -> &str {
        self
    }
}

impl MemoContext for String {
    fn context_name(&self) -> &str {
        self
    }
}

/// Stable identity of a memoized computation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Computation {
    name: Option<String>,
    tag: String,
}

impl Computation {
    /// A named computation at version `tag`
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            tag: tag.into(),
        }
    }

    /// An anonymous computation, distinguished only by `tag`
    pub fn lambda(tag: impl Into<String>) -> Self {
        Self {
            name: None,
            tag: tag.into(),
        }
    }

    /// Function name used in the volume
    pub fn name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(LAMBDA)
    }

    /// Version tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text that stands in for the function body in fingerprints
    pub fn identity(&self) -> String {
        format!("{}#{}", self.name(), self.tag)
    }
}

/// Options for building a [`Memoizer`]
#[derive(Clone)]
pub struct MemoizerOptions {
    /// Context name used when none is given
    pub context: String,

    /// Cache to use; when unset one is built from `cache_options`
    pub cache: Option<MemoCache>,

    /// Options for the cache built when `cache` is unset
    pub cache_options: CacheOptions,
}

impl Default for MemoizerOptions {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            cache: None,
            cache_options: CacheOptions::default(),
        }
    }
}

/// Wraps functions so repeated calls with equal arguments reuse results
pub struct Memoizer {
    context: String,
    cache: MemoCache,
}

impl Memoizer {
    /// Build a memoizer, opening a cache if none is supplied
    pub fn new(options: MemoizerOptions) -> MemoResult<Self> {
        let cache = match options.cache {
            Some(cache) => cache,
            None => MemoCache::new(options.cache_options)?,
        };
        Ok(Self {
            context: options.context,
            cache,
        })
    }

    /// Underlying cache
    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    /// Default context name
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Volume holding every result of `computation` in `context`
    pub fn volume_of(&self, computation: &Computation, context: Option<&dyn MemoContext>) -> String {
        let context_name = context
            .map(|c| c.context_name())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.context);
        format!("{}.{}", context_name, computation.name())
    }

    /// Memoize a synchronous function
    ///
    /// Multiple arguments are passed as a tuple.
    pub fn memoize<A, R, F>(
        &self,
        computation: Computation,
        context: Option<&dyn MemoContext>,
        f: F,
    ) -> MemoFn<A, R>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let volume = self.volume_of(&computation, context);
        debug!("Memoizing {} in volume {}", computation.identity(), volume);
        MemoFn {
            cache: self.cache.clone(),
            volume,
            identity: computation.identity(),
            body: Arc::new(f),
        }
    }

    /// Memoize an asynchronous function
    ///
    /// Concurrent calls with equal arguments share one computation. A failed
    /// computation is not cached.
    pub fn memoize_async<A, R, E, F, Fut>(
        &self,
        computation: Computation,
        context: Option<&dyn MemoContext>,
        f: F,
    ) -> AsyncMemoFn<A, R>
    where
        A: 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let volume = self.volume_of(&computation, context);
        debug!("Memoizing async {} in volume {}", computation.identity(), volume);

        let body = move |args: A| -> BoxFuture<'static, MemoResult<Value>> {
            let pending = f(args);
            async move {
                let result = pending
                    .await
                    .map_err(|e| MemoError::Computation(e.into()))?;
                Ok(serde_json::to_value(&result)?)
            }
            .boxed()
        };

        AsyncMemoFn {
            cache: self.cache.clone(),
            volume,
            identity: computation.identity(),
            body: Arc::new(body),
            _result: PhantomData,
        }
    }

    /// Forget every cached result of `computation` in `context`
    pub async fn clear_memo(
        &self,
        computation: &Computation,
        context: Option<&dyn MemoContext>,
    ) -> MemoResult<usize> {
        let volume = self.volume_of(computation, context);
        self.cache.clear_volume(Some(&volume)).await.map_err(|e| {
            error!("clear_memo({}) failed: {}", volume, e);
            e
        })
    }
}

/// A memoized synchronous function
pub struct MemoFn<A, R> {
    cache: MemoCache,
    volume: String,
    identity: String,
    body: Arc<dyn Fn(A) -> R + Send + Sync>,
}

impl<A, R> Clone for MemoFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            volume: self.volume.clone(),
            identity: self.identity.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<A, R> MemoFn<A, R>
where
    A: Serialize,
    R: Serialize + DeserializeOwned,
{
    /// Volume this function's results are stored in
    pub fn volume(&self) -> &str {
        &self.volume
    }

    /// Call the function, reusing a cached result when one exists
    ///
    /// A hit on a value another task is still computing cannot be waited
    /// for here, so the function runs again.
    pub fn call(&self, args: A) -> MemoResult<R> {
        let args_value = serde_json::to_value(&args)?;
        let guid = fingerprint(&self.volume, &self.identity, &args_value);

        if let Some(memo) = self.cache.get(&guid, Some(&self.volume))? {
            match memo.try_resolve() {
                Some(value) => return Ok(serde_json::from_value(value?)?),
                None => debug!("{}/{} still computing, calling directly", self.volume, guid),
            }
        }

        let result = (self.body)(args);
        let value = serde_json::to_value(&result)?;
        self.cache
            .put(&guid, Some(&self.volume), Memo::Ready(value), args_value)?;
        Ok(result)
    }
}

type AsyncBody<A> = Arc<dyn Fn(A) -> BoxFuture<'static, MemoResult<Value>> + Send + Sync>;

/// A memoized asynchronous function
pub struct AsyncMemoFn<A, R> {
    cache: MemoCache,
    volume: String,
    identity: String,
    body: AsyncBody<A>,
    _result: PhantomData<fn() -> R>,
}

impl<A, R> Clone for AsyncMemoFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            volume: self.volume.clone(),
            identity: self.identity.clone(),
            body: Arc::clone(&self.body),
            _result: PhantomData,
        }
    }
}

impl<A, R> AsyncMemoFn<A, R>
where
    A: Serialize,
    R: DeserializeOwned,
{
    /// Volume this function's results are stored in
    pub fn volume(&self) -> &str {
        &self.volume
    }

    /// Call the function, reusing a cached or in-flight result
    ///
    /// On a miss the returned future completes only after the result has
    /// been written to the cache file (when file writing is enabled).
    pub async fn call(&self, args: A) -> MemoResult<R> {
        let args_value = serde_json::to_value(&args)?;
        let guid = fingerprint(&self.volume, &self.identity, &args_value);

        let memo = match self.cache.get(&guid, Some(&self.volume))? {
            Some(memo) => memo,
            None => {
                let pending = Memo::deferred((self.body)(args));
                self.cache
                    .put(&guid, Some(&self.volume), pending, args_value)?
            }
        };

        let value = memo.resolve().await?;
        Ok(serde_json::from_value(value)?)
    }
}
