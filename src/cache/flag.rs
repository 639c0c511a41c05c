//! Capability switches evaluated on every use

use std::fmt;
use std::sync::Arc;

/// A boolean capability, either constant or computed on each check
///
/// Dynamic flags let callers toggle cache behavior without rebuilding
/// the cache.
#[derive(Clone)]
pub struct Flag(Arc<dyn Fn() -> bool + Send + Sync>);

impl Flag {
    /// Flag that always reports `value`
    pub fn constant(value: bool) -> Self {
        Self(Arc::new(move || value))
    }

    /// Flag backed by a predicate
    pub fn dynamic<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluate the flag now
    pub fn is_set(&self) -> bool {
        (self.0)()
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Self::constant(value)
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::constant(true)
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flag({})", self.is_set())
    }
}
