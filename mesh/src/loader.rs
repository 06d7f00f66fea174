//! The loader seam between the cache and its authoritative source.

use std::future::Future;

use async_trait::async_trait;

/// Boxed error type carried across the loader and peer seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Authoritative source for cache values, consulted on a miss at the
/// owning node.
///
/// The returned buffer is moved into the cache, which freezes it; the
/// loader cannot retain a handle that would let it mutate a stored value.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> Result<Vec<u8>, BoxError>;
}

/// Adapter turning an async closure into a [`Loader`].
///
/// ```no_run
/// use meshcache::{BoxError, LoaderFn};
///
/// let loader = LoaderFn::new(|key: String| async move {
///     Ok::<_, BoxError>(key.into_bytes())
/// });
/// ```
pub struct LoaderFn<F>(F);

impl<F> LoaderFn<F> {
    pub fn new(load: F) -> Self {
        Self(load)
    }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, BoxError>> + Send,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        (self.0)(key.to_string()).await
    }
}
