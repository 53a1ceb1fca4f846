use super::container::Container;
use super::definition::Bean;
use super::handle::{Shared, read_lock};
use crate::error::WireError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Axum extractor resolving the unique bean of type `T` from the container.
///
/// Failures reject with the [`WireError`] itself: a missing bean answers
/// `503 Service Unavailable`, anything else `500`.
///
/// ```ignore
/// async fn ping(Inject(config): Inject<RedisConfig>) -> String {
///     config.read().unwrap().host.clone()
/// }
/// ```
pub struct Inject<T>(pub Shared<T>);

impl<T> Inject<T> {
    /// Run `f` against the bean under its read lock.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&read_lock(&self.0))
    }
}

/// Implemented by router state that can hand out the container.
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl HasContainer for Container {
    fn get_container(&self) -> &Container {
        self
    }
}

impl<S: HasContainer> HasContainer for Arc<S> {
    fn get_container(&self) -> &Container {
        (**self).get_container()
    }
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: Bean,
{
    type Rejection = WireError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let container = state.get_container();

        container.bean::<T>().map(Inject).inspect_err(|e| {
            tracing::warn!("Dependency injection failed: {}", e);
        })
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
