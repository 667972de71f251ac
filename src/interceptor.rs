//! Ordered, removable request and response hooks.
//!
//! Interceptors run one after another in registration order, each receiving
//! the output of the previous one. Async closures implement both traits:
//!
//! ```no_run
//! use tesserae_network::{Network, NetworkError, OutgoingRequest};
//!
//! let network = Network::new("https://api.example.com");
//! let handle = network.add_request_interceptor(|mut request: OutgoingRequest| async move {
//!     request.url.push_str("?trace=1");
//!     Ok::<_, NetworkError>(request)
//! });
//! handle.remove();
//! ```

use std::{
    fmt,
    future::Future,
    sync::{Arc, Weak},
};

use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::{NetworkResponse, OutgoingRequest, Result};

/// Transforms a request before it is dispatched.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: OutgoingRequest) -> BoxFuture<'_, Result<OutgoingRequest>>;
}

/// Transforms a response before it is returned to the caller.
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, response: NetworkResponse) -> BoxFuture<'_, Result<NetworkResponse>>;
}

impl<F, Fut> RequestInterceptor for F
where
    F: Fn(OutgoingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OutgoingRequest>> + Send + 'static,
{
    fn intercept(&self, request: OutgoingRequest) -> BoxFuture<'_, Result<OutgoingRequest>> {
        Box::pin(self(request))
    }
}

impl<F, Fut> ResponseInterceptor for F
where
    F: Fn(NetworkResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NetworkResponse>> + Send + 'static,
{
    fn intercept(&self, response: NetworkResponse) -> BoxFuture<'_, Result<NetworkResponse>> {
        Box::pin(self(response))
    }
}

struct Registry<I: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<I>)>,
}

pub(crate) struct InterceptorChain<I: ?Sized> {
    registry: Arc<RwLock<Registry<I>>>,
}

impl<I: ?Sized> Default for InterceptorChain<I> {
    fn default() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<I: ?Sized + Send + Sync + 'static> InterceptorChain<I> {
    pub(crate) fn register(&self, interceptor: Arc<I>) -> InterceptorHandle {
        let id = {
            let mut registry = self.registry.write();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, interceptor));
            id
        };

        let registry: Weak<RwLock<Registry<I>>> = Arc::downgrade(&self.registry);
        InterceptorHandle {
            remove: Arc::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.write().entries.retain(|(entry, _)| *entry != id);
                }
            }),
        }
    }

    /// Interceptors registered right now; later changes do not affect it.
    pub(crate) fn snapshot(&self) -> Vec<Arc<I>> {
        self.registry
            .read()
            .entries
            .iter()
            .map(|(_, interceptor)| Arc::clone(interceptor))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.registry.read().entries.len()
    }
}

impl InterceptorChain<dyn RequestInterceptor> {
    pub(crate) async fn apply(&self, mut request: OutgoingRequest) -> Result<OutgoingRequest> {
        for interceptor in self.snapshot() {
            request = interceptor.intercept(request).await?;
        }
        Ok(request)
    }
}

impl InterceptorChain<dyn ResponseInterceptor> {
    pub(crate) async fn apply(&self, mut response: NetworkResponse) -> Result<NetworkResponse> {
        for interceptor in self.snapshot() {
            response = interceptor.intercept(response).await?;
        }
        Ok(response)
    }
}

/// De-registers the interceptor it was returned for.
///
/// Dropping the handle keeps the interceptor registered.
#[derive(Clone)]
pub struct InterceptorHandle {
    remove: Arc<dyn Fn() + Send + Sync>,
}

impl InterceptorHandle {
    /// Removes the interceptor. Calling this more than once is a no-op.
    pub fn remove(&self) {
        (self.remove)();
    }
}

impl fmt::Debug for InterceptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorHandle").finish_non_exhaustive()
    }
}
