//! Request-handling endpoint.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// An async request handler.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Input type.
    type Request: Send;
    /// Output type.
    type Response: Send;
    /// Failure type.
    type Error: Send;

    /// Handle one request.
    async fn call(&self, request: Self::Request) -> Result<Self::Response, Self::Error>;
}

/// Adapts an async closure into an [`Endpoint`].
pub struct EndpointFn<F, Req> {
    f: F,
    _request: PhantomData<fn(Req)>,
}

/// Wrap an async closure as an endpoint.
///
/// ```rust,ignore
/// let create = endpoint_fn(|req: CreateInvoice| async move {
///     Ok::<_, ServiceError>(Invoice { id: 1, total: req.total })
/// });
/// ```
pub fn endpoint_fn<F, Req, Fut, Resp, E>(f: F) -> EndpointFn<F, Req>
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
{
    EndpointFn {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<F, Req, Fut, Resp, E> Endpoint for EndpointFn<F, Req>
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
    E: Send + 'static,
{
    type Request = Req;
    type Response = Resp;
    type Error = E;

    async fn call(&self, request: Req) -> Result<Resp, E> {
        (self.f)(request).await
    }
}
