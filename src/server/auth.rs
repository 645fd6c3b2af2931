// ABOUTME: Shared-token authentication layer for the update endpoint.
// ABOUTME: Requests whose Authorization header differs from the token never reach the deployer.

use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer comparing the `Authorization` header against a fixed token.
///
/// Rejected requests are answered with `202 Accepted` and an empty body, the
/// same status a successful update gets, so callers cannot probe for the token.
#[derive(Clone)]
pub struct TokenAuthLayer {
    token: Arc<str>,
}

impl TokenAuthLayer {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl<S> Layer<S> for TokenAuthLayer {
    type Service = TokenAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenAuth {
            inner,
            token: self.token.clone(),
        }
    }
}

/// The service wrapper that performs token authentication.
#[derive(Clone)]
pub struct TokenAuth<S> {
    inner: S,
    token: Arc<str>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TokenAuth<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let authorized = req
            .headers()
            .get(header::AUTHORIZATION)
            .is_some_and(|value| value.as_bytes() == self.token.as_bytes());

        if !authorized {
            let remote = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(remote = %remote, "Unauthorized request from {}", remote);
            return Box::pin(async { Ok(accepted()) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

fn accepted<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::ACCEPTED;
    response
}
