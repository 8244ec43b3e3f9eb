// ABOUTME: Bearer token middleware guarding the lxnotes /api routes.
// ABOUTME: Requests outside /api (health checks) pass through untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use tower::{Layer, Service};

/// Layer that requires `Authorization: Bearer <token>` on API routes.
#[derive(Clone)]
pub struct BearerAuthLayer {
    expected: Arc<str>,
}

impl BearerAuthLayer {
    pub fn new(token: &str) -> Self {
        Self {
            expected: Arc::from(format!("Bearer {}", token)),
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            expected: Arc::clone(&self.expected),
        }
    }
}

#[derive(Clone)]
pub struct BearerAuth<S> {
    inner: S,
    expected: Arc<str>,
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

impl<S> Service<Request<Body>> for BearerAuth<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authorized = !is_api_path(req.uri().path())
            || req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == &*self.expected);

        if !authorized {
            tracing::debug!(path = %req.uri().path(), "rejecting unauthenticated request");
            return Box::pin(async {
                Ok((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "unauthorized" })),
                )
                    .into_response())
            });
        }

        // Take the instance that was polled ready and leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/api/sessions", get(|| async { "sessions" }))
            .route("/health", get(|| async { "ok" }))
            .layer(BearerAuthLayer::new("stage-left"))
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let resp = test_router()
            .oneshot(Request::get("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_wrong_token() {
        let resp = test_router()
            .oneshot(
                Request::get("/api/sessions")
                    .header("authorization", "Bearer stage-right")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_matching_token() {
        let resp = test_router()
            .oneshot(
                Request::get("/api/sessions")
                    .header("authorization", "Bearer stage-left")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_exempt() {
        let resp = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
