use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    response::Json,
    routing::get,
    Router,
};
use shared::metric::AppMetrics;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info_span, Span};

use super::{middleware::metrics_middleware, server::HttpServer};
use crate::biz::{TokenGenerator, UserRepo};
use crate::service::{FindUsersReq, SaveUserReq, UserService};

/// 请求 ID 生成器
#[derive(Clone, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string();
        Some(RequestId::new(request_id.parse().ok()?))
    }
}

impl HttpServer {
    pub fn create_router(&self) -> Router {
        build_router(
            Arc::clone(&self.user_service),
            self.metrics.clone(),
            Duration::from_secs(self.cfg.request_timeout_secs),
        )
    }
}

/// 组装路由与中间件
pub fn build_router<R, G>(
    user_service: Arc<UserService<R, G>>,
    metrics: Option<Arc<AppMetrics>>,
    request_timeout: Duration,
) -> Router
where
    R: UserRepo + 'static,
    G: TokenGenerator + 'static,
{
    let mut router = Router::new()
        .route("/ping", get(|| async { "ok" }))
        .route("/health", get(health_check))
        .route(
            "/api/users",
            get({
                let service = Arc::clone(&user_service);
                move |query: Result<Query<FindUsersReq>, QueryRejection>| async move {
                    service.find_by_params(query).await
                }
            })
            .post({
                let service = Arc::clone(&user_service);
                move |body: Result<Json<SaveUserReq>, JsonRejection>| async move {
                    service.save(body).await
                }
            }),
        )
        .route(
            "/api/users/{id}",
            get({
                let service = Arc::clone(&user_service);
                move |id: Result<Path<u64>, PathRejection>| async move { service.find(id).await }
            }),
        );

    router = router.layer(TimeoutLayer::new(request_timeout));

    // 超时被丢弃的请求也要计入成功/失败
    if let Some(metrics) = metrics {
        router = router.layer(axum::middleware::from_fn_with_state(
            metrics,
            metrics_middleware,
        ));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");

                    info_span!(
                        "http_request",
                        "http.method" = %request.method(),
                        "http.route" = %request.uri().path(),
                        "request.id" = %request_id,
                        "request.query" = %request.uri().query().unwrap_or(""),
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                        tracing::debug!(
                            "http.response.status_code" = %response.status(),
                            duration_ms = %latency.as_millis(),
                            "HTTP response sent"
                        );
                    },
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

/// 健康检查端点
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "user",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
