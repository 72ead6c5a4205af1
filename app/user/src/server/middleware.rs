use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use shared::metric::AppMetrics;
use tracing::{error, info, warn};

/// 慢请求阈值（毫秒）
pub const SLOW_REQUEST_THRESHOLD_MS: u64 = 1000;

/// 记录请求指标，并按响应状态输出结构化日志
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    metrics.increment_request();

    let response = next.run(request).await;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        metrics.record_failure(duration_ms);
    } else {
        metrics.record_success(duration_ms);
    }
    if method == Method::POST && status == StatusCode::CREATED {
        metrics.increment_users_created();
    }

    match status.as_u16() {
        200..=299 if duration_ms >= SLOW_REQUEST_THRESHOLD_MS => warn!(
            request.method = %method,
            request.path = %path,
            response.status_code = status.as_u16(),
            response.duration_ms = duration_ms,
            "Slow HTTP request completed"
        ),
        400..=499 => warn!(
            request.method = %method,
            request.path = %path,
            response.status_code = status.as_u16(),
            response.duration_ms = duration_ms,
            "HTTP request failed with client error"
        ),
        500..=599 => error!(
            request.method = %method,
            request.path = %path,
            response.status_code = status.as_u16(),
            response.duration_ms = duration_ms,
            "HTTP request failed with server error"
        ),
        _ => info!(
            request.method = %method,
            request.path = %path,
            response.status_code = status.as_u16(),
            response.duration_ms = duration_ms,
            "HTTP request completed"
        ),
    }

    response
}
