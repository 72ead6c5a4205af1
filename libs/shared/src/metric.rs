use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::MetricsConfig;
use crate::SharedError;

/// 应用程序指标
#[derive(Debug, Clone)]
pub struct AppMetrics {
    /// 服务启动时间
    pub start_time: Instant,
    /// 总请求数
    pub total_requests: Arc<AtomicU64>,
    /// 成功请求数
    pub successful_requests: Arc<AtomicU64>,
    /// 失败请求数
    pub failed_requests: Arc<AtomicU64>,
    /// 创建的用户总数
    pub users_created: Arc<AtomicU64>,
    /// 平均响应时间（毫秒）
    pub avg_response_time_ms: Arc<AtomicU64>,
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: Arc::new(AtomicU64::new(0)),
            successful_requests: Arc::new(AtomicU64::new(0)),
            failed_requests: Arc::new(AtomicU64::new(0)),
            users_created: Arc::new(AtomicU64::new(0)),
            avg_response_time_ms: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl AppMetrics {
    pub fn increment_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, response_time_ms: u64) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.update_avg_response_time(response_time_ms);
    }

    pub fn record_failure(&self, response_time_ms: u64) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        self.update_avg_response_time(response_time_ms);
    }

    pub fn increment_users_created(&self) {
        self.users_created.fetch_add(1, Ordering::Relaxed);
    }

    /// 简单的移动平均
    fn update_avg_response_time(&self, response_time_ms: u64) {
        let current_avg = self.avg_response_time_ms.load(Ordering::Relaxed);
        let total_requests = self.total_requests.load(Ordering::Relaxed);

        if total_requests > 0 {
            let new_avg = (current_avg * (total_requests - 1) + response_time_ms) / total_requests;
            self.avg_response_time_ms.store(new_avg, Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prometheus 文本格式
    pub fn render_prometheus(&self) -> String {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful_requests = self.successful_requests.load(Ordering::Relaxed);
        let failed_requests = self.failed_requests.load(Ordering::Relaxed);
        let users_created = self.users_created.load(Ordering::Relaxed);
        let avg_response_time = self.avg_response_time_ms.load(Ordering::Relaxed);
        let success_rate = if total_requests > 0 {
            successful_requests as f64 / total_requests as f64
        } else {
            0.0
        };

        format!(
            r#"# HELP user_requests_total Total number of HTTP requests
# TYPE user_requests_total counter
user_requests_total {}

# HELP user_requests_successful_total Total number of successful HTTP requests
# TYPE user_requests_successful_total counter
user_requests_successful_total {}

# HELP user_requests_failed_total Total number of failed HTTP requests
# TYPE user_requests_failed_total counter
user_requests_failed_total {}

# HELP user_users_created_total Total number of users created
# TYPE user_users_created_total counter
user_users_created_total {}

# HELP user_response_time_avg_ms Average response time in milliseconds
# TYPE user_response_time_avg_ms gauge
user_response_time_avg_ms {}

# HELP user_uptime_seconds Service uptime in seconds
# TYPE user_uptime_seconds gauge
user_uptime_seconds {}

# HELP user_success_rate Request success rate
# TYPE user_success_rate gauge
user_success_rate {}
"#,
            total_requests,
            successful_requests,
            failed_requests,
            users_created,
            avg_response_time,
            self.uptime_seconds(),
            success_rate,
        )
    }
}

/// Metrics 服务器
pub struct MetricsServer {
    config: MetricsConfig,
    metrics: Arc<AppMetrics>,
}

impl MetricsServer {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(AppMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<AppMetrics> {
        Arc::clone(&self.metrics)
    }

    /// 带优雅关闭的启动方式
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), SharedError> {
        let addr = format!("{}:{}", self.config.addr, self.config.port);
        let listener = TcpListener::bind(&addr).await?;

        info!("Metrics server listening on {}", addr);

        axum::serve(listener, self.create_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| SharedError::ServerError(e.to_string()))
    }

    pub fn create_router(&self) -> Router {
        Router::new()
            .route(&self.config.metrics_path, get(metrics_handler))
            .route(&self.config.health_path, get(health_handler))
            .with_state(Arc::clone(&self.metrics))
    }
}

async fn metrics_handler(State(metrics): State<Arc<AppMetrics>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render_prometheus(),
    )
}

async fn health_handler(State(metrics): State<Arc<AppMetrics>>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "healthy",
        "uptime_seconds": metrics.uptime_seconds(),
        "total_requests": metrics.total_requests.load(Ordering::Relaxed),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "user-metrics",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 初始化 metrics 系统
pub fn init_metrics(config: MetricsConfig) -> (MetricsServer, Arc<AppMetrics>) {
    info!("Initializing metrics system with config: {:?}", config);

    let server = MetricsServer::new(config);
    let metrics = server.metrics();
    (server, metrics)
}
