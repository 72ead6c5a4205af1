/*
 * @Description
 * HTTP server: 持有配置、服务实例与可选的指标，负责监听与优雅关闭
*/
use std::sync::Arc;

use shared::{config::ServerConfig, metric::AppMetrics, SharedError};
use tracing::info;

use crate::biz::UserUseCase;
use crate::data::UserRepoImpl;
use crate::service::{UserService, UserServiceImpl};

pub struct HttpServer {
    pub cfg: Arc<ServerConfig>,
    pub user_service: Arc<UserServiceImpl>,
    pub metrics: Option<Arc<AppMetrics>>,
}

impl HttpServer {
    pub fn new(cfg: Arc<ServerConfig>, uc: Arc<UserUseCase<UserRepoImpl>>) -> Self {
        Self {
            cfg,
            user_service: Arc::new(UserService::new(uc)),
            metrics: None,
        }
    }

    pub fn new_with_metrics(
        cfg: Arc<ServerConfig>,
        uc: Arc<UserUseCase<UserRepoImpl>>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(cfg, uc)
        }
    }

    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), SharedError> {
        let listener =
            tokio::net::TcpListener::bind(format!("{}:{}", self.cfg.addr, self.cfg.port)).await?;
        info!("Server is running on {}", listener.local_addr()?);

        let app = self.create_router();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| SharedError::ServerError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryUserRepo;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_with_shutdown() {
        let repo = Arc::new(UserRepoImpl::Memory(InMemoryUserRepo::new()));
        let uc = Arc::new(UserUseCase::new(repo));
        let server = HttpServer::new_with_metrics(
            Arc::new(ServerConfig::default_for_test()),
            uc,
            Arc::new(AppMetrics::default()),
        );

        let result = server
            .run_with_shutdown(tokio::time::sleep(Duration::from_millis(50)))
            .await;
        assert!(result.is_ok());
    }
}
