pub mod memory;
pub mod repository;

use shared::config::DatabaseConfig;
use tracing::info;

use crate::biz::{NewUser, User, UserRepo};
use crate::error::UserError;

pub use memory::InMemoryUserRepo;
pub use repository::MySqlUserRepo;

/// 运行时根据配置选择的存储实现
#[derive(Debug)]
pub enum UserRepoImpl {
    MySql(MySqlUserRepo),
    Memory(InMemoryUserRepo),
}

impl UserRepoImpl {
    pub async fn from_config(cfg: &DatabaseConfig) -> Result<Self, UserError> {
        if cfg.is_memory() {
            info!("using in-memory user store");
            return Ok(UserRepoImpl::Memory(InMemoryUserRepo::new()));
        }
        Ok(UserRepoImpl::MySql(MySqlUserRepo::connect(cfg).await?))
    }

    pub async fn close(&self) {
        if let UserRepoImpl::MySql(repo) = self {
            repo.close().await;
        }
    }
}

impl UserRepo for UserRepoImpl {
    async fn save(&self, user: &NewUser) -> Result<u64, UserError> {
        match self {
            UserRepoImpl::MySql(repo) => repo.save(user).await,
            UserRepoImpl::Memory(repo) => repo.save(user).await,
        }
    }

    async fn find(&self, id: u64) -> Result<User, UserError> {
        match self {
            UserRepoImpl::MySql(repo) => repo.find(id).await,
            UserRepoImpl::Memory(repo) => repo.find(id).await,
        }
    }

    async fn find_by_name_and_age(&self, name: &str, age: u32) -> Result<Vec<User>, UserError> {
        match self {
            UserRepoImpl::MySql(repo) => repo.find_by_name_and_age(name, age).await,
            UserRepoImpl::Memory(repo) => repo.find_by_name_and_age(name, age).await,
        }
    }
}
