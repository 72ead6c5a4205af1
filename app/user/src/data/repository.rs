use std::time::Duration;

use shared::config::DatabaseConfig;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{error, info, instrument};

use crate::biz::{NewUser, User, UserRepo};
use crate::error::UserError;

const SELECT_COLUMNS: &str =
    "SELECT CAST(id AS SIGNED) AS id, name, CAST(age AS SIGNED) AS age, activation_token FROM users";

/// 表中一行的原始形态，整数宽度以存储为准
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    age: i64,
    activation_token: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| UserError::DataInconsistency(format!("negative user id {}", row.id)))?;
        let age = u32::try_from(row.age).map_err(|_| {
            UserError::DataInconsistency(format!("age {} out of range for user {}", row.age, id))
        })?;

        Ok(User {
            id,
            name: row.name,
            age,
            activation_token: row.activation_token,
        })
    }
}

/// 基于 MySQL 的用户存储
#[derive(Debug, Clone)]
pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, UserError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .connect(&cfg.url)
            .await?;
        info!(max_connections = cfg.max_connections, "mysql pool ready");
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl UserRepo for MySqlUserRepo {
    #[instrument(skip(self, user), fields(user.name = %user.name))]
    async fn save(&self, user: &NewUser) -> Result<u64, UserError> {
        let result =
            sqlx::query("INSERT INTO users (name, age, activation_token) VALUES (?, ?, ?)")
                .bind(user.name.as_str())
                .bind(user.age)
                .bind(user.activation_token.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!(error = %e, "insert user failed");
                    UserError::SaveFailed(e.to_string())
                })?;

        match result.last_insert_id() {
            0 => {
                error!("insert succeeded but no generated id was reported");
                Err(UserError::LastInsertIdUnavailable)
            }
            id => Ok(id),
        }
    }

    #[instrument(skip(self))]
    async fn find(&self, id: u64) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(UserError::NotFound(id))?.try_into()
    }

    #[instrument(skip(self))]
    async fn find_by_name_and_age(&self, name: &str, age: u32) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE name = ? AND age = ?",
            SELECT_COLUMNS
        ))
        .bind(name)
        .bind(age)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}
