use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::biz::{RandomTokenGenerator, TokenGenerator, User, UserRepo, UserUseCase};
use crate::data::UserRepoImpl;
use crate::error::UserError;

// 为实际使用创建类型别名
pub type UserServiceImpl = UserService<UserRepoImpl>;

/// 存储层 `age INT` 列可容纳的最大值
pub const MAX_AGE: u32 = i32::MAX as u32;

fn check_age(age: u32) -> Result<u32, UserError> {
    if age > MAX_AGE {
        return Err(UserError::InvalidParam(format!(
            "age {} exceeds maximum {}",
            age, MAX_AGE
        )));
    }
    Ok(age)
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveUserReq {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FindUsersReq {
    #[serde(default)]
    pub name: String,
    pub age: u32,
}

/// HTTP 层：负责请求解码、调用用例以及响应编码
#[derive(Debug)]
pub struct UserService<R, G = RandomTokenGenerator>
where
    R: UserRepo,
    G: TokenGenerator,
{
    uc: Arc<UserUseCase<R, G>>,
}

impl<R: UserRepo, G: TokenGenerator> UserService<R, G> {
    pub fn new(uc: Arc<UserUseCase<R, G>>) -> Self {
        Self { uc }
    }

    /// POST /api/users
    #[tracing::instrument(skip_all, fields(operation = "save_user"))]
    pub async fn save(
        &self,
        body: Result<Json<SaveUserReq>, JsonRejection>,
    ) -> Result<(StatusCode, Json<User>), UserError> {
        let Json(req) = body.map_err(|e| {
            warn!(error = %e, "error to read body");
            UserError::InvalidBody(e.body_text())
        })?;
        let age = check_age(req.age).inspect_err(|e| warn!(error = %e, "invalid age"))?;

        let user = self.uc.save(req.name, age).await.map_err(|e| {
            error!(error = %e, "error to save user");
            e
        })?;
        info!(user.id = user.id, "user saved");

        Ok((StatusCode::CREATED, Json(user)))
    }

    /// GET /api/users/{id}
    #[tracing::instrument(skip_all, fields(operation = "find_user"))]
    pub async fn find(
        &self,
        id: Result<Path<u64>, PathRejection>,
    ) -> Result<Json<User>, UserError> {
        let Path(id) = id.map_err(|e| {
            warn!(error = %e, "invalid user id");
            UserError::InvalidParam(e.body_text())
        })?;

        let user = self.uc.find(id).await.map_err(|e| {
            match &e {
                UserError::NotFound(_) => info!(user.id = id, "user not found"),
                _ => error!(user.id = id, error = %e, "find user failed"),
            }
            e
        })?;

        Ok(Json(user))
    }

    /// GET /api/users?name=&age=
    #[tracing::instrument(skip_all, fields(operation = "find_users_by_params"))]
    pub async fn find_by_params(
        &self,
        query: Result<Query<FindUsersReq>, QueryRejection>,
    ) -> Result<Json<Vec<User>>, UserError> {
        let Query(req) = query.map_err(|e| {
            warn!(error = %e, "invalid query parameters");
            UserError::InvalidParam(e.body_text())
        })?;
        let age = check_age(req.age).inspect_err(|e| warn!(error = %e, "invalid age"))?;

        let users = self
            .uc
            .find_by_params(&req.name, age)
            .await
            .map_err(|e| {
                error!(error = %e, "find users failed");
                e
            })?;
        info!(count = users.len(), "users found");

        Ok(Json(users))
    }
}
