use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::models::{NewUser, User};
use super::token::{RandomTokenGenerator, TokenGenerator};
use crate::error::UserError;

/// 用户持久化接口
///
/// 实现方负责把存储层的原始错误转换为 `UserError`：
/// - `save` 只会返回 `SaveFailed` 或 `LastInsertIdUnavailable`
/// - `find` 找不到记录时返回 `NotFound`
pub trait UserRepo: Send + Sync + std::fmt::Debug {
    fn save(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<u64, UserError>> + Send;

    fn find(&self, id: u64) -> impl std::future::Future<Output = Result<User, UserError>> + Send;

    fn find_by_name_and_age(
        &self,
        name: &str,
        age: u32,
    ) -> impl std::future::Future<Output = Result<Vec<User>, UserError>> + Send;
}

/// 用户业务逻辑用例
#[derive(Debug)]
pub struct UserUseCase<R: UserRepo, G: TokenGenerator = RandomTokenGenerator> {
    user_repo: Arc<R>,
    token_gen: G,
}

impl<R: UserRepo> UserUseCase<R> {
    pub fn new(user_repo: Arc<R>) -> Self {
        Self::with_token_generator(user_repo, RandomTokenGenerator)
    }
}

impl<R: UserRepo, G: TokenGenerator> UserUseCase<R, G> {
    pub fn with_token_generator(user_repo: Arc<R>, token_gen: G) -> Self {
        Self {
            user_repo,
            token_gen,
        }
    }

    /// 创建用户：先生成激活令牌，再写入存储
    #[instrument(skip(self))]
    pub async fn save(&self, name: String, age: u32) -> Result<User, UserError> {
        let token = self.token_gen.generate().inspect_err(|e| {
            warn!(error = %e, "activation token generation failed, nothing written");
        })?;

        let new_user = NewUser::new(name, age, token);
        let id = self.user_repo.save(&new_user).await?;

        info!(user.id = id, "user created");
        Ok(new_user.into_user(id))
    }

    #[instrument(skip(self))]
    pub async fn find(&self, id: u64) -> Result<User, UserError> {
        self.user_repo.find(id).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_params(&self, name: &str, age: u32) -> Result<Vec<User>, UserError> {
        self.user_repo.find_by_name_and_age(name, age).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biz::token::{TOKEN_ALPHABET, TOKEN_LEN};
    use crate::data::InMemoryUserRepo;

    #[derive(Debug)]
    struct FailingTokenGenerator;

    impl TokenGenerator for FailingTokenGenerator {
        fn generate(&self) -> Result<String, UserError> {
            Err(UserError::TokenGeneration("entropy source exhausted".to_string()))
        }
    }

    #[derive(Debug)]
    struct FixedTokenGenerator(&'static str);

    impl TokenGenerator for FixedTokenGenerator {
        fn generate(&self) -> Result<String, UserError> {
            Ok(self.0.to_string())
        }
    }

    fn usecase() -> (Arc<InMemoryUserRepo>, UserUseCase<InMemoryUserRepo>) {
        let repo = Arc::new(InMemoryUserRepo::new());
        (repo.clone(), UserUseCase::new(repo))
    }

    #[tokio::test]
    async fn test_save_success() {
        let (repo, uc) = usecase();

        let user = uc.save("Jane".to_string(), 30).await.unwrap();

        assert_ne!(user.id, 0);
        assert_eq!(user.name, "Jane");
        assert_eq!(user.age, 30);
        let token = user.activation_token.unwrap();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
        assert_eq!(repo.save_calls(), 1);
    }

    #[tokio::test]
    async fn test_save_accepts_empty_values() {
        let (_, uc) = usecase();

        let user = uc.save(String::new(), 0).await.unwrap();
        assert_ne!(user.id, 0);
        assert_eq!(user.name, "");
        assert_eq!(user.age, 0);
    }

    #[tokio::test]
    async fn test_save_stores_generated_token() {
        let repo = Arc::new(InMemoryUserRepo::new());
        let uc = UserUseCase::with_token_generator(repo.clone(), FixedTokenGenerator("ABC123"));

        let user = uc.save("Jane".to_string(), 30).await.unwrap();
        let stored = repo.find(user.id).await.unwrap();
        assert_eq!(stored.activation_token.as_deref(), Some("ABC123"));
    }

    #[tokio::test]
    async fn test_save_token_failure_skips_repository() {
        let repo = Arc::new(InMemoryUserRepo::new());
        let uc = UserUseCase::with_token_generator(repo.clone(), FailingTokenGenerator);

        let err = uc.save("Jane".to_string(), 30).await.unwrap_err();

        assert!(matches!(err, UserError::TokenGeneration(_)));
        assert_eq!(repo.save_calls(), 0);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_repository_failure_propagates() {
        let (repo, uc) = usecase();
        repo.fail_saves(true);

        let err = uc.save("Jane".to_string(), 30).await.unwrap_err();

        assert!(matches!(err, UserError::SaveFailed(_)));
        assert_eq!(repo.save_calls(), 1);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_round_trip() {
        let (_, uc) = usecase();
        let created = uc.save("Jane".to_string(), 30).await.unwrap();

        let found = uc.find(created.id).await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Jane");
        assert_eq!(found.age, 30);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let (_, uc) = usecase();

        assert_eq!(uc.find(999).await.unwrap_err(), UserError::NotFound(999));
        assert_eq!(uc.find(0).await.unwrap_err(), UserError::NotFound(0));
    }

    #[tokio::test]
    async fn test_find_by_params() {
        let (_, uc) = usecase();
        let jane = uc.save("Jane".to_string(), 30).await.unwrap();
        uc.save("Jane".to_string(), 31).await.unwrap();
        uc.save("John".to_string(), 30).await.unwrap();

        let users = uc.find_by_params("Jane", 30).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, jane.id);
    }

    #[tokio::test]
    async fn test_find_by_params_empty() {
        let (_, uc) = usecase();
        uc.save("Jane".to_string(), 30).await.unwrap();

        let users = uc.find_by_params("Nobody", 30).await.unwrap();
        assert!(users.is_empty());
    }
}
