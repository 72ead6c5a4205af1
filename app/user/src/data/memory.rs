use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::instrument;

use crate::biz::{NewUser, User, UserRepo};
use crate::error::UserError;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<User>,
    last_id: u64,
}

/// 内存存储，id 从 1 开始自增，查询结果保持插入顺序
#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    table: RwLock<Table>,
    fail_saves: AtomicBool,
    save_calls: AtomicUsize,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开后所有写入都返回 `SaveFailed`
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

impl UserRepo for InMemoryUserRepo {
    #[instrument(skip(self, user), fields(user.name = %user.name))]
    async fn save(&self, user: &NewUser) -> Result<u64, UserError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(UserError::SaveFailed("in-memory store rejected write".to_string()));
        }

        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.push(user.clone().into_user(id));
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn find(&self, id: u64) -> Result<User, UserError> {
        self.table
            .read()
            .await
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(UserError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn find_by_name_and_age(&self, name: &str, age: u32) -> Result<Vec<User>, UserError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|u| u.name == name && u.age == age)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, age: u32) -> NewUser {
        NewUser::new(name.to_string(), age, "TOKEN1".to_string())
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_one() {
        let repo = InMemoryUserRepo::new();
        assert_eq!(repo.save(&new_user("a", 1)).await.unwrap(), 1);
        assert_eq!(repo.save(&new_user("b", 2)).await.unwrap(), 2);
        assert_eq!(repo.save_calls(), 2);
    }

    #[tokio::test]
    async fn test_find_by_name_and_age_keeps_insert_order() {
        let repo = InMemoryUserRepo::new();
        repo.save(&new_user("Jane", 30)).await.unwrap();
        repo.save(&new_user("John", 30)).await.unwrap();
        repo.save(&new_user("Jane", 30)).await.unwrap();

        let ids: Vec<u64> = repo
            .find_by_name_and_age("Jane", 30)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_failing_saves_write_nothing() {
        let repo = InMemoryUserRepo::new();
        repo.fail_saves(true);

        let err = repo.save(&new_user("Jane", 30)).await.unwrap_err();
        assert!(matches!(err, UserError::SaveFailed(_)));
        assert!(repo.is_empty().await);

        repo.fail_saves(false);
        assert_eq!(repo.save(&new_user("Jane", 30)).await.unwrap(), 1);
    }
}
