use serde::{Deserialize, Serialize};

/// 已持久化的用户，`id` 由存储层分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub age: u32,
    /// 激活令牌，仅内部使用，不对外输出
    #[serde(skip_serializing, default)]
    pub activation_token: Option<String>,
}

/// 尚未持久化的用户，交给 repository 写入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub age: u32,
    pub activation_token: String,
}

impl NewUser {
    pub fn new(name: String, age: u32, activation_token: String) -> Self {
        Self {
            name,
            age,
            activation_token,
        }
    }

    /// 写入成功后，用存储层分配的 id 生成完整的 User
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            name: self.name,
            age: self.age,
            activation_token: Some(self.activation_token),
        }
    }
}
