/*
 * @Description: 错误响应结构与业务错误码
 */

use http::StatusCode;
use serde::Serialize;

/// 业务错误码，与HTTP状态码对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrCode {
    /// 请求参数错误 - HTTP 400
    BadRequest = 400,
    /// 资源未找到 - HTTP 404
    NotFound = 404,

    /// 内部服务器错误 - HTTP 500
    InternalServerError = 500,

    // 业务特定错误码 (1000+)
    /// 参数验证失败
    ValidationError = 1001,
    /// 数据库操作失败
    DatabaseError = 1002,
    /// 数据不一致
    DataInconsistencyError = 1008,
}

impl ErrCode {
    /// 获取对应的HTTP状态码
    pub fn http_status(&self) -> u16 {
        match *self {
            ErrCode::BadRequest => StatusCode::BAD_REQUEST.as_u16(),
            ErrCode::NotFound => StatusCode::NOT_FOUND.as_u16(),
            ErrCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ErrCode::ValidationError => StatusCode::BAD_REQUEST.as_u16(),
            ErrCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ErrCode::DataInconsistencyError => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }

    /// 获取默认的错误消息
    pub fn default_message(&self) -> &'static str {
        match *self {
            ErrCode::BadRequest => "bad request",
            ErrCode::NotFound => "resource not found",
            ErrCode::InternalServerError => "internal server error",
            ErrCode::ValidationError => "parameter validation failed",
            ErrCode::DatabaseError => "database operation failed",
            ErrCode::DataInconsistencyError => "inconsistent stored data",
        }
    }
}

// 序列化时使用数值
impl Serialize for ErrCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(*self as i32)
    }
}

impl std::fmt::Display for ErrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as i32)
    }
}

/// 错误响应体 `{code, msg}`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    /// 响应状态码
    pub code: ErrCode,
    /// 响应消息
    pub msg: String,
}

impl Response {
    // 失败响应
    pub fn failed(code: ErrCode, msg: Option<impl Into<String>>) -> Self {
        Self {
            code,
            msg: msg.map_or_else(|| code.default_message().to_string(), Into::into),
        }
    }
}
