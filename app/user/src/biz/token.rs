use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::UserError;

pub const TOKEN_LEN: usize = 6;
pub const TOKEN_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// 36 * 7，超出的字节直接丢弃，保证每个字符等概率
const REJECTION_BOUND: u8 = 252;

pub trait TokenGenerator: Send + Sync + std::fmt::Debug {
    fn generate(&self) -> Result<String, UserError>;
}

/// 基于操作系统熵源的激活令牌生成器，无状态
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> Result<String, UserError> {
        token_from_rng(&mut OsRng)
    }
}

/// 从任意随机源生成令牌，随机源出错时直接返回错误
pub fn token_from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, UserError> {
    let mut token = String::with_capacity(TOKEN_LEN);
    let mut buf = [0u8; 16];

    while token.len() < TOKEN_LEN {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| UserError::TokenGeneration(e.to_string()))?;

        for &b in buf.iter().filter(|&&b| b < REJECTION_BOUND) {
            token.push(TOKEN_ALPHABET[(b % 36) as usize] as char);
            if token.len() == TOKEN_LEN {
                break;
            }
        }
    }

    Ok(token)
}
