pub mod biz;
pub mod data;
pub mod error;
pub mod server;
pub mod service;

pub use error::UserError;
