pub mod response;
pub mod user_service;

pub use user_service::{FindUsersReq, SaveUserReq, UserService, UserServiceImpl};
