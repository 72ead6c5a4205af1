pub mod models;
pub mod token;
pub mod user_usecase;

pub use models::{NewUser, User};
pub use token::{RandomTokenGenerator, TokenGenerator};
pub use user_usecase::{UserRepo, UserUseCase};
