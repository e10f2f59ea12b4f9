//! 用户账户：登录限流、列表查询与 CRUD

mod attempts;
mod auth;
mod crypto;
mod manager;
mod models;
mod password;
mod query;
mod token;

pub use attempts::{AttemptRecord, AttemptTracker, Clock, MemoryAttemptTracker, SystemClock};
pub use auth::Authenticator;
pub use crypto::{BcryptHasher, PasswordHasher};
pub use manager::UserManager;
pub use models::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginSuccess, TokenClaims,
    UpdateUserRequest, User, UserPatch, UserSummary, WriteOutcome,
};
pub use query::{ListQuery, Page, SearchSpec, SortOrder, SortSpec, UserField};
pub use token::{JwtIssuer, TokenIssuer};

#[cfg(test)]
pub(crate) mod testing;
