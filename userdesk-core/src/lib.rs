//! Core library for user accounts: credential storage, login with attempt lockout,
//! paginated listing, and account management.

mod error;
pub mod store;
pub mod user;

pub use error::{AuthError, HashError, Result, StoreError, TokenError, UserError};
pub use store::{CredentialStore, FileStore, MemoryStore, UserFilter};
pub use user::{
    AttemptRecord, AttemptTracker, Authenticator, BcryptHasher, ChangePasswordRequest, Clock,
    CreateUserRequest, JwtIssuer, ListQuery, LoginRequest, LoginSuccess, MemoryAttemptTracker,
    Page, PasswordHasher, SearchSpec, SortOrder, SortSpec, SystemClock, TokenClaims, TokenIssuer,
    UpdateUserRequest, User, UserField, UserManager, UserPatch, UserSummary, WriteOutcome,
};
