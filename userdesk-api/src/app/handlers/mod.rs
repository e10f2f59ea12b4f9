mod auth;
mod health;
mod users;

pub use auth::login;
pub use health::{handler_404, health};
pub use users::{change_password, create_user, delete_user, get_user, list_users, update_user};
