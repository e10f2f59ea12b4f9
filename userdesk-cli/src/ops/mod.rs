mod output;
pub mod ui;
mod users;

pub use output::OutputFormat;
pub use users::{
    change_password, create_user, delete_user, get_user, list_users, login, update_user,
    ListOptions,
};
