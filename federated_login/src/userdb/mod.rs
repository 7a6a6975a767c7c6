mod config;
mod errors;
mod memory;
mod sqlite;
mod types;

pub use config::user_directory_from_env;
pub use errors::UserError;
pub use memory::InMemoryUserDirectory;
pub use sqlite::SqliteUserDirectory;
pub use types::{LocalUser, NewUser, UserDirectory};
