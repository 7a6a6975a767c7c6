//! The callback pipeline: code → token → claims → local user → session → redirect

mod errors;
mod login;
mod resolver;

pub use errors::LoginError;
pub use login::{CallbackGate, LoginOutcome, LoginService, LoginStage, LoginSuccess};
pub use resolver::{MatchKind, ResolvedUser, email_local_part, resolve_user};
