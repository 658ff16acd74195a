//! Session state and lifecycle

mod model;
mod store;

pub use model::{Session, SessionStatus, User};
pub use store::{SessionStore, MIN_PASSWORD_LEN};
