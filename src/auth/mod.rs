pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LEN};
pub use session::{Claims, IssuedSession, Session, SessionError, SessionKeys};
