pub mod auth;
pub mod guard;
pub mod response;

pub use auth::{extract_token, session_middleware};
pub use guard::Requirement;
pub use response::{ApiResponse, ApiResult};
