pub mod permissions;
pub mod serve;
pub mod user;
