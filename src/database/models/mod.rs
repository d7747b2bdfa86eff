pub mod product;
pub mod project;
pub mod system_prompt;
pub mod user;

pub use product::{CreateProduct, Product, UpdateProduct};
pub use project::{CreateProject, Project, ProjectScope, ResponseMode};
pub use system_prompt::{SystemPrompt, SystemType};
pub use user::{CreateUser, User, UserSummary};
