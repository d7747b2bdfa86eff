// Business operations behind the handlers. Each service owns its
// validation and maps store/provider failures to ApiError.
pub mod content_service;
pub mod product_service;
pub mod project_service;
pub mod prompt_service;
pub mod user_service;

pub use content_service::ContentService;
pub use product_service::{CreateProductRequest, ProductService, UpdateProductRequest};
pub use project_service::{CreateProjectRequest, ProjectService};
pub use prompt_service::{render_template, PromptService};
pub use user_service::{CreateUserRequest, UserService};
