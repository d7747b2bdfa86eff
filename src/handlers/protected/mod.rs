// handlers/protected/mod.rs - Protected handlers (session required)
//
// Route Prefix: /api/*
// Middleware: session_middleware puts the caller's Session in the request
// extensions; each handler then checks its own permission requirement.
pub mod ai;
pub mod permissions;
pub mod products;
pub mod projects;
pub mod session;
pub mod system_prompts;
pub mod users;
