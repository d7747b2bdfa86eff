// handlers/public/mod.rs - Public handlers (no session required)
//
// Token acquisition, logout and service probes.
pub mod auth;
pub mod system;
