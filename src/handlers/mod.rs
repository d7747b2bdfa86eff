// handlers/mod.rs - Two-tier handler layout
//
// Public (no session) → Protected (session cookie or Bearer token).
// Permission checks happen inside each protected handler, against the
// session snapshot, before any store or provider call.
pub mod protected;
pub mod public;
