// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE DEFINITION ===
pub mod module;
pub use module::Projects;

pub const MODULE_NAME: &str = "projects";

// === INTERNAL MODULES ===
// Public for integration tests only.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
