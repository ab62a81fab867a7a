//! User directory: profile records referenced by id from the rest of the system.
//!
//! Other modules use it only through [`contract::client::DirectoryApi`], which
//! the module registers in the `ClientHub` during init.

pub mod api;
pub mod config;
pub mod contract;
pub mod domain;
pub mod gateways;
pub mod infra;
pub mod module;

pub use contract::client::DirectoryApi;
pub use contract::error::DirectoryError;
pub use contract::model::{User, UserProfile};
pub use module::Directory;

pub const MODULE_NAME: &str = "directory";
