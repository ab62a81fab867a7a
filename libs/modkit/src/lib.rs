//! # ModKit - module wiring for the taskboard server
//!
//! Modules are plain structs that implement a core [`Module`] trait plus any of the
//! optional capabilities ([`DbModule`], [`RestfulModule`], [`RestHostModule`],
//! [`StatefulModule`]). The application lists them explicitly in a
//! [`ModuleRegistry`], which orders them by declared dependencies and drives the
//! phases: init → DB → REST → start → stop.
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::builder()
//!     .module(ModuleEntry::new("directory", directory.clone()).db(directory.clone()).rest(directory))
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Core module contracts and traits
pub mod contracts;
pub use crate::contracts::*;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod client_hub;
pub mod registry;

pub use client_hub::{ClientHub, ClientHubError};
pub use registry::{ModuleEntry, ModuleRegistry, RegistryBuilder, RegistryError};

// HTTP surface shared by every REST module
pub mod api;
pub use api::problem::{
    bad_request, conflict, forbidden, internal_error, not_found, unauthorized, Problem,
    ProblemResponse, ValidationError,
};
pub use api::{ErrDef, OpenApiRegistry};

pub mod security;
pub use security::SecurityCtx;

pub mod runtime;
pub use crate::runtime::{run, DbOptions, RunOptions, ShutdownOptions};
