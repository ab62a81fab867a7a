pub mod access;
pub mod assignment;
pub mod error;
pub mod events;
pub mod membership;
pub mod ports;
pub mod repo;
pub mod service;
