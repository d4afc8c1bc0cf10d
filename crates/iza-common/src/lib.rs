//! # iza-common
//!
//! Shared primitives for the iza container runtime workspace: the unified
//! error type, domain identifiers, resource-limit parsing, default paths,
//! and the global configuration model.

pub mod config;
pub mod constants;
pub mod error;
pub mod limits;
pub mod types;
