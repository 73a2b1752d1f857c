//! Visit Panel Core - Shared types library.
//!
//! This crate provides the types shared by the Visit Panel components:
//! - `client` - HTTP API client and view controllers
//! - `cli` - Terminal front end (`vp-cli`)
//!
//! # Architecture
//!
//! The core crate contains only types and plain arithmetic - no I/O, no HTTP
//! clients. Every value here is a transient copy of server-owned state.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, tasks, users, redeems, settings and coin math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
