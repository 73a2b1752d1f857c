//! Visit Panel Client - API client and dashboard controllers.
//!
//! This crate talks to the Visit Panel backend over HTTP and drives a
//! [`view::View`] implementation supplied by the embedding front end.
//!
//! # Modules
//!
//! - [`api`] - Typed endpoint calls and envelope handling
//! - [`dashboard`] - User pages: auth, coin calculator, tasks, polling
//! - [`admin`] - Admin panel: users, coin credits, redeems, exports
//! - [`session`] - Persisted token and user record
//! - [`view`] - Output surface trait and table rendering
//! - [`config`] - Environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use visit_panel_client::{ApiClient, ClientConfig, Credentials, Dashboard, SessionStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::from_config(&config)?;
//! let dashboard = Dashboard::new(api, SessionStore::file(&config.session_file), view, &config);
//!
//! dashboard.login(&Credentials::new("alice", "secret")).await?;
//! let poller = dashboard.boot().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod poller;
pub mod session;
pub mod view;

pub use admin::{AdminPanel, AdminSession};
pub use api::{ApiClient, Form, LoginResponse, Registration, StartedTask};
pub use config::{ClientConfig, ConfigError, LogFormat};
pub use dashboard::{Credentials, Dashboard};
pub use error::{ClientError, ClientResult};
pub use guard::{InFlightGuard, InFlightTicket};
pub use poller::PollHandle;
pub use session::{FileStore, LocalStore, MemoryStore, Session, SessionStore};
pub use view::{Area, Route, Table, View};
