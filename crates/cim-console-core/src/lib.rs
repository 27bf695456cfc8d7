//! Core library for the CIM administrative console.
//!
//! This crate holds everything the console needs that is not terminal
//! rendering:
//!
//! - `api`: HTTP client adapter with bearer-token attachment and typed errors
//! - `auth`: session store persisted to local storage
//! - `router`: routes and the per-navigation route guard
//! - `models`: user, group and policy records as the server returns them
//! - `views`: resource view state and view-scoped cancellation
//! - `console`: the coordinator that ties them together

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod models;
pub mod router;
pub mod storage;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use auth::{Identity, SessionState, SessionStore};
pub use config::Config;
pub use console::Console;
pub use router::{GuardDecision, Route, RouteGuard};
pub use storage::{FileStorage, MemoryStorage, Storage};
