//! Authentication module for managing the console session.
//!
//! This module provides:
//! - `SessionStore`: the single authenticated identity for this process,
//!   persisted to local storage and observable through a watch channel
//! - `Identity`: the user record stored next to the bearer token
//!
//! Tokens are never refreshed. An expired token is only discovered when a
//! request comes back unauthorized.

pub mod session;

pub use session::{Identity, SessionState, SessionStore};
