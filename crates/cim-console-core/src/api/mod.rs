//! REST API client module for the CIM IAM server.
//!
//! This module provides the `ApiClient` for the user, group and policy
//! endpoints and the password grant on `/token`.
//!
//! Every request reads the bearer token from local storage right before it
//! is sent. An unauthorized response comes back as `ApiError::Unauthorized`;
//! the client never navigates or clears anything itself.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, TokenGrant};
pub use error::ApiError;
pub use request::ApiRequest;
