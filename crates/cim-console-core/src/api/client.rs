//! API client for communicating with the CIM IAM REST API.
//!
//! This module provides the `ApiClient` struct. All calls funnel through
//! `execute`, which attaches the stored bearer token and turns non-success
//! statuses into `ApiError` values.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Identity;
use crate::models::{CreatedId, Group, List, Policy, ResourceKind, User};
use crate::storage::{Storage, TOKEN_KEY};

use super::{ApiError, ApiRequest};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// OAuth grant type used by the console login
const GRANT_TYPE_PASSWORD: &str = "password";

/// Successful response of `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// Identity record, when the server embeds one
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    grant_type: &'a str,
    username: &'a str,
    password: &'a str,
}

/// API client for the IAM server.
/// Clone is cheap - reqwest::Client and the storage handle are both Arc.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    /// Create a new API client that reads its token from `storage`
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers attached to every outbound request.
    /// The token is read from storage on each call, never cached.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token from storage, sending anonymous request");
                None
            }
        };
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Stored token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status, &body);
            if error.is_unauthorized() {
                warn!(url = %url, "Unauthorized response");
            } else {
                debug!(url = %url, status = %status, "Request failed");
            }
            Err(error)
        }
    }

    /// Send a request with the current token attached and return the successful response.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        Self::check_response(response).await
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse JSON response from {}: {}",
                request.path, e
            ))
        })
    }

    async fn execute_empty(&self, request: &ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Exchange username and password for a bearer token
    pub async fn request_token(&self, username: &str, password: &str) -> Result<TokenGrant, ApiError> {
        let body = PasswordGrantRequest {
            grant_type: GRANT_TYPE_PASSWORD,
            username,
            password,
        };
        self.execute_json(&ApiRequest::post("/token", &body)?).await
    }

    // ===== Generic resource operations =====

    pub async fn list<T: DeserializeOwned>(&self, kind: ResourceKind) -> Result<Vec<T>, ApiError> {
        let list: List<T> = self
            .execute_json(&ApiRequest::get(kind.collection_path()))
            .await?;
        Ok(list.data)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, kind: ResourceKind, id: &str) -> Result<T, ApiError> {
        self.execute_json(&ApiRequest::get(kind.item_path(id))).await
    }

    pub async fn create<B: Serialize>(&self, kind: ResourceKind, body: &B) -> Result<CreatedId, ApiError> {
        self.execute_json(&ApiRequest::post(kind.collection_path(), body)?)
            .await
    }

    pub async fn update<B: Serialize>(&self, kind: ResourceKind, id: &str, body: &B) -> Result<(), ApiError> {
        self.execute_empty(&ApiRequest::put(kind.item_path(id), body)?)
            .await
    }

    pub async fn delete(&self, kind: ResourceKind, id: &str) -> Result<(), ApiError> {
        self.execute_empty(&ApiRequest::delete(kind.item_path(id))).await
    }

    // ===== Users =====

    pub async fn create_user(&self, user: &User) -> Result<CreatedId, ApiError> {
        self.create(ResourceKind::Users, user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.list(ResourceKind::Users).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        self.fetch(ResourceKind::Users, id).await
    }

    pub async fn update_user(&self, id: &str, user: &User) -> Result<(), ApiError> {
        self.update(ResourceKind::Users, id, user).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.delete(ResourceKind::Users, id).await
    }

    // ===== Groups =====

    pub async fn create_group(&self, group: &Group) -> Result<CreatedId, ApiError> {
        self.create(ResourceKind::Groups, group).await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.list(ResourceKind::Groups).await
    }

    pub async fn get_group(&self, id: &str) -> Result<Group, ApiError> {
        self.fetch(ResourceKind::Groups, id).await
    }

    pub async fn update_group(&self, id: &str, group: &Group) -> Result<(), ApiError> {
        self.update(ResourceKind::Groups, id, group).await
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), ApiError> {
        self.delete(ResourceKind::Groups, id).await
    }

    // ===== Policies =====

    pub async fn create_policy(&self, policy: &Policy) -> Result<CreatedId, ApiError> {
        self.create(ResourceKind::Policies, policy).await
    }

    pub async fn list_policies(&self) -> Result<Vec<Policy>, ApiError> {
        self.list(ResourceKind::Policies).await
    }

    pub async fn get_policy(&self, id: &str) -> Result<Policy, ApiError> {
        self.fetch(ResourceKind::Policies, id).await
    }

    pub async fn update_policy(&self, id: &str, policy: &Policy) -> Result<(), ApiError> {
        self.update(ResourceKind::Policies, id, policy).await
    }

    pub async fn delete_policy(&self, id: &str) -> Result<(), ApiError> {
        self.delete(ResourceKind::Policies, id).await
    }
}
