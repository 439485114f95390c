//! HTTP client for the waste management backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use super::models::{
    ApiReply, BinFields, BinRecord, ErrorBody, LoginRequest, LoginResponse, MessageReply,
    NewUser, PasswordChange, UserRecord, UserUpdate,
};
use super::BackendApi;
use crate::session::SessionContext;

/// Whether a request carries the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    /// Attached when a session exists, sent anyway otherwise.
    IfPresent,
    /// Refused locally with [`ApiError::NotLoggedIn`] when there's no session.
    Required,
}

/// REST client that reads its bearer token from the session on every call.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the backend (e.g., "https://api.example.com")
    /// * `timeout` - Per-request timeout
    /// * `session` - Session the bearer token is read from
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionContext,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Get the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder, auth: Auth) -> Result<RequestBuilder, ApiError> {
        if auth == Auth::None {
            return Ok(request);
        }
        match self.session.token() {
            Some(token) => Ok(request.bearer_auth(token)),
            None if auth == Auth::Required => Err(ApiError::NotLoggedIn),
            None => Ok(request),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let request = self.authorize(request, auth)?;
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let bytes = response.bytes().await?;
        debug!("{} -> {} ({} bytes)", url, status, bytes.len());

        if status.is_success() {
            let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
            return serde_json::from_slice(body)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()));
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_default();
        warn!("{} failed with {}: {}", url, status, message);

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::Server { status, message })
        }
    }
}

fn id_segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl BackendApi for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.url("/users/login")).json(credentials);
        self.send(request, Auth::None).await
    }

    async fn list_users(&self) -> Result<ApiReply<Vec<UserRecord>>, ApiError> {
        let request = self.client.get(self.url("/users"));
        self.send(request, Auth::Required).await
    }

    async fn get_user(&self, id: &str) -> Result<ApiReply<UserRecord>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/users/{}", id_segment(id))));
        self.send(request, Auth::Required).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<MessageReply, ApiError> {
        let request = self.client.post(self.url("/users")).json(user);
        self.send(request, Auth::IfPresent).await
    }

    async fn update_user(&self, id: &str, user: &UserUpdate) -> Result<MessageReply, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/users/{}", id_segment(id))))
            .json(user);
        self.send(request, Auth::Required).await
    }

    async fn delete_user(&self, id: &str) -> Result<MessageReply, ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/users/{}", id_segment(id))));
        self.send(request, Auth::Required).await
    }

    async fn change_password(
        &self,
        id: &str,
        change: &PasswordChange,
    ) -> Result<MessageReply, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/users/change-password/{}", id_segment(id))))
            .json(change);
        self.send(request, Auth::Required).await
    }

    async fn list_bins(&self) -> Result<ApiReply<Vec<BinRecord>>, ApiError> {
        let request = self.client.get(self.url("/bins"));
        self.send(request, Auth::IfPresent).await
    }

    async fn get_bin(&self, id: &str) -> Result<ApiReply<BinRecord>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/bins/{}", id_segment(id))));
        self.send(request, Auth::IfPresent).await
    }

    async fn create_bin(&self, bin: &BinFields) -> Result<MessageReply, ApiError> {
        let request = self.client.post(self.url("/bins")).json(bin);
        self.send(request, Auth::IfPresent).await
    }

    async fn update_bin(&self, id: &str, bin: &BinFields) -> Result<MessageReply, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/bins/{}", id_segment(id))))
            .json(bin);
        self.send(request, Auth::IfPresent).await
    }

    async fn delete_bin(&self, id: &str) -> Result<MessageReply, ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/bins/{}", id_segment(id))));
        self.send(request, Auth::IfPresent).await
    }
}
