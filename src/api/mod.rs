mod client;
mod error;
pub mod models;

pub use client::ApiClient;
pub use error::ApiError;
pub use models::{
    ApiReply, BinColor, BinFields, BinRecord, LoginRequest, LoginResponse, MessageReply, NewUser,
    PasswordChange, UserRecord, UserUpdate,
};

use async_trait::async_trait;

/// Resource operations offered by the backend.
///
/// Implemented over HTTP by [`ApiClient`]; screens only depend on this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError>;

    async fn list_users(&self) -> Result<ApiReply<Vec<UserRecord>>, ApiError>;
    async fn get_user(&self, id: &str) -> Result<ApiReply<UserRecord>, ApiError>;
    async fn create_user(&self, user: &NewUser) -> Result<MessageReply, ApiError>;
    async fn update_user(&self, id: &str, user: &UserUpdate) -> Result<MessageReply, ApiError>;
    async fn delete_user(&self, id: &str) -> Result<MessageReply, ApiError>;
    async fn change_password(
        &self,
        id: &str,
        change: &PasswordChange,
    ) -> Result<MessageReply, ApiError>;

    async fn list_bins(&self) -> Result<ApiReply<Vec<BinRecord>>, ApiError>;
    async fn get_bin(&self, id: &str) -> Result<ApiReply<BinRecord>, ApiError>;
    async fn create_bin(&self, bin: &BinFields) -> Result<MessageReply, ApiError>;
    async fn update_bin(&self, id: &str, bin: &BinFields) -> Result<MessageReply, ApiError>;
    async fn delete_bin(&self, id: &str) -> Result<MessageReply, ApiError>;
}
