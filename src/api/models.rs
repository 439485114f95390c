//! Wire models of the backend REST API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::UserRole;

/// Waste stream a bin is dedicated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinColor {
    Green,
    Yellow,
    Red,
}

impl BinColor {
    pub const ALL: [BinColor; 3] = [BinColor::Green, BinColor::Yellow, BinColor::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            BinColor::Green => "green",
            BinColor::Yellow => "yellow",
            BinColor::Red => "red",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "green" => Some(BinColor::Green),
            "yellow" => Some(BinColor::Yellow),
            "red" => Some(BinColor::Red),
            _ => None,
        }
    }

    pub fn waste_category(self) -> &'static str {
        match self {
            BinColor::Green => "Organic Waste",
            BinColor::Yellow => "Paper Waste",
            BinColor::Red => "E-Waste",
        }
    }
}

impl fmt::Display for BinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub bin_name: String,
    pub bin_location: String,
    pub bin_color: BinColor,
}

/// Editable fields of a bin, sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinFields {
    pub bin_name: String,
    pub bin_location: String,
    pub bin_color: BinColor,
}

impl From<&BinRecord> for BinFields {
    fn from(record: &BinRecord) -> Self {
        Self {
            bin_name: record.bin_name.clone(),
            bin_location: record.bin_location.clone(),
            bin_color: record.bin_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub batch: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub batch: String,
    pub role: UserRole,
}

impl From<&UserRecord> for UserUpdate {
    fn from(record: &UserRecord) -> Self {
        Self {
            email: record.email.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            batch: record.batch.clone(),
            role: record.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub message: String,
}

/// `{data, message}` envelope used by the read endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiReply<T> {
    pub data: T,
    #[serde(default)]
    pub message: String,
}

/// Body of the write endpoints, only the message is of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageReply {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// `errorMessage` wins over `message`; blank values don't count.
    pub fn into_message(self) -> Option<String> {
        self.error_message
            .filter(|m| !m.trim().is_empty())
            .or(self.message.filter(|m| !m.trim().is_empty()))
    }
}
