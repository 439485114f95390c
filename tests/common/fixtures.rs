//! Seed data of the mock backend

use super::constants::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use waste_console::api::{BinColor, BinRecord, UserRecord};
use waste_console::session::UserRole;

/// A user row as the backend stores it, password included.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub record: UserRecord,
    pub password: String,
}

pub fn seed_users() -> Vec<StoredUser> {
    vec![
        StoredUser {
            record: UserRecord {
                id: ADMIN_ID.to_string(),
                first_name: ADMIN_FIRST_NAME.to_string(),
                last_name: "raj".to_string(),
                email: ADMIN_EMAIL.to_string(),
                batch: "B22".to_string(),
                role: UserRole::Admin,
            },
            password: DEMO_PASS.to_string(),
        },
        StoredUser {
            record: UserRecord {
                id: USER_ID.to_string(),
                first_name: USER_FIRST_NAME.to_string(),
                last_name: "rajan".to_string(),
                email: USER_EMAIL.to_string(),
                batch: "B23".to_string(),
                role: UserRole::User,
            },
            password: DEMO_PASS.to_string(),
        },
    ]
}

pub fn seed_bins() -> Vec<BinRecord> {
    vec![
        BinRecord {
            id: BIN_1_ID.to_string(),
            bin_name: BIN_1_NAME.to_string(),
            bin_location: "Block A".to_string(),
            bin_color: BinColor::Green,
        },
        BinRecord {
            id: BIN_2_ID.to_string(),
            bin_name: BIN_2_NAME.to_string(),
            bin_location: "Block C".to_string(),
            bin_color: BinColor::Yellow,
        },
    ]
}

/// Signs a session token carrying the claims the console reads.
pub fn issue_token(user: &UserRecord) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    encode(
        &Header::default(),
        &json!({
            "id": user.id,
            "role": user.role.as_str(),
            "firstName": user.first_name,
            "email": user.email,
            "exp": exp,
        }),
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .expect("Failed to sign token")
}
