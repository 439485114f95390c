//! Shared constants for end-to-end tests
//!
//! When seeded accounts, bins or feed settings change, update only this file.

// ============================================================================
// Seeded Accounts
// ============================================================================

/// Demo admin, also offered by the login screen
pub const ADMIN_EMAIL: &str = "samuvel6826@gmail.com";
pub const ADMIN_ID: &str = "u-admin";
pub const ADMIN_FIRST_NAME: &str = "samuvel";

/// Demo user, also offered by the login screen
pub const USER_EMAIL: &str = "jenitharajan029@gmail.com";
pub const USER_ID: &str = "u-user";
pub const USER_FIRST_NAME: &str = "jenitha";

/// Password of both demo accounts
pub const DEMO_PASS: &str = "1";

// ============================================================================
// Seeded Bins
// ============================================================================

pub const BIN_1_ID: &str = "b-canteen";
pub const BIN_1_NAME: &str = "Canteen";

pub const BIN_2_ID: &str = "b-library";
pub const BIN_2_NAME: &str = "Library";

// ============================================================================
// Backend
// ============================================================================

/// HS256 secret the mock backend signs session tokens with
pub const JWT_SECRET: &[u8] = b"waste-console-test-secret";

/// Channel the mock sensor publishes on
pub const FEED_CHANNEL: &str = "IOT";

/// Key the feed expects in the `auth` query parameter
pub const FEED_API_KEY: &str = "test-feed-key";

/// Bin depth used by the test console
pub const BIN_CAPACITY_CM: f64 = 10.0;

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Upper bound for a pushed snapshot to reach a bin display
pub const TELEMETRY_TIMEOUT_MS: u64 = 3000;
