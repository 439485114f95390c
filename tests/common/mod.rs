//! Common test infrastructure
//!
//! Everything the end-to-end tests need: a mock backend serving the REST
//! API and the telemetry stream, and a console context wired to it.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestConsole, TestServer};
//! use waste_console::screens::{BinsScreen, DemoAccount};
//!
//! #[tokio::test]
//! async fn test_list_bins() {
//!     let server = TestServer::spawn().await;
//!     let console = TestConsole::logged_in(&server, DemoAccount::User).await;
//!
//!     let mut screen = BinsScreen::open(&console.ctx).unwrap();
//!     assert!(screen.load().await);
//! }
//! ```

mod console;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use console::{wait_for_state, TestConsole};
pub use constants::*;
pub use server::TestServer;

#[allow(unused_imports)]
pub(crate) use fixtures::{issue_token, StoredUser};
