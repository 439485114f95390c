//! Console screens. Each one is opened through the auth gate and holds a
//! [`ScreenLifecycle`] that discards late results once it is left.

mod bins;
mod lifecycle;
mod login;
mod users;

pub use bins::{
    BinEntry, BinsScreen, CreateBinScreen, EditBinScreen, BINS_FAILURE, BIN_CREATE_FAILURE,
    BIN_FETCH_FAILURE, BIN_UPDATE_FAILURE,
};
pub use lifecycle::ScreenLifecycle;
pub use login::{DemoAccount, LoginScreen, DEMO_PASSWORD, INVALID_TOKEN, LOGIN_FAILURE};
pub use users::{
    ChangePasswordScreen, CreateUserScreen, DashboardScreen, EditUserScreen, PASSWORD_FAILURE,
    USERS_FAILURE, USER_CREATE_FAILURE, USER_DELETE_FAILURE, USER_FETCH_FAILURE,
    USER_UPDATE_FAILURE,
};

use crate::context::AppContext;

/// Success notification with the server's message, or `default` when it
/// sent none.
fn announce(ctx: &AppContext, message: &str, default: &str) {
    if message.trim().is_empty() {
        ctx.notifier.success(default);
    } else {
        ctx.notifier.success(message);
    }
}
