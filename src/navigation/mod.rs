//! Route table and navigation state.
//!
//! Every screen of the console is addressed by a [`Route`]. The [`Navigator`]
//! holds the route currently on screen and lets any number of observers wait
//! for changes, which is how a forced logout reaches the console loop.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// A screen of the console.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    CreateUser,
    /// The user list.
    Dashboard,
    EditUser(String),
    Bins,
    CreateBin,
    EditBin(String),
    ChangePassword(String),
}

impl Route {
    /// Resolves a path to a route. Anything that doesn't match lands on
    /// [`Route::Login`].
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["create-user"] => Route::CreateUser,
            ["dashboard"] => Route::Dashboard,
            ["edit-user", id] => Route::EditUser(decode_segment(id)),
            ["users", "bins"] => Route::Bins,
            ["users", "create-bin"] => Route::CreateBin,
            ["users", "edit-bin", id] => Route::EditBin(decode_segment(id)),
            ["users", "change-password", id] => Route::ChangePassword(decode_segment(id)),
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::CreateUser => "/create-user".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::EditUser(id) => format!("/edit-user/{}", urlencoding::encode(id)),
            Route::Bins => "/users/bins".to_string(),
            Route::CreateBin => "/users/create-bin".to_string(),
            Route::EditBin(id) => format!("/users/edit-bin/{}", urlencoding::encode(id)),
            Route::ChangePassword(id) => {
                format!("/users/change-password/{}", urlencoding::encode(id))
            }
        }
    }

    /// Whether the route can only be shown to a logged in viewer.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Whether the route is reserved to administrators.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::CreateUser
                | Route::EditUser(_)
                | Route::ChangePassword(_)
                | Route::CreateBin
        )
    }

    /// Human readable title, used by the menubar and the console prompt.
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::CreateUser => "Create User",
            Route::Dashboard => "Dashboard",
            Route::EditUser(_) => "Edit User",
            Route::Bins => "Bins",
            Route::CreateBin => "Create Bin",
            Route::EditBin(_) => "Edit Bin",
            Route::ChangePassword(_) => "Change Password",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Shared handle to the route on screen.
///
/// Cloning is cheap, all clones drive the same navigation state.
#[derive(Clone)]
pub struct Navigator {
    sender: Arc<watch::Sender<Route>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn navigate(&self, route: Route) {
        debug!("Navigating to {}", route);
        self.sender.send_replace(route);
    }

    /// Navigates by path, with the same fallback rules as [`Route::parse`].
    pub fn navigate_path(&self, path: &str) -> Route {
        let route = Route::parse(path);
        self.navigate(route.clone());
        route
    }

    pub fn current(&self) -> Route {
        self.sender.borrow().clone()
    }

    /// Returns a receiver that observes every subsequent navigation.
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.sender.subscribe()
    }
}
