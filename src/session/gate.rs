//! Role checks that decide what the viewer may see.

use super::claims::{decode_claims, Claims};
use super::context::SessionContext;
use super::role::UserRole;
use crate::navigation::Route;

pub const APP_TITLE: &str = "Waste Management System";

/// Outcome of checking a route against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Redirect(Route),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub label: &'static str,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    /// `"<role> : <firstName>"`, empty when logged out.
    pub caption: String,
    pub links: Vec<MenuLink>,
}

/// Snapshot of what the current session allows.
///
/// Built from the stored token: a missing token short-circuits to "logged
/// out" without any decoding attempt, an undecodable one is treated the same.
#[derive(Debug, Clone)]
pub struct AuthGate {
    claims: Option<Claims>,
}

impl AuthGate {
    pub fn from_session(session: &SessionContext) -> Self {
        let claims = match session.token() {
            None => None,
            Some(token) => decode_claims(&token).ok(),
        };
        Self { claims }
    }

    pub fn is_logged_in(&self) -> bool {
        self.claims.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.claims
            .as_ref()
            .map(|c| c.role == UserRole::Admin)
            .unwrap_or(false)
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Where a viewer lands right after logging in.
    pub fn landing_route(role: UserRole) -> Route {
        match role {
            UserRole::Admin => Route::Dashboard,
            UserRole::User => Route::Bins,
        }
    }

    pub fn check(&self, route: &Route) -> Access {
        if !route.requires_session() {
            return Access::Allowed;
        }
        if !self.is_logged_in() {
            return Access::Redirect(Route::Login);
        }
        if route.requires_admin() && !self.is_admin() {
            return Access::Redirect(Route::Bins);
        }
        Access::Allowed
    }

    pub fn menu(&self) -> Menu {
        let caption = self
            .claims
            .as_ref()
            .map(|c| format!("{} : {}", c.role, c.first_name))
            .unwrap_or_default();

        let links = if self.is_admin() {
            vec![
                MenuLink {
                    label: "Dashboard",
                    route: Route::Dashboard,
                },
                MenuLink {
                    label: "Create User",
                    route: Route::CreateUser,
                },
                MenuLink {
                    label: "Lists Bins",
                    route: Route::Bins,
                },
                MenuLink {
                    label: "Create Bin",
                    route: Route::CreateBin,
                },
            ]
        } else {
            Vec::new()
        };

        Menu {
            title: APP_TITLE,
            caption,
            links,
        }
    }
}
