use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::navigation::{Navigator, Route};
use crate::session::Access;

/// Mounted state of one screen.
///
/// The screen counts as mounted until it is explicitly unmounted, dropped,
/// or the navigator moves to another route. Work started through
/// [`ScreenLifecycle::run`] yields nothing once the screen is gone.
pub struct ScreenLifecycle {
    route: Route,
    navigator: Navigator,
    token: CancellationToken,
}

impl ScreenLifecycle {
    /// Checks `route` against the session and mounts it, or sends the
    /// navigator to the redirect target and returns that instead.
    pub fn enter(ctx: &AppContext, route: Route) -> Result<Self, Route> {
        match ctx.gate().check(&route) {
            Access::Allowed => {
                ctx.navigator().navigate(route.clone());
                debug!("Mounted {}", route);
                Ok(Self {
                    route,
                    navigator: ctx.navigator().clone(),
                    token: CancellationToken::new(),
                })
            }
            Access::Redirect(target) => {
                info!("Access to {} denied, redirecting to {}", route, target);
                ctx.navigator().navigate(target.clone());
                Err(target)
            }
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled() && self.navigator.current() == self.route
    }

    pub fn unmount(&self) {
        if !self.token.is_cancelled() {
            debug!("Unmounted {}", self.route);
            self.token.cancel();
        }
    }

    /// A token cancelled together with this screen.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Drives `fut` while the screen stays mounted.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if !self.is_mounted() {
            return None;
        }
        let mut routes = self.navigator.subscribe();
        let route = self.route.clone();
        let left = async move {
            let _ = routes.wait_for(|current| *current != route).await;
        };

        let output = tokio::select! {
            _ = self.token.cancelled() => None,
            _ = left => None,
            output = fut => Some(output),
        };
        output.filter(|_| self.is_mounted())
    }
}

impl Drop for ScreenLifecycle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
