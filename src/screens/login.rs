use tracing::{info, warn};

use super::{announce, ScreenLifecycle};
use crate::api::LoginRequest;
use crate::context::AppContext;
use crate::forms::{submit_validated, FormSchema, FormValues, SubmitOutcome, LOGIN_FORM};
use crate::navigation::Route;
use crate::session::{AuthGate, Session};

pub const DEMO_PASSWORD: &str = "1";
pub const LOGIN_FAILURE: &str = "Login failed. Please try again.";
pub const INVALID_TOKEN: &str = "Login failed: the server returned an unreadable session token";

/// Preset accounts offered on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAccount {
    Admin,
    User,
}

impl DemoAccount {
    pub fn email(self) -> &'static str {
        match self {
            DemoAccount::Admin => "samuvel6826@gmail.com",
            DemoAccount::User => "jenitharajan029@gmail.com",
        }
    }

    pub fn credentials(self) -> FormValues {
        FormValues::new()
            .with("email", self.email())
            .with("password", DEMO_PASSWORD)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(DemoAccount::Admin),
            "user" => Some(DemoAccount::User),
            _ => None,
        }
    }
}

pub struct LoginScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
}

impl LoginScreen {
    pub fn open(ctx: &AppContext) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::Login)?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &LOGIN_FORM
    }

    /// Logs in and lands on the page of the role the server reported.
    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<Session> {
        let request = LoginRequest {
            email: values.trimmed("email"),
            password: values.get("password").to_string(),
        };
        let api = self.ctx.api.clone();
        let outcome = submit_validated(
            &LOGIN_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            LOGIN_FAILURE,
            || async move { api.login(&request).await },
        )
        .await;

        let response = match outcome {
            SubmitOutcome::Submitted(response) => response,
            SubmitOutcome::Invalid(errors) => return SubmitOutcome::Invalid(errors),
            SubmitOutcome::Failed(message) => return SubmitOutcome::Failed(message),
            SubmitOutcome::Discarded => return SubmitOutcome::Discarded,
        };

        let session = match self.ctx.session.login(&response.token) {
            Ok(session) => session,
            Err(e) => {
                warn!("Rejecting login, token did not decode: {}", e);
                self.ctx.notifier.error(INVALID_TOKEN);
                return SubmitOutcome::Failed(INVALID_TOKEN.to_string());
            }
        };

        info!("Logged in as {} ({})", session.first_name, response.role);
        announce(&self.ctx, &response.message, "Login successful");
        self.ctx
            .navigator()
            .navigate(AuthGate::landing_route(response.role));
        SubmitOutcome::Submitted(session)
    }

    pub async fn demo_login(&self, account: DemoAccount) -> SubmitOutcome<Session> {
        self.submit(&account.credentials()).await
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}
