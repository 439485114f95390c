use std::future::Future;

use tracing::debug;

use super::schema::{FieldErrors, FormSchema, FormValues};
use crate::api::ApiError;
use crate::context::AppContext;
use crate::screens::ScreenLifecycle;

/// What happened to one form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Rejected locally, nothing was sent.
    Invalid(FieldErrors),
    Submitted(T),
    /// The backend refused; the message was already shown.
    Failed(String),
    /// The screen went away while the request was in flight.
    Discarded,
}

impl<T> SubmitOutcome<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// Validates `values` against `schema` and, only if they pass, runs
/// `submit` while the screen stays mounted.
///
/// Failures are reported through the context, so an unauthorized answer
/// ends the session. The caller handles success.
pub async fn submit_validated<T, F, Fut>(
    schema: &FormSchema,
    values: &FormValues,
    ctx: &AppContext,
    lifecycle: &ScreenLifecycle,
    fallback: &str,
    submit: F,
) -> SubmitOutcome<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Err(errors) = schema.validate(values) {
        debug!("{} form rejected: {}", schema.title, errors);
        return SubmitOutcome::Invalid(errors);
    }

    match lifecycle.run(submit()).await {
        None => {
            debug!("{} result discarded, screen left", schema.title);
            SubmitOutcome::Discarded
        }
        Some(Ok(value)) => SubmitOutcome::Submitted(value),
        Some(Err(e)) => {
            let message = e.user_message(fallback);
            ctx.report(&e, fallback);
            SubmitOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MessageReply, MockBackendApi};
    use crate::forms::{CHANGE_PASSWORD_FORM, CREATE_BIN_FORM};
    use crate::navigation::{Navigator, Route};
    use crate::notifications::Notifier;
    use crate::session::SessionContext;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn admin_context() -> AppContext {
        let session = SessionContext::new(Navigator::default());
        let token = encode(
            &Header::default(),
            &json!({"role": "admin", "firstName": "Samuvel"}),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        session.login(&token).unwrap();
        AppContext::new(Arc::new(MockBackendApi::new()), session, Notifier::new())
    }

    fn new_password() -> FormValues {
        FormValues::new()
            .with("password", "next")
            .with("confirmPassword", "next")
    }

    #[tokio::test]
    async fn unauthorized_answer_ends_the_session() {
        let ctx = admin_context();
        let lifecycle =
            ScreenLifecycle::enter(&ctx, Route::ChangePassword("u-1".to_string())).unwrap();

        let outcome: SubmitOutcome<MessageReply> = submit_validated(
            &CHANGE_PASSWORD_FORM,
            &new_password(),
            &ctx,
            &lifecycle,
            "Error updating password",
            || async { Err(ApiError::Unauthorized("jwt expired".to_string())) },
        )
        .await;

        assert_eq!(outcome, SubmitOutcome::Failed("jwt expired".to_string()));
        assert!(ctx.session.current().is_none());
        assert_eq!(ctx.navigator().current(), Route::Login);
        assert_eq!(ctx.notifier.drain()[0].text, "jwt expired");
    }

    #[tokio::test]
    async fn server_error_keeps_the_session_and_route() {
        let ctx = admin_context();
        let lifecycle = ScreenLifecycle::enter(&ctx, Route::CreateBin).unwrap();
        let values = FormValues::new()
            .with("binName", "Canteen")
            .with("binLocation", "Block A")
            .with("binColor", "green");

        let outcome: SubmitOutcome<MessageReply> = submit_validated(
            &CREATE_BIN_FORM,
            &values,
            &ctx,
            &lifecycle,
            "Error creating bin",
            || async {
                Err(ApiError::Server {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: String::new(),
                })
            },
        )
        .await;

        assert_eq!(outcome, SubmitOutcome::Failed("Error creating bin".to_string()));
        assert!(ctx.session.current().is_some());
        assert_eq!(ctx.navigator().current(), Route::CreateBin);
    }

    #[tokio::test]
    async fn invalid_values_never_reach_the_backend() {
        let ctx = admin_context();
        let lifecycle =
            ScreenLifecycle::enter(&ctx, Route::ChangePassword("u-1".to_string())).unwrap();
        let called = AtomicBool::new(false);

        let mismatch = FormValues::new()
            .with("password", "next")
            .with("confirmPassword", "other");
        let outcome: SubmitOutcome<()> = submit_validated(
            &CHANGE_PASSWORD_FORM,
            &mismatch,
            &ctx,
            &lifecycle,
            "Error updating password",
            || async {
                called.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(!called.load(Ordering::SeqCst));
        assert!(ctx.notifier.is_empty());
    }

    #[tokio::test]
    async fn result_after_unmount_is_discarded() {
        let ctx = admin_context();
        let lifecycle =
            ScreenLifecycle::enter(&ctx, Route::ChangePassword("u-1".to_string())).unwrap();
        lifecycle.unmount();

        let outcome: SubmitOutcome<MessageReply> = submit_validated(
            &CHANGE_PASSWORD_FORM,
            &new_password(),
            &ctx,
            &lifecycle,
            "Error updating password",
            || async { Err(ApiError::Unauthorized("jwt expired".to_string())) },
        )
        .await;

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert!(ctx.session.current().is_some());
    }
}
