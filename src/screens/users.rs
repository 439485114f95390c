//! User administration screens.

use tracing::debug;

use super::{announce, ScreenLifecycle};
use crate::api::{MessageReply, NewUser, PasswordChange, UserRecord, UserUpdate};
use crate::context::AppContext;
use crate::forms::{
    submit_validated, FormSchema, FormValues, SubmitOutcome, CHANGE_PASSWORD_FORM,
    CREATE_USER_FORM, EDIT_USER_FORM,
};
use crate::navigation::Route;
use crate::session::UserRole;

pub const USERS_FAILURE: &str = "Error fetching users";
pub const USER_FETCH_FAILURE: &str = "Error fetching user data";
pub const USER_CREATE_FAILURE: &str = "Error creating user";
pub const USER_UPDATE_FAILURE: &str = "Error updating user";
pub const USER_DELETE_FAILURE: &str = "Error deleting user";
pub const PASSWORD_FAILURE: &str = "Error updating password";

/// Blank or unknown roles fall back to a regular user.
fn role_of(values: &FormValues) -> UserRole {
    UserRole::from_str(values.get("role")).unwrap_or_default()
}

/// The user list.
pub struct DashboardScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
    users: Vec<UserRecord>,
    pending_delete: Option<UserRecord>,
}

impl DashboardScreen {
    pub fn open(ctx: &AppContext) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::Dashboard)?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
            users: Vec::new(),
            pending_delete: None,
        })
    }

    /// Fetches the list. On failure the previous list is kept.
    pub async fn load(&mut self) -> bool {
        let Some(result) = self.lifecycle.run(self.ctx.api.list_users()).await else {
            return false;
        };
        match result {
            Ok(reply) => {
                debug!("Loaded {} users", reply.data.len());
                self.users = reply.data;
                if !reply.message.trim().is_empty() {
                    self.ctx.notifier.success(reply.message);
                }
                true
            }
            Err(e) => {
                self.ctx.report(&e, USERS_FAILURE);
                false
            }
        }
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn request_edit(&self, id: &str) {
        self.ctx
            .navigator()
            .navigate(Route::EditUser(id.to_string()));
    }

    pub fn request_change_password(&self, id: &str) {
        self.ctx
            .navigator()
            .navigate(Route::ChangePassword(id.to_string()));
    }

    /// Opens the confirmation prompt for a listed user.
    pub fn request_delete(&mut self, id: &str) -> bool {
        self.pending_delete = self.users.iter().find(|u| u.id == id).cloned();
        self.pending_delete.is_some()
    }

    pub fn pending_delete(&self) -> Option<&UserRecord> {
        self.pending_delete.as_ref()
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the user awaiting confirmation, then reloads the list.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(user) = self.pending_delete.take() else {
            return false;
        };
        let Some(result) = self.lifecycle.run(self.ctx.api.delete_user(&user.id)).await else {
            return false;
        };
        match result {
            Ok(reply) => {
                announce(&self.ctx, &reply.message, "User deleted successfully");
                self.load().await;
                true
            }
            Err(e) => {
                self.ctx.report(&e, USER_DELETE_FAILURE);
                false
            }
        }
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}

pub struct CreateUserScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
}

impl CreateUserScreen {
    pub fn open(ctx: &AppContext) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::CreateUser)?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &CREATE_USER_FORM
    }

    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<MessageReply> {
        let user = NewUser {
            first_name: values.trimmed("firstName"),
            last_name: values.trimmed("lastName"),
            email: values.trimmed("email"),
            password: values.get("password").to_string(),
            batch: values.trimmed("batch"),
            role: role_of(values),
        };
        let api = self.ctx.api.clone();
        let outcome = submit_validated(
            &CREATE_USER_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            USER_CREATE_FAILURE,
            || async move { api.create_user(&user).await },
        )
        .await;

        if let SubmitOutcome::Submitted(reply) = &outcome {
            announce(&self.ctx, &reply.message, "User created successfully");
            self.ctx.navigator().navigate(Route::Dashboard);
        }
        outcome
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}

pub struct EditUserScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
    id: String,
    values: FormValues,
}

impl EditUserScreen {
    pub fn open(ctx: &AppContext, id: &str) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::EditUser(id.to_string()))?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
            id: id.to_string(),
            values: FormValues::new().with("role", UserRole::User.as_str()),
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &EDIT_USER_FORM
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current form content, pre-filled by [`EditUserScreen::load`].
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub async fn load(&mut self) -> bool {
        let Some(result) = self.lifecycle.run(self.ctx.api.get_user(&self.id)).await else {
            return false;
        };
        match result {
            Ok(reply) => {
                let user = reply.data;
                self.values = FormValues::new()
                    .with("firstName", user.first_name)
                    .with("lastName", user.last_name)
                    .with("email", user.email)
                    .with("batch", user.batch)
                    .with("role", user.role.as_str());
                if !reply.message.trim().is_empty() {
                    self.ctx.notifier.success(reply.message);
                }
                true
            }
            Err(e) => {
                self.ctx.report(&e, USER_FETCH_FAILURE);
                false
            }
        }
    }

    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<MessageReply> {
        let update = UserUpdate {
            email: values.trimmed("email"),
            first_name: values.trimmed("firstName"),
            last_name: values.trimmed("lastName"),
            batch: values.trimmed("batch"),
            role: role_of(values),
        };
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let outcome = submit_validated(
            &EDIT_USER_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            USER_UPDATE_FAILURE,
            || async move { api.update_user(&id, &update).await },
        )
        .await;

        if let SubmitOutcome::Submitted(reply) = &outcome {
            announce(&self.ctx, &reply.message, "User updated successfully");
            self.ctx.navigator().navigate(Route::Dashboard);
        }
        outcome
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}

pub struct ChangePasswordScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
    id: String,
}

impl ChangePasswordScreen {
    pub fn open(ctx: &AppContext, id: &str) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::ChangePassword(id.to_string()))?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
            id: id.to_string(),
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &CHANGE_PASSWORD_FORM
    }

    /// Only the new password is sent, the confirmation stays local.
    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<MessageReply> {
        let change = PasswordChange {
            password: values.get("password").to_string(),
        };
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let outcome = submit_validated(
            &CHANGE_PASSWORD_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            PASSWORD_FAILURE,
            || async move { api.change_password(&id, &change).await },
        )
        .await;

        if let SubmitOutcome::Submitted(reply) = &outcome {
            announce(&self.ctx, &reply.message, "Password updated successfully");
            self.ctx.navigator().navigate(Route::Dashboard);
        }
        outcome
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}
