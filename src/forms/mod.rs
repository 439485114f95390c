//! Field schemas and the validated-submit helper shared by every form.

mod schema;
mod schemas;
mod submit;

pub use schema::{FieldError, FieldErrors, FieldSpec, FormSchema, FormValues, Rule};
pub use schemas::{
    CHANGE_PASSWORD_FORM, CREATE_BIN_FORM, CREATE_USER_FORM, EDIT_BIN_FORM, EDIT_USER_FORM,
    LOGIN_FORM,
};
pub use submit::{submit_validated, SubmitOutcome};
