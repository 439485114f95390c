//! Field lists of every console form.

use super::schema::{FieldSpec, FormSchema, Rule};

const ROLES: &[&str] = &["user", "admin"];
const BIN_COLORS: &[&str] = &["green", "yellow", "red"];

const FIRST_NAME: FieldSpec = FieldSpec {
    name: "firstName",
    label: "First Name",
    rules: &[Rule::Required("First Name is required")],
    secret: false,
};

const LAST_NAME: FieldSpec = FieldSpec {
    name: "lastName",
    label: "Last Name",
    rules: &[Rule::Required("Last Name is required")],
    secret: false,
};

const BATCH: FieldSpec = FieldSpec {
    name: "batch",
    label: "Batch",
    rules: &[Rule::Required("Batch is required")],
    secret: false,
};

const ROLE: FieldSpec = FieldSpec {
    name: "role",
    label: "Role (user/admin)",
    rules: &[Rule::OneOf(ROLES, "Role must be user or admin")],
    secret: false,
};

const BIN_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "binName",
        label: "Bin Name",
        rules: &[Rule::Required("Bin Name is required")],
        secret: false,
    },
    FieldSpec {
        name: "binLocation",
        label: "Bin Location",
        rules: &[Rule::Required("Bin Location is required")],
        secret: false,
    },
    FieldSpec {
        name: "binColor",
        label: "Bin Color (green/yellow/red)",
        rules: &[
            Rule::Required("Bin Color is required"),
            Rule::OneOf(BIN_COLORS, "Bin Color must be green, yellow or red"),
        ],
        secret: false,
    },
];

pub const LOGIN_FORM: FormSchema = FormSchema {
    title: "Login",
    fields: &[
        FieldSpec {
            name: "email",
            label: "Email",
            rules: &[
                Rule::Required("Email is required"),
                Rule::Email("Invalid email address"),
            ],
            secret: false,
        },
        FieldSpec {
            name: "password",
            label: "Password",
            rules: &[Rule::Required("Password is required")],
            secret: true,
        },
    ],
};

pub const CREATE_USER_FORM: FormSchema = FormSchema {
    title: "Create User",
    fields: &[
        FIRST_NAME,
        LAST_NAME,
        FieldSpec {
            name: "email",
            label: "Email ID",
            rules: &[
                Rule::Required("Email is required"),
                Rule::Email("Invalid email"),
            ],
            secret: false,
        },
        FieldSpec {
            name: "password",
            label: "Password",
            rules: &[Rule::Required("Password is required")],
            secret: true,
        },
        BATCH,
        ROLE,
    ],
};

pub const EDIT_USER_FORM: FormSchema = FormSchema {
    title: "Edit User",
    fields: &[
        FIRST_NAME,
        LAST_NAME,
        FieldSpec {
            name: "email",
            label: "Email ID",
            rules: &[
                Rule::Required("Email is required"),
                Rule::Email("Invalid email format"),
            ],
            secret: false,
        },
        BATCH,
        ROLE,
    ],
};

pub const CHANGE_PASSWORD_FORM: FormSchema = FormSchema {
    title: "Change Password",
    fields: &[
        FieldSpec {
            name: "password",
            label: "New Password",
            rules: &[
                Rule::Required("New Password is required"),
                Rule::MinLength(1, "Password must be at least 1 character"),
            ],
            secret: true,
        },
        FieldSpec {
            name: "confirmPassword",
            label: "Confirm Password",
            rules: &[
                Rule::Required("Confirm Password is required"),
                Rule::Matches("password", "Passwords must match"),
            ],
            secret: true,
        },
    ],
};

pub const CREATE_BIN_FORM: FormSchema = FormSchema {
    title: "Create Bin",
    fields: BIN_FIELDS,
};

pub const EDIT_BIN_FORM: FormSchema = FormSchema {
    title: "Edit Bin",
    fields: BIN_FIELDS,
};
