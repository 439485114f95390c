use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email pattern");
}

/// A check applied to one field. Every rule but `Required` passes on an
/// empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required(&'static str),
    Email(&'static str),
    MinLength(usize, &'static str),
    /// The value must equal the one of another field.
    Matches(&'static str, &'static str),
    OneOf(&'static [&'static str], &'static str),
}

impl Rule {
    fn check(&self, value: &str, values: &FormValues) -> Result<(), &'static str> {
        let blank = value.trim().is_empty();
        match *self {
            Rule::Required(message) if blank => Err(message),
            Rule::Required(_) => Ok(()),
            _ if blank => Ok(()),
            Rule::Email(message) if !EMAIL_PATTERN.is_match(value.trim()) => Err(message),
            Rule::MinLength(min, message) if value.chars().count() < min => Err(message),
            Rule::Matches(other, message) if value != values.get(other) => Err(message),
            Rule::OneOf(allowed, message)
                if !allowed
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(value.trim())) =>
            {
                Err(message)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: &'static [Rule],
    /// Read without echo on the console.
    pub secret: bool,
}

impl FieldSpec {
    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSchema {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Runs every rule, keeping the first failure of each field.
    pub fn validate(&self, values: &FormValues) -> Result<(), FieldErrors> {
        let errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = values.get(field.name);
                field
                    .rules
                    .iter()
                    .find_map(|rule| rule.check(value, values).err())
                    .map(|message| FieldError {
                        field: field.name,
                        message: message.to_string(),
                    })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(errors))
        }
    }
}

/// Raw text entered for a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Empty when the field was never set.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn trimmed(&self, name: &str) -> String {
        self.get(name).trim().to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", joined.join("; "))
    }
}
