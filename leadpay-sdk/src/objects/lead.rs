//! Lead-capture form submission.
//!
//! [`LeadForm`] is the raw body accepted by `POST /api/users/submit`
//! (JSON or urlencoded). [`LeadForm::into_submission`] trims the free-text
//! fields (name, email, city), runs the field rules and produces a [`LeadSubmission`] ready for order creation.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

/// Self-reported experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Experience {
    None,
    Beginner,
    Intermediate,
    Advanced,
}

impl Experience {
    pub const ALL: [Experience; 4] = [
        Experience::None,
        Experience::Beginner,
        Experience::Intermediate,
        Experience::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::None => "None",
            Experience::Beginner => "Beginner",
            Experience::Intermediate => "Intermediate",
            Experience::Advanced => "Advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == value)
    }
}

impl std::fmt::Display for Experience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Raw form body. Missing fields deserialize as empty strings so that they
/// are reported by validation rather than rejected by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LeadForm {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_city"))]
    pub city: String,
    #[serde(default)]
    #[validate(custom(function = "validate_experience"))]
    pub experience: String,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub city: String,
    pub experience: Experience,
}

const FIELD_ORDER: [&str; 5] = ["name", "mobile", "email", "city", "experience"];

impl LeadForm {
    /// Trim, validate and convert the form.
    ///
    /// Only name, email and city are trimmed; mobile and experience must
    /// match exactly. Every failing field is reported, in form order.
    pub fn into_submission(self) -> Result<LeadSubmission, Vec<FieldError>> {
        let form = LeadForm {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            city: self.city.trim().to_owned(),
            ..self
        };

        if let Err(errors) = form.validate() {
            let mut fields: Vec<FieldError> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    let field = field.to_string();
                    errs.iter().map(move |e| FieldError {
                        field: field.clone(),
                        message: e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{field} is invalid")),
                    })
                })
                .collect();
            fields.sort_by_key(|e| {
                FIELD_ORDER
                    .iter()
                    .position(|f| *f == e.field)
                    .unwrap_or(FIELD_ORDER.len())
            });
            return Err(fields);
        }

        let experience = Experience::parse(&form.experience).ok_or_else(|| {
            vec![FieldError {
                field: "experience".to_owned(),
                message: EXPERIENCE_MESSAGE.to_owned(),
            }]
        })?;

        Ok(LeadSubmission {
            name: form.name,
            mobile: form.mobile,
            email: form.email,
            city: form.city,
            experience,
        })
    }
}

const EXPERIENCE_MESSAGE: &str = "Please select a valid experience level";

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn bounded(
    value: &str,
    min: usize,
    max: usize,
    messages: [&'static str; 3],
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        Err(rule("required", messages[0]))
    } else if len < min {
        Err(rule("length", messages[1]))
    } else if len > max {
        Err(rule("length", messages[2]))
    } else {
        Ok(())
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    bounded(
        value,
        2,
        100,
        [
            "Name is required",
            "Name must be at least 2 characters",
            "Name cannot exceed 100 characters",
        ],
    )
}

fn validate_city(value: &str) -> Result<(), ValidationError> {
    bounded(
        value,
        2,
        50,
        [
            "City is required",
            "City must be at least 2 characters",
            "City cannot exceed 50 characters",
        ],
    )
}

/// Ten digit Indian mobile number starting with 6-9.
fn validate_mobile(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("required", "Mobile number is required"));
    }
    let bytes = value.as_bytes();
    let valid = bytes.len() == 10
        && matches!(bytes[0], b'6'..=b'9')
        && bytes.iter().all(u8::is_ascii_digit);
    if valid {
        Ok(())
    } else {
        Err(rule("pattern", "Please enter a valid Indian mobile number"))
    }
}

fn validate_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(rule("required", "Email is required"))
    } else if value.validate_email() {
        Ok(())
    } else {
        Err(rule("email", "Please enter a valid email address"))
    }
}

fn validate_experience(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("required", "Experience is required"));
    }
    match Experience::parse(value) {
        Some(_) => Ok(()),
        None => Err(rule("one_of", EXPERIENCE_MESSAGE)),
    }
}
