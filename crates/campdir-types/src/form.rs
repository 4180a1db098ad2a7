//! Form-boundary validation.
//!
//! Every add/edit intent starts life as a name (and for persons, a phone).
//! Validation happens here, before anything reaches the tree reducers or the
//! sync session; a rejected form never produces an intent.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Loose phone pattern: digits, spaces, hyphens and plus signs.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d+\-\s]+$").expect("static phone regex"));

/// Which form is being submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Union,
    Ward,
    WardPerson,
    UnionPerson,
}

impl FormKind {
    /// Person forms require a phone number.
    pub fn requires_phone(self) -> bool {
        matches!(self, FormKind::WardPerson | FormKind::UnionPerson)
    }
}

/// Raw, untrimmed form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub phone: String,
}

impl FormInput {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Validate and trim. On failure every offending field is reported.
    pub fn validate(&self, kind: FormKind) -> Result<FormData, ValidationErrors> {
        let name = self.name.trim();
        let phone = self.phone.trim();
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push(FieldError {
                field: FormField::Name,
                error: ValidationError::NameRequired,
            });
        }

        if kind.requires_phone() {
            if phone.is_empty() {
                errors.push(FieldError {
                    field: FormField::Phone,
                    error: ValidationError::PhoneRequired,
                });
            } else if !PHONE_PATTERN.is_match(phone) {
                errors.push(FieldError {
                    field: FormField::Phone,
                    error: ValidationError::PhoneMalformed(phone.to_string()),
                });
            }
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(FormData {
            name: name.to_string(),
            phone: kind.requires_phone().then(|| phone.to_string()),
        })
    }
}

/// Validated, trimmed form output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormData {
    pub name: String,
    /// Present for person forms only.
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Phone,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Name => f.write_str("name"),
            FormField::Phone => f.write_str("phone"),
        }
    }
}

/// A single field-level failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,
    #[error("phone number is required")]
    PhoneRequired,
    #[error("phone number is not valid: {0:?}")]
    PhoneMalformed(String),
}

impl ValidationError {
    /// Bangla message shown next to the field.
    pub fn message_bn(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "নাম আবশ্যক",
            ValidationError::PhoneRequired => "ফোন নম্বর আবশ্যক",
            ValidationError::PhoneMalformed(_) => "ফোন নম্বর সঠিক নয়",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub error: ValidationError,
}

/// All field errors of one submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", display_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: FormField) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.error)
    }
}

fn display_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ward_form_needs_only_name() {
        let data = FormInput::new("  Ward-3 ", "").validate(FormKind::Ward).unwrap();
        assert_eq!(data.name, "Ward-3");
        assert_eq!(data.phone, None);
    }

    #[test]
    fn test_person_form_trims_phone() {
        let data = FormInput::new("Karim", " +880 17-1234 ")
            .validate(FormKind::WardPerson)
            .unwrap();
        assert_eq!(data.phone.as_deref(), Some("+880 17-1234"));
    }

    #[test]
    fn test_blank_fields_reported_together() {
        let err = FormInput::new("   ", "").validate(FormKind::UnionPerson).unwrap_err();
        assert_eq!(err.for_field(FormField::Name), Some(&ValidationError::NameRequired));
        assert_eq!(err.for_field(FormField::Phone), Some(&ValidationError::PhoneRequired));
    }

    #[test]
    fn test_malformed_phone() {
        let err = FormInput::new("Karim", "017XXXXXXXX").validate(FormKind::WardPerson).unwrap_err();
        assert!(matches!(
            err.for_field(FormField::Phone),
            Some(ValidationError::PhoneMalformed(_))
        ));
        assert_eq!(err.0.len(), 1);
    }

    #[test]
    fn test_phone_ignored_for_union_name() {
        let data = FormInput::new("Union X", "garbage").validate(FormKind::Union).unwrap();
        assert_eq!(data.phone, None);
    }
}
