// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Field validators shared by every form.
//!
//! A validator is a boxed `Fn(&str) -> Result<(), FieldError>`. Primitives
//! build one for a named field; [`chain`] and [`optional`] compose them.

use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("{field} is required"))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FieldError {}

pub type Validator = Box<dyn Fn(&str) -> Result<(), FieldError>>;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});
static NUMERIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid numeric pattern"));
static ALPHANUMERIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid alphanumeric pattern"));

pub fn required(field: &str) -> Validator {
    let field = field.to_owned();
    Box::new(move |value| {
        if value.trim().is_empty() {
            return Err(FieldError::missing(&field));
        }
        Ok(())
    })
}

pub fn positive_int(field: &str) -> Validator {
    let field = field.to_owned();
    Box::new(move |value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FieldError::missing(&field));
        }
        let parsed: i64 = trimmed
            .parse()
            .map_err(|_| FieldError::new(&field, format!("{field} must be a number")))?;
        if parsed <= 0 {
            return Err(FieldError::new(
                &field,
                format!("{field} must be a positive number"),
            ));
        }
        Ok(())
    })
}

pub fn positive_float(field: &str) -> Validator {
    let field = field.to_owned();
    Box::new(move |value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FieldError::missing(&field));
        }
        let parsed = trimmed
            .parse::<f64>()
            .ok()
            .filter(|parsed| parsed.is_finite())
            .ok_or_else(|| FieldError::new(&field, format!("{field} must be a number")))?;
        if parsed <= 0.0 {
            return Err(FieldError::new(
                &field,
                format!("{field} must be a positive number"),
            ));
        }
        Ok(())
    })
}

pub fn min_length(field: &str, min: usize) -> Validator {
    let field = field.to_owned();
    Box::new(move |value| {
        if value.chars().count() < min {
            return Err(FieldError::new(
                &field,
                format!("{field} must be at least {min} characters"),
            ));
        }
        Ok(())
    })
}

pub fn max_length(field: &str, max: usize) -> Validator {
    let field = field.to_owned();
    Box::new(move |value| {
        if value.chars().count() > max {
            return Err(FieldError::new(
                &field,
                format!("{field} must not exceed {max} characters"),
            ));
        }
        Ok(())
    })
}

pub fn length_range(field: &str, min: usize, max: usize) -> Validator {
    chain(vec![min_length(field, min), max_length(field, max)])
}

/// Matches `value` against `regex`; `message` defaults to
/// "`<field>` has invalid format".
pub fn matches(field: &str, regex: Regex, message: Option<&str>) -> Validator {
    let field = field.to_owned();
    let message = message
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{field} has invalid format"));
    Box::new(move |value| {
        if !regex.is_match(value) {
            return Err(FieldError::new(&field, message.clone()));
        }
        Ok(())
    })
}

pub fn pattern(field: &str, pattern: &str, message: Option<&str>) -> Result<Validator> {
    let regex = Regex::new(pattern)
        .with_context(|| format!("compile validation pattern {pattern:?} for {field}"))?;
    Ok(matches(field, regex, message))
}

pub fn email(field: &str) -> Validator {
    matches(
        field,
        EMAIL_PATTERN.clone(),
        Some(&format!("{field} must be a valid email address")),
    )
}

pub fn numeric(field: &str) -> Validator {
    matches(
        field,
        NUMERIC_PATTERN.clone(),
        Some(&format!("{field} must contain only numbers")),
    )
}

pub fn alphanumeric(field: &str) -> Validator {
    matches(
        field,
        ALPHANUMERIC_PATTERN.clone(),
        Some(&format!("{field} must contain only letters and numbers")),
    )
}

/// Runs validators left to right and returns the first failure.
pub fn chain(validators: Vec<Validator>) -> Validator {
    Box::new(move |value| {
        for validator in &validators {
            validator(value)?;
        }
        Ok(())
    })
}

/// Blank or whitespace-only input passes without running `validator`.
pub fn optional(validator: Validator) -> Validator {
    Box::new(move |value| {
        if value.trim().is_empty() {
            return Ok(());
        }
        validator(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<(), FieldError>) -> String {
        result.err().map(|error| error.message).unwrap_or_default()
    }

    #[test]
    fn required_rejects_whitespace() {
        let validator = required("Name");
        assert_eq!(message(validator("   ")), "Name is required");
        assert!(validator("x").is_ok());
    }

    #[test]
    fn positive_int_distinguishes_blank_garbage_and_sign() {
        let validator = positive_int("Odoo ID");
        assert_eq!(message(validator("")), "Odoo ID is required");
        assert_eq!(message(validator("abc")), "Odoo ID must be a number");
        assert_eq!(message(validator("0")), "Odoo ID must be a positive number");
        assert_eq!(message(validator("-4")), "Odoo ID must be a positive number");
        assert!(validator(" 12 ").is_ok());
    }

    #[test]
    fn positive_float_rejects_non_finite_values() {
        let validator = positive_float("Hours");
        assert_eq!(message(validator("NaN")), "Hours must be a number");
        assert_eq!(message(validator("inf")), "Hours must be a number");
        assert_eq!(message(validator("0.0")), "Hours must be a positive number");
        assert!(validator("7.5").is_ok());
    }

    #[test]
    fn length_range_reports_both_bounds() {
        let validator = length_range("Name", 2, 4);
        assert_eq!(message(validator("a")), "Name must be at least 2 characters");
        assert_eq!(message(validator("abcde")), "Name must not exceed 4 characters");
        assert!(validator("abc").is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let validator = max_length("Short Name", 2);
        assert!(validator("🔧🔧").is_ok());
    }

    #[test]
    fn chain_returns_first_failure() {
        let validator = chain(vec![min_length("Name", 5), numeric("Name")]);
        assert_eq!(message(validator("ab")), "Name must be at least 5 characters");
        assert_eq!(message(validator("abcdef")), "Name must contain only numbers");
        assert!(validator("123456").is_ok());
    }

    #[test]
    fn optional_skips_blank_values() {
        let validator = optional(email("Email"));
        assert!(validator("  ").is_ok());
        assert_eq!(
            message(validator("nope")),
            "Email must be a valid email address"
        );
        assert!(validator("ops@example.com").is_ok());
    }

    #[test]
    fn pattern_uses_default_message() -> Result<()> {
        let validator = pattern("Code", "^[A-Z]{3}$", None)?;
        assert_eq!(message(validator("ab")), "Code has invalid format");
        assert!(pattern("Code", "(", None).is_err());
        Ok(())
    }

    #[test]
    fn alphanumeric_rejects_symbols() {
        let validator = alphanumeric("Code");
        assert_eq!(
            message(validator("a-b")),
            "Code must contain only letters and numbers"
        );
        assert!(validator("ab12").is_ok());
    }
}
