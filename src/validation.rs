//! Pre-insert form contracts.
//!
//! Field rules are declared with `validator`; this module reduces the full
//! error set to the first violation in field-declaration order, which is the
//! single message a caller shows before any network call is made.

use crate::errors::FieldViolation;
use rust_decimal::Decimal;
use validator::{Validate, ValidationError};

/// A form whose field rules are checked before insert.
pub trait FormContract: Validate {
    /// Fields in declaration order; earlier fields win.
    const FIELD_ORDER: &'static [&'static str];

    /// Messages for fields declared `required`, which carry none of their own.
    const REQUIRED_MESSAGES: &'static [(&'static str, &'static str)] = &[];

    fn check(&self) -> Result<(), FieldViolation> {
        first_violation(self)
    }
}

/// Returns the first violated rule of `form`, or `Ok(())` when it is valid.
pub fn first_violation<T>(form: &T) -> Result<(), FieldViolation>
where
    T: FormContract + ?Sized,
{
    let errors = match form.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };
    let fields = errors.field_errors();

    for field in T::FIELD_ORDER {
        if let Some(error) = fields.get(field).and_then(|errs| errs.first()) {
            return Err(to_violation::<T>(field, error));
        }
    }

    // Fields missing from FIELD_ORDER still block submission, in name order.
    let mut rest: Vec<_> = fields.into_iter().collect();
    rest.sort_by_key(|(field, _)| *field);
    match rest
        .into_iter()
        .find_map(|(field, errs)| errs.first().map(|error| to_violation::<T>(field, error)))
    {
        Some(violation) => Err(violation),
        None => Err(FieldViolation::new("form", "invalid", "Form is invalid")),
    }
}

fn to_violation<T>(field: &str, error: &ValidationError) -> FieldViolation
where
    T: FormContract + ?Sized,
{
    let declared = || {
        T::REQUIRED_MESSAGES
            .iter()
            .find(|(name, _)| *name == field)
            .filter(|_| error.code == "required")
            .map(|(_, message)| message.to_string())
    };
    let message = error
        .message
        .as_ref()
        .map(|message| message.to_string())
        .or_else(declared)
        .unwrap_or_else(|| format!("{} is invalid", field));
    FieldViolation::new(field, error.code.to_string(), message)
}

/// Quantities are strictly positive.
pub fn positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if quantity.is_sign_positive() && !quantity.is_zero() {
        return Ok(());
    }
    let mut err = ValidationError::new("positive");
    err.message = Some("Quantity must be positive".into());
    Err(err)
}

/// Search input is not blank.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Value is required".into());
        return Err(err);
    }
    Ok(())
}
