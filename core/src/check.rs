//! Argument checks run by repositories before anything is queued.
//!
//! Every check returns [`RestError::Validation`] naming the argument, so the
//! caller gets an immediately failed result instead of a network round trip.

use crate::error::RestError;

/// Fails when `value` is empty or only whitespace.
///
/// # Errors
///
/// Returns [`RestError::Validation`] naming `name`.
pub fn not_blank(value: &str, name: &str) -> Result<(), RestError> {
    if value.trim().is_empty() {
        return Err(RestError::validation(name, "may not be blank"));
    }
    Ok(())
}

/// Fails when `value` contains any whitespace character.
///
/// # Errors
///
/// Returns [`RestError::Validation`] naming `name`.
pub fn no_whitespace(value: &str, name: &str) -> Result<(), RestError> {
    if value.chars().any(char::is_whitespace) {
        return Err(RestError::validation(name, "may not contain blanks"));
    }
    Ok(())
}

/// Fails when `values` is empty or any element is blank.
///
/// # Errors
///
/// Returns [`RestError::Validation`] naming `name`.
pub fn none_blank<S: AsRef<str>>(values: &[S], name: &str) -> Result<(), RestError> {
    if values.is_empty() {
        return Err(RestError::validation(name, "may not be empty"));
    }
    values.iter().try_for_each(|v| not_blank(v.as_ref(), name))
}

/// Fails when `n` is zero or negative.
///
/// # Errors
///
/// Returns [`RestError::Validation`] naming `name`.
pub fn positive(n: i64, name: &str) -> Result<(), RestError> {
    if n <= 0 {
        return Err(RestError::validation(name, "may not be negative or zero"));
    }
    Ok(())
}

/// Generic predicate check with a caller supplied reason.
///
/// # Errors
///
/// Returns [`RestError::Validation`] naming `name` when `expression` is false.
pub fn check(expression: bool, name: &str, reason: &str) -> Result<(), RestError> {
    if expression {
        Ok(())
    } else {
        Err(RestError::validation(name, reason))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("abc", "hash").is_ok());
        let err = not_blank("  \t", "hash").unwrap_err();
        assert_eq!(err, RestError::validation("hash", "may not be blank"));
    }

    #[test]
    fn whitespace_is_rejected() {
        assert!(no_whitespace("a1b2", "tag").is_ok());
        assert!(no_whitespace("a b", "tag").is_err());
    }

    #[test]
    fn collections_need_at_least_one_non_blank_element() {
        assert!(none_blank(&["a", "b"], "ids").is_ok());
        assert!(none_blank::<&str>(&[], "ids").is_err());
        assert!(none_blank(&["a", ""], "ids").is_err());
    }

    #[test]
    fn numeric_and_predicate_checks() {
        assert!(positive(1, "id").is_ok());
        assert!(positive(0, "id").is_err());
        assert!(positive(-4, "id").is_err());
        assert!(check(true, "x", "never").is_ok());
        assert_eq!(
            check(false, "page", "too large").unwrap_err().to_string(),
            "Invalid argument `page`: too large"
        );
    }
}
