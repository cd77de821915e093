//! Built-in field validators.
//!
//! All of them except [`required`] accept an empty value; combine with
//! [`required`] through [`all`] to reject it.

use std::sync::LazyLock;

use form_model::Value;
use form_state::Validator;
use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

/// Rejects null, blank strings, empty lists and empty objects.
pub fn required() -> Validator {
    Validator::sync(|value, _ctx| {
        if value.is_empty() {
            Err("This field is required.".to_string())
        } else {
            Ok(())
        }
    })
}

/// Character count bounds for text values.
pub fn text_length(min: Option<usize>, max: Option<usize>) -> Validator {
    Validator::sync(move |value, _ctx| {
        let Some(text) = value.as_str().filter(|text| !text.is_empty()) else {
            return Ok(());
        };
        let length = text.chars().count();
        if let Some(max) = max
            && length > max
        {
            return Err(format!(
                "This value must be shorter than the max length of {max} characters."
            ));
        }
        if let Some(min) = min
            && length < min
        {
            return Err(format!(
                "This value must be longer than the minimum length of {min} characters."
            ));
        }
        Ok(())
    })
}

/// Loose e-mail address shape.
pub fn email() -> Validator {
    Validator::sync(|value, _ctx| match value.as_str() {
        None | Some("") => Ok(()),
        Some(text) if EMAIL_REGEX.is_match(text) => Ok(()),
        Some(_) => Err("Please enter a valid email address.".to_string()),
    })
}

/// Numeric bounds, inclusive.
pub fn number_range(min: Option<f64>, max: Option<f64>) -> Validator {
    Validator::sync(move |value, _ctx| {
        if value.is_null() {
            return Ok(());
        }
        let Some(number) = value.as_f64() else {
            return Err("Please enter a valid number.".to_string());
        };
        if let Some(max) = max
            && number > max
        {
            return Err(format!("{value} is greater than the max allowed value of {max}."));
        }
        if let Some(min) = min
            && number < min
        {
            return Err(format!("{value} is less than the min allowed value of {min}."));
        }
        Ok(())
    })
}

/// Row count bounds for repeating groups (their value is the row count).
pub fn rows(min: Option<usize>, max: Option<usize>) -> Validator {
    Validator::sync(move |value, _ctx| {
        let count = value.as_u64().unwrap_or_default() as usize;
        if let Some(min) = min
            && count < min
        {
            return Err(format!("This field requires at least {min} row(s)."));
        }
        if let Some(max) = max
            && count > max
        {
            return Err(format!("This field requires no more than {max} row(s)."));
        }
        Ok(())
    })
}

/// Text must match the regular expression `pattern`.
pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Validator, regex::Error> {
    let regex = Regex::new(pattern)?;
    let message = message.into();
    Ok(Validator::sync(move |value, _ctx| match value.as_str() {
        None | Some("") => Ok(()),
        Some(text) if regex.is_match(text) => Ok(()),
        Some(_) => Err(message.clone()),
    }))
}

/// Run validators in order; the first failure wins.
///
/// Stays synchronous unless one of `validators` is asynchronous.
pub fn all(validators: Vec<Validator>) -> Validator {
    if validators.iter().all(|validator| !validator.is_async()) {
        return Validator::sync(move |value, ctx| {
            for validator in &validators {
                if let Validator::Sync(validate) = validator {
                    validate(value, ctx)?;
                }
            }
            Ok(())
        });
    }
    Validator::from_async(move |value: Value, ctx| {
        let validators = validators.clone();
        async move {
            for validator in &validators {
                match validator {
                    Validator::Sync(validate) => validate(&value, &ctx)?,
                    Validator::Async(validate) => validate(value.clone(), ctx.clone()).await?,
                }
            }
            Ok::<(), String>(())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use form_model::{Path, Validity};
    use form_state::ValidationContext;

    use super::*;

    fn context() -> ValidationContext {
        ValidationContext {
            path: Path::new("field").unwrap(),
            field_type: None,
            siblings: BTreeMap::new(),
            data: Arc::new(Value::object()),
        }
    }

    fn check(validator: &Validator, value: impl Into<Value>) -> Validity {
        match validator {
            Validator::Sync(validate) => Validity::from_outcome(validate(&value.into(), &context())),
            Validator::Async(_) => panic!("expected a synchronous validator"),
        }
    }

    #[test]
    fn required_rejects_blank() {
        let validator = required();
        assert!(check(&validator, "  ").is_invalid());
        assert!(check(&validator, Value::Null).is_invalid());
        assert!(check(&validator, "Jane").is_valid());
        assert!(check(&validator, 0i64).is_valid());
    }

    #[test]
    fn text_length_counts_characters() {
        let validator = text_length(Some(2), Some(4));
        assert!(check(&validator, "é").is_invalid());
        assert!(check(&validator, "éèêë").is_valid());
        assert!(check(&validator, "abcde").is_invalid());
        assert!(check(&validator, "").is_valid());
    }

    #[test]
    fn email_shape() {
        let validator = email();
        assert!(check(&validator, "a@").is_invalid());
        assert!(check(&validator, "a@b.com").is_valid());
        assert!(check(&validator, Value::Null).is_valid());
    }

    #[test]
    fn number_range_is_inclusive() {
        let validator = number_range(Some(1.0), Some(10.0));
        assert!(check(&validator, 1i64).is_valid());
        assert!(check(&validator, 10.0).is_valid());
        assert_eq!(
            check(&validator, 11i64).reason(),
            Some("11 is greater than the max allowed value of 10.")
        );
        assert!(check(&validator, "ten").is_invalid());
    }

    #[test]
    fn rows_bounds() {
        let validator = rows(Some(1), Some(2));
        assert!(check(&validator, 0usize).is_invalid());
        assert!(check(&validator, 2usize).is_valid());
        assert!(check(&validator, 3usize).is_invalid());
    }

    #[test]
    fn pattern_and_all_compose() {
        let slug = pattern("^[a-z0-9-]+$", "Use lowercase letters, digits and dashes.").unwrap();
        let validator = all(vec![required(), slug]);
        assert!(!validator.is_async());
        assert!(check(&validator, "").is_invalid());
        assert_eq!(
            check(&validator, "Not A Slug").reason(),
            Some("Use lowercase letters, digits and dashes.")
        );
        assert!(check(&validator, "a-slug").is_valid());
        assert!(pattern("(", "bad").is_err());
    }
}
