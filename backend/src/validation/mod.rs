//! JSON Schema validation for processing profiles.
//!
//! Profiles are user-edited JSON. They are checked against an embedded
//! draft 7 schema before deserialization, so unknown sections and out-of-range
//! values are reported together instead of one serde error at a time.
//!
//! # Embedded Schema
//!
//! `schemas/profile.schema.json`, embedded at compile time.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use catalog::validation::validate_profile;
//!
//! assert!(validate_profile(&json!({ "padding": { "groupSize": 8 } })).is_ok());
//! assert!(validate_profile(&json!({ "padding": { "groupSize": 0 } })).is_err());
//! ```

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::Value;

const PROFILE_SCHEMA: &str = include_str!("../../schemas/profile.schema.json");

/// Profile validator, compiled on first use.
static PROFILE_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(PROFILE_SCHEMA)
        .map_err(|e| format!("Invalid embedded schema: {}", e))?;
    jsonschema::draft7::new(&schema).map_err(|e| format!("Invalid schema: {}", e))
});

/// Validate against the embedded profile schema.
pub fn validate_profile(data: &Value) -> Result<(), Vec<String>> {
    let validator = PROFILE_VALIDATOR.as_ref().map_err(|e| vec![e.clone()])?;
    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check against the profile schema.
pub fn is_valid_profile(data: &Value) -> bool {
    validate_profile(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_profile_valid() {
        assert!(is_valid_profile(&json!({})));
    }

    #[test]
    fn test_default_profile_valid() {
        let profile = serde_json::to_value(crate::config::Profile::default()).unwrap();
        assert!(validate_profile(&profile).is_ok());
    }

    #[test]
    fn test_price_pair_requires_both_columns() {
        let profile = json!({ "pricing": { "interior": { "default": "l2 5" } } });
        assert!(!is_valid_profile(&profile));
    }

    #[test]
    fn test_all_violations_reported() {
        let profile = json!({
            "source": { "headerRow": -1 },
            "padding": { "groupSize": 0 }
        });
        let errors = validate_profile(&profile).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_padding_key_rejected() {
        assert!(!is_valid_profile(&json!({ "padding": { "blankColumns": ["Marca"] } })));
    }

    #[test]
    fn test_header_color_pattern() {
        assert!(is_valid_profile(&json!({ "export": { "headerColor": "366092" } })));
        assert!(!is_valid_profile(&json!({ "export": { "headerColor": "#366092" } })));
    }
}
