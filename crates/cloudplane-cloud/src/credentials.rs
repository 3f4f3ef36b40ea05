//! Provider configuration and credential validation
//!
//! Credentials are schema-checked before any network call: the schema comes
//! from the provider's credential struct (via schemars), and violations are
//! collected per-field rather than stopping at the first one.

use crate::error::{CloudError, Result};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One provider account as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type ("digitalocean", "postgres", ...)
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Account name, unique within a run
    pub name: String,

    /// Raw credential bag, validated against the provider type's schema
    pub credentials: serde_json::Value,
}

/// Validate a raw credential bag against `T`'s schema and deserialize it.
///
/// Checks every `required` field and rejects unknown fields (the schema is
/// closed), accumulating all violations into one `CredentialsInvalid`
/// before attempting strict deserialization.
pub fn validate_credentials<T>(provider_type: &str, raw: &serde_json::Value) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = serde_json::to_value(schemars::schema_for!(T))?;
    let mut violations = Vec::new();

    let Some(object) = raw.as_object() else {
        return Err(CloudError::CredentialsInvalid {
            provider_type: provider_type.to_string(),
            violations: vec!["credentials must be an object".to_string()],
        });
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !object.contains_key(field) {
                violations.push(format!("{field}: required field is missing"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        for key in object.keys() {
            if !properties.contains_key(key) {
                violations.push(format!("{key}: unknown field"));
            }
        }
    }

    if !violations.is_empty() {
        return Err(CloudError::CredentialsInvalid {
            provider_type: provider_type.to_string(),
            violations,
        });
    }

    serde_json::from_value(raw.clone()).map_err(|e| CloudError::CredentialsInvalid {
        provider_type: provider_type.to_string(),
        violations: vec![e.to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct TestCredentials {
        token: String,
        #[serde(default)]
        #[allow(dead_code)]
        region: Option<String>,
    }

    #[test]
    fn valid_credentials_deserialize() {
        let creds: TestCredentials =
            validate_credentials("test", &json!({"token": "abc", "region": "nyc3"})).unwrap();
        assert_eq!(creds.token, "abc");
    }

    #[test]
    fn violations_accumulate_per_field() {
        let err = validate_credentials::<TestCredentials>(
            "test",
            &json!({"zone": "x", "color": "blue"}),
        )
        .unwrap_err();

        let CloudError::CredentialsInvalid { violations, .. } = err else {
            panic!("expected CredentialsInvalid");
        };
        // missing token + two unknown fields
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn non_object_credentials_rejected() {
        let err = validate_credentials::<TestCredentials>("test", &json!("a-string")).unwrap_err();
        assert!(matches!(err, CloudError::CredentialsInvalid { .. }));
    }
}
