//! Descriptor validation against the kind schemas

use crate::descriptor::{InputValue, ResourceDescriptor};
use crate::error::{CoreError, Result, Violation};
use crate::schema::FieldType;

/// Validate a descriptor's inputs against its kind's input schema.
///
/// Violations accumulate: missing required fields, unknown fields, and type
/// mismatches are all reported in one `SchemaViolation` rather than
/// short-circuiting on the first problem.
pub fn validate(descriptor: &ResourceDescriptor) -> Result<()> {
    let schema = descriptor.kind.input_schema();
    let mut violations = Vec::new();

    for field in schema.required_fields() {
        if !descriptor.inputs.contains_key(field.name) {
            violations.push(Violation {
                field: field.name.to_string(),
                message: "required field is missing".to_string(),
            });
        }
    }

    for (key, value) in &descriptor.inputs {
        let Some(field) = schema.field(key) else {
            violations.push(Violation {
                field: key.clone(),
                message: format!("unknown field for kind {}", descriptor.kind),
            });
            continue;
        };

        // References resolve at apply time; their type is checked against
        // the dependency's output schema by the graph, not here.
        let InputValue::Literal(literal) = value else {
            continue;
        };

        if let Some(message) = type_mismatch(field.field_type, literal) {
            violations.push(Violation {
                field: key.clone(),
                message,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::SchemaViolation {
            kind: descriptor.kind.to_string(),
            name: descriptor.name.clone(),
            violations,
        })
    }
}

fn type_mismatch(expected: FieldType, value: &serde_json::Value) -> Option<String> {
    let ok = match expected {
        FieldType::String | FieldType::Secret => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Boolean => value.is_boolean(),
    };

    if ok {
        None
    } else {
        Some(format!("expected {expected}, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use serde_json::json;

    #[test]
    fn valid_descriptor_passes() {
        let descriptor = ResourceDescriptor::new(ResourceKind::Vpc, "net", "acct")
            .with_input("name", json!("net"))
            .with_input("region", json!("nyc3"));
        assert!(validate(&descriptor).is_ok());
    }

    #[test]
    fn violations_accumulate() {
        // Missing both required fields, one unknown field, one type error.
        let descriptor = ResourceDescriptor::new(ResourceKind::Vpc, "net", "acct")
            .with_input("description", json!(42))
            .with_input("cidr", json!("10.0.0.0/16"));

        let err = validate(&descriptor).unwrap_err();
        let CoreError::SchemaViolation { violations, .. } = err else {
            panic!("expected SchemaViolation");
        };

        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"region"));
        assert!(fields.contains(&"cidr"));
        assert!(fields.contains(&"description"));
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn references_skip_type_checking() {
        let descriptor = ResourceDescriptor::new(ResourceKind::DatabaseUser, "u", "acct")
            .with_input("username", json!("api"))
            .with_reference("database", "my-db", "id")
            .with_reference("port", "my-db", "port");
        assert!(validate(&descriptor).is_ok());
    }

    #[test]
    fn integer_field_rejects_string() {
        let descriptor = ResourceDescriptor::new(ResourceKind::Cluster, "k8s", "acct")
            .with_input("name", json!("k8s"))
            .with_input("region", json!("nyc3"))
            .with_input("kubernetesVersion", json!("1.27"))
            .with_input("nodeCount", json!("three"));

        let err = validate(&descriptor).unwrap_err();
        let CoreError::SchemaViolation { violations, .. } = err else {
            panic!("expected SchemaViolation");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "nodeCount");
    }
}
