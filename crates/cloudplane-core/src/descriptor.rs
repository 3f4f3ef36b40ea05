//! Desired-state descriptors and reference expressions

use crate::error::{CoreError, Result};
use crate::kind::ResourceKind;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A pointer from one descriptor's input to another descriptor's output.
///
/// Written as `${{ resource.output }}` in desired-state documents. Every
/// reference becomes an edge in the execution graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Name of the descriptor whose output is referenced
    pub resource: String,

    /// Output key on that descriptor
    pub output: String,
}

impl Reference {
    /// Parse an expression like `${{ my-db.host }}`.
    ///
    /// Returns `None` when the string is not an expression at all; an
    /// expression with a malformed body is an error.
    pub fn parse(expr: &str) -> Result<Option<Reference>> {
        let trimmed = expr.trim();
        let Some(body) = trimmed
            .strip_prefix("${{")
            .and_then(|s| s.strip_suffix("}}"))
        else {
            return Ok(None);
        };

        let body = body.trim();
        let Some((resource, output)) = body.split_once('.') else {
            return Err(CoreError::InvalidReference(expr.to_string()));
        };
        if resource.is_empty() || output.is_empty() || output.contains(char::is_whitespace) {
            return Err(CoreError::InvalidReference(expr.to_string()));
        }

        Ok(Some(Reference {
            resource: resource.to_string(),
            output: output.to_string(),
        }))
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${{{{ {}.{} }}}}", self.resource, self.output)
    }
}

/// An input value: either a literal or a reference to another descriptor's
/// output.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Literal(serde_json::Value),
    Ref(Reference),
}

impl InputValue {
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            InputValue::Ref(r) => Some(r),
            InputValue::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            InputValue::Literal(v) => Some(v),
            InputValue::Ref(_) => None,
        }
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InputValue::Literal(v) => v.serialize(serializer),
            InputValue::Ref(r) => serializer.serialize_str(&r.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if let serde_json::Value::String(s) = &value {
            match Reference::parse(s) {
                Ok(Some(reference)) => return Ok(InputValue::Ref(reference)),
                Ok(None) => {}
                Err(e) => return Err(D::Error::custom(e.to_string())),
            }
        }
        Ok(InputValue::Literal(value))
    }
}

/// One desired instance of a resource kind.
///
/// Immutable once parsed; consumed by the execution pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "type")]
    pub kind: ResourceKind,

    pub name: String,

    /// Provider account this descriptor is bound to
    pub account: String,

    /// Adopt a pre-existing live resource with this id instead of creating
    /// a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            account: account.into(),
            external_id: None,
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(key.into(), InputValue::Literal(value));
        self
    }

    pub fn with_reference(
        mut self,
        key: impl Into<String>,
        resource: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.inputs.insert(
            key.into(),
            InputValue::Ref(Reference {
                resource: resource.into(),
                output: output.into(),
            }),
        );
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    /// Stable identity: `kind/name`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Every reference found in any input value.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.inputs.values().filter_map(|v| v.as_reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference_expression() {
        let r = Reference::parse("${{ my-db.host }}").unwrap().unwrap();
        assert_eq!(r.resource, "my-db");
        assert_eq!(r.output, "host");
    }

    #[test]
    fn plain_string_is_not_a_reference() {
        assert!(Reference::parse("just a value").unwrap().is_none());
    }

    #[test]
    fn malformed_expression_is_rejected() {
        assert!(Reference::parse("${{ nodots }}").is_err());
        assert!(Reference::parse("${{ .missing }}").is_err());
    }

    #[test]
    fn reference_display_round_trips() {
        let r = Reference {
            resource: "db".to_string(),
            output: "port".to_string(),
        };
        assert_eq!(Reference::parse(&r.to_string()).unwrap().unwrap(), r);
    }

    #[test]
    fn descriptor_deserializes_refs_from_yaml() {
        let yaml = r#"
type: databaseUser
name: api-user
account: do-prod
inputs:
  username: api
  database: ${{ my-db.id }}
"#;
        let descriptor: ResourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.kind, ResourceKind::DatabaseUser);
        let refs: Vec<_> = descriptor.references().collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].resource, "my-db");
        assert_eq!(refs[0].output, "id");
    }

    #[test]
    fn descriptor_serializes_refs_as_expressions() {
        let descriptor = ResourceDescriptor::new(ResourceKind::DatabaseUser, "u", "acct")
            .with_reference("database", "my-db", "id");
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["inputs"]["database"], "${{ my-db.id }}");
    }
}
