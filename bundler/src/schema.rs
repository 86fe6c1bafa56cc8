//! # Schema Flattener
//!
//! Converts the JSON-Schema-like object descriptions stored with templates
//! into `OpenID4VCI` claim descriptors.
//!
//! Properties are visited depth-first in declaration order, and the output
//! preserves that order:
//!
//! - primitive properties yield one descriptor,
//! - nested objects extend the path and are not described themselves,
//! - arrays of objects extend the path with a `null` wildcard,
//! - arrays of primitives yield one descriptor for the whole array,
//! - arrays of arrays are not supported and are skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;
use crate::error::invalid;
use crate::types::{ClaimDescriptor, ClaimDisplay};

/// A JSON-Schema-like description of an object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ObjectSchema {
    /// Always `object`.
    #[serde(rename = "type", default)]
    pub type_: ObjectType,

    /// Human readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Property schemas, in declaration order.
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Names of the properties that must be present.
    #[serde(default)]
    pub required: Vec<String>,
}

/// The JSON Schema `object` type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// `object`
    #[default]
    Object,
}

impl ObjectSchema {
    /// Interpret a stored template schema as an object schema.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error if the value does not describe
    /// an object.
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| invalid!("invalid object schema: {e}"))
    }

    /// Property names, in declaration order.
    #[must_use]
    pub fn property_keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    /// Convert the schema to claim descriptors, rooted at `base_path`.
    #[must_use]
    pub fn to_claims(&self, locale: &str, base_path: &[Option<String>]) -> Vec<ClaimDescriptor> {
        let mut claims = vec![];
        let required = self.required.iter().map(String::as_str).collect::<Vec<_>>();
        walk(&self.properties, &required, base_path, locale, &mut claims);
        claims
    }
}

/// Convert a schema to claim descriptors. See [`ObjectSchema::to_claims`].
#[must_use]
pub fn flatten(
    schema: &ObjectSchema, locale: &str, base_path: &[Option<String>],
) -> Vec<ClaimDescriptor> {
    schema.to_claims(locale, base_path)
}

/// Union a list of object schemas. Properties of later schemas replace
/// earlier properties with the same name (keeping the original position);
/// `required` lists are concatenated.
#[must_use]
pub fn merge_schemas(schemas: &[ObjectSchema]) -> ObjectSchema {
    schemas.iter().fold(ObjectSchema::default(), |mut merged, schema| {
        for (key, value) in &schema.properties {
            merged.properties.insert(key.clone(), value.clone());
        }
        merged.required.extend(schema.required.iter().cloned());
        merged
    })
}

/// Pair every descriptor with its dotted path, for display.
#[must_use]
pub fn flatten_descriptors(claims: &[ClaimDescriptor]) -> Vec<(String, ClaimDescriptor)> {
    claims.iter().map(|claim| (claim.dotted_path(), claim.clone())).collect()
}

/// A comma-separated list of the claim paths described by each schema.
/// Values that are not object schemas contribute nothing.
#[must_use]
pub fn template_property_list(schemas: &[Option<Value>], locale: &str) -> String {
    schemas
        .iter()
        .flatten()
        .filter_map(|value| ObjectSchema::from_value(value).ok())
        .flat_map(|schema| flatten_descriptors(&schema.to_claims(locale, &[])))
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(", ")
}

// The structural role of a property schema.
enum Shape<'a> {
    Object { properties: Option<&'a Map<String, Value>>, required: Vec<&'a str> },
    Array(&'a Value),
    Primitive,
}

impl<'a> Shape<'a> {
    fn of(schema: &'a Value) -> Self {
        match schema.get("type").and_then(Value::as_str) {
            Some("object") => Self::Object {
                properties: schema.get("properties").and_then(Value::as_object),
                required: schema
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|r| r.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default(),
            },
            Some("array") => schema.get("items").map_or(Self::Primitive, Self::Array),
            _ => Self::Primitive,
        }
    }
}

fn walk(
    properties: &Map<String, Value>, required: &[&str], base_path: &[Option<String>],
    locale: &str, claims: &mut Vec<ClaimDescriptor>,
) {
    for (key, schema) in properties {
        let mut path = base_path.to_vec();
        path.push(Some(key.clone()));

        match Shape::of(schema) {
            Shape::Object { properties, required } => {
                if let Some(properties) = properties {
                    walk(properties, &required, &path, locale, claims);
                }
            }
            Shape::Array(items) => match Shape::of(items) {
                Shape::Object { properties, required } => {
                    path.push(None);
                    if let Some(properties) = properties {
                        walk(properties, &required, &path, locale, claims);
                    }
                }
                Shape::Array(_) => {
                    tracing::warn!("unsupported schema shape (array of arrays) at {key}: {items}");
                }
                Shape::Primitive => claims.push(descriptor(key, schema, required, path, locale)),
            },
            Shape::Primitive => claims.push(descriptor(key, schema, required, path, locale)),
        }
    }
}

fn descriptor(
    key: &str, schema: &Value, required: &[&str], path: Vec<Option<String>>, locale: &str,
) -> ClaimDescriptor {
    let name = schema.get("title").and_then(Value::as_str).unwrap_or(key);
    ClaimDescriptor {
        mandatory: required.contains(&key),
        display: vec![ClaimDisplay {
            locale: locale.to_string(),
            name: name.to_string(),
        }],
        path,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema(value: Value) -> ObjectSchema {
        ObjectSchema::from_value(&value).expect("should be an object schema")
    }

    fn paths(claims: &[ClaimDescriptor]) -> Vec<String> {
        claims.iter().map(ClaimDescriptor::dotted_path).collect()
    }

    #[test]
    fn primitive_leaves() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "given_name": {"type": "string", "title": "Given name"},
                "family_name": {"type": "string"},
                "age": {"type": "integer"}
            },
            "required": ["family_name"]
        }));

        let claims = flatten(&schema, "en-US", &[]);
        assert_eq!(
            serde_json::to_value(&claims).expect("should serialize"),
            json!([
                {"mandatory": false, "display": [{"locale": "en-US", "name": "Given name"}], "path": ["given_name"]},
                {"mandatory": true, "display": [{"locale": "en-US", "name": "family_name"}], "path": ["family_name"]},
                {"mandatory": false, "display": [{"locale": "en-US", "name": "age"}], "path": ["age"]}
            ])
        );
    }

    // Should recurse into nested objects and arrays of objects, keeping
    // declaration order depth-first.
    #[test]
    fn nested_shapes() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {
                        "street": {"type": "string"},
                        "city": {"type": "string"}
                    },
                    "required": ["city"]
                },
                "degrees": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}}
                    }
                },
                "nicknames": {"type": "array", "items": {"type": "string"}},
                "email": {"type": "string"}
            }
        }));

        let claims = flatten(&schema, "en-US", &[]);
        assert_eq!(
            paths(&claims),
            vec!["address.street", "address.city", "degrees.null.name", "nicknames", "email"]
        );
        assert!(claims[1].mandatory);
        assert_eq!(claims[2].path, vec![Some("degrees".into()), None, Some("name".into())]);

        // deterministic
        assert_eq!(claims, flatten(&schema, "en-US", &[]));
    }

    #[test]
    fn array_of_arrays_skipped() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "first": {"type": "string"},
                "matrix": {"type": "array", "items": {"type": "array", "items": {"type": "number"}}},
                "last": {"type": "boolean"}
            }
        }));

        assert_eq!(paths(&flatten(&schema, "en-US", &[])), vec!["first", "last"]);
    }

    #[test]
    fn base_path() {
        let schema = schema(json!({"type": "object", "properties": {"id": {"type": "string"}}}));
        let base = vec![Some("credentialSubject".to_string())];
        assert_eq!(paths(&flatten(&schema, "it", &base)), vec!["credentialSubject.id"]);
    }

    #[test]
    fn merge() {
        let first = schema(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
            "required": ["a"]
        }));
        let second = schema(json!({
            "type": "object",
            "properties": {"b": {"type": "number"}, "c": {"type": "string"}},
            "required": ["c"]
        }));

        let merged = merge_schemas(&[first, second]);
        assert_eq!(merged.property_keys(), vec!["a", "b", "c"]);
        assert_eq!(merged.properties["b"], json!({"type": "number"}));
        assert_eq!(merged.required, vec!["a", "c"]);
    }

    #[test]
    fn not_an_object() {
        let err = ObjectSchema::from_value(&json!({"type": "string"})).expect_err("should fail");
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }

    #[test]
    fn property_list() {
        let schemas = vec![
            Some(json!({"type": "object", "properties": {"a": {"type": "string"}}})),
            None,
            Some(json!("not a schema")),
            Some(json!({"type": "object", "properties": {"b": {"type": "object", "properties": {"c": {"type": "string"}}}}})),
        ];
        assert_eq!(template_property_list(&schemas, "en-US"), "a, b.c");
    }
}
