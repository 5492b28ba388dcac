//! Usage: Pure validation for resource keys, single fields, and whole payloads. No I/O.

use crate::domain::schema::{FieldKind, FieldSpec, FieldValue, SettingsPayload, SettingsSchema};
use crate::error::FieldViolation;

const MAX_RESOURCE_KEY_LEN: usize = 64;

/// Resource keys are short identifiers like `security` or `connection`:
/// leading alphanumeric, then alphanumerics, `_` or `-`.
pub fn validate_resource_key(key: &str) -> Result<(), String> {
    let key = key.trim();
    if key.is_empty() {
        return Err("resource key is required".to_string());
    }
    if key.len() > MAX_RESOURCE_KEY_LEN {
        return Err(format!(
            "resource key too long (max {MAX_RESOURCE_KEY_LEN})"
        ));
    }

    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return Err("resource key is required".to_string());
    };
    if !first.is_ascii_alphanumeric() {
        return Err("resource key must start with [A-Za-z0-9]".to_string());
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err("resource key allows only [A-Za-z0-9_-]".to_string());
        }
    }

    Ok(())
}

/// Checks one value against one field spec. Bounds are inclusive; enum values
/// must be members of the allowed set; text and list lengths are capped.
pub fn check_value(spec: &FieldSpec, value: &FieldValue) -> Result<(), FieldViolation> {
    let mismatch = |expected: &str| {
        FieldViolation::new(
            &spec.name,
            format!("expected {expected}, got {}", value.kind_name()),
        )
    };

    match (&spec.kind, value) {
        (FieldKind::Boolean, FieldValue::Bool(_)) => Ok(()),
        (FieldKind::Boolean, _) => Err(mismatch("boolean")),

        (FieldKind::Integer { min, max }, FieldValue::Int(n)) => {
            if n < min || n > max {
                Err(FieldViolation::new(
                    &spec.name,
                    format!("must be between {min} and {max}, got {n}"),
                ))
            } else {
                Ok(())
            }
        }
        (FieldKind::Integer { .. }, _) => Err(mismatch("integer")),

        (FieldKind::Enum { allowed }, FieldValue::Text(s)) => {
            if allowed.iter().any(|a| a == s) {
                Ok(())
            } else {
                Err(FieldViolation::new(
                    &spec.name,
                    format!("`{s}` is not one of [{}]", allowed.join(", ")),
                ))
            }
        }
        (FieldKind::Enum { .. }, _) => Err(mismatch("text")),

        (FieldKind::Text { max_len }, FieldValue::Text(s)) => {
            if s.chars().count() > *max_len {
                Err(FieldViolation::new(
                    &spec.name,
                    format!("too long (max {max_len} characters)"),
                ))
            } else {
                Ok(())
            }
        }
        (FieldKind::Text { .. }, _) => Err(mismatch("text")),

        (
            FieldKind::List {
                max_items,
                max_item_len,
            },
            FieldValue::List(items),
        ) => {
            if items.len() > *max_items {
                return Err(FieldViolation::new(
                    &spec.name,
                    format!("too many entries (max {max_items})"),
                ));
            }
            for item in items {
                if item.chars().count() > *max_item_len {
                    return Err(FieldViolation::new(
                        &spec.name,
                        format!("entry `{item}` too long (max {max_item_len} characters)"),
                    ));
                }
            }
            Ok(())
        }
        (FieldKind::List { .. }, _) => Err(mismatch("list")),
    }
}

fn is_empty_value(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => s.trim().is_empty(),
        FieldValue::List(items) => items.is_empty(),
        FieldValue::Bool(_) | FieldValue::Int(_) => false,
    }
}

/// Full-payload validation over the currently visible fields. Hidden fields
/// are skipped entirely; unknown keys are rejected so typos cannot silently
/// travel to the server. Collects every violation instead of stopping at the
/// first one.
pub fn validate_payload(schema: &SettingsSchema, payload: &SettingsPayload) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for spec in schema.visible_fields(payload) {
        match payload.get(&spec.name) {
            None => violations.push(FieldViolation::new(&spec.name, "missing value")),
            Some(value) => {
                if let Err(v) = check_value(spec, value) {
                    violations.push(v);
                } else if spec.required && is_empty_value(value) {
                    violations.push(FieldViolation::new(&spec.name, "value is required"));
                }
            }
        }
    }

    for key in payload.keys() {
        if schema.field(key).is_none() {
            violations.push(FieldViolation::new(key, "unknown field"));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldSpec;

    fn schema() -> SettingsSchema {
        SettingsSchema::new(
            "connection",
            vec![
                FieldSpec::integer("max_connections", 1, 1000, 100),
                FieldSpec::integer("retry_delay_seconds", 1, 3600, 5),
                FieldSpec::enumeration(
                    "load_balancing",
                    &["round_robin", "least_connections", "random"],
                    "round_robin",
                ),
                FieldSpec::text("pool_label", 32, "").required(),
                FieldSpec::list("allowed_hosts", 16, 255),
            ],
        )
        .expect("schema")
    }

    #[test]
    fn validate_resource_key_accepts_catalog_style_keys() {
        for key in ["security", "connection", "email-smtp", "sys_health2"] {
            assert!(validate_resource_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn validate_resource_key_rejects_bad_syntax() {
        assert!(validate_resource_key("").is_err());
        assert!(validate_resource_key("-security").is_err());
        assert!(validate_resource_key("se curity").is_err());
        assert!(validate_resource_key(&"k".repeat(65)).is_err());
    }

    #[test]
    fn check_value_enforces_inclusive_integer_bounds() {
        let schema = schema();
        let spec = schema.field("max_connections").expect("spec");
        assert!(check_value(spec, &FieldValue::Int(1)).is_ok());
        assert!(check_value(spec, &FieldValue::Int(1000)).is_ok());
        assert!(check_value(spec, &FieldValue::Int(0)).is_err());
        assert!(check_value(spec, &FieldValue::Int(1001)).is_err());
    }

    #[test]
    fn check_value_rejects_kind_mismatch() {
        let schema = schema();
        let spec = schema.field("max_connections").expect("spec");
        let err = check_value(spec, &FieldValue::Bool(true)).unwrap_err();
        assert_eq!(err.field, "max_connections");
        assert!(err.message.contains("expected integer"), "{}", err.message);
    }

    #[test]
    fn check_value_enforces_enum_membership() {
        let schema = schema();
        let spec = schema.field("load_balancing").expect("spec");
        assert!(check_value(spec, &FieldValue::Text("random".to_string())).is_ok());
        assert!(check_value(spec, &FieldValue::Text("sticky".to_string())).is_err());
    }

    #[test]
    fn validate_payload_collects_every_violation() {
        let schema = schema();
        let mut payload = schema.defaults();
        payload.insert("max_connections".to_string(), FieldValue::Int(0));
        payload.insert(
            "load_balancing".to_string(),
            FieldValue::Text("sticky".to_string()),
        );
        // pool_label stays at its empty default, which violates required.

        let violations = validate_payload(&schema, &payload);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["max_connections", "load_balancing", "pool_label"]
        );
    }

    #[test]
    fn validate_payload_rejects_unknown_fields() {
        let schema = schema();
        let mut payload = schema.defaults();
        payload.insert("pool_label".to_string(), FieldValue::Text("main".to_string()));
        payload.insert("max_conections".to_string(), FieldValue::Int(10));

        let violations = validate_payload(&schema, &payload);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "max_conections");
        assert_eq!(violations[0].message, "unknown field");
    }

    #[test]
    fn validate_payload_skips_hidden_fields() {
        let schema = SettingsSchema::new(
            "storage",
            vec![
                FieldSpec::enumeration("provider", &["s3", "sharepoint", "local"], "local"),
                FieldSpec::text("tenant_id", 8, "").visible_when("provider", "sharepoint"),
            ],
        )
        .expect("schema");

        let mut payload = schema.defaults();
        // Over the max length, but hidden while provider != sharepoint.
        payload.insert(
            "tenant_id".to_string(),
            FieldValue::Text("way-too-long-tenant".to_string()),
        );
        assert!(validate_payload(&schema, &payload).is_empty());

        payload.insert(
            "provider".to_string(),
            FieldValue::Text("sharepoint".to_string()),
        );
        let violations = validate_payload(&schema, &payload);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "tenant_id");
    }
}
