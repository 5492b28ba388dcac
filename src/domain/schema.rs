//! Usage: Declarative settings schemas (field kinds, bounds, defaults, conditional visibility).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One settings value on the wire. Untagged so payloads serialize as plain
/// JSON objects (`{"max_connections": 100, "enforce_tls": true}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Whole-resource payload. BTreeMap keeps serialization order stable so
/// "payload equals what was fetched" comparisons are byte-for-byte.
pub type SettingsPayload = BTreeMap<String, FieldValue>;

/// Value type and bounds for one field. Widget bounds and validation bounds
/// both derive from this, so they cannot drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    /// Inclusive bounds.
    Integer { min: i64, max: i64 },
    Enum { allowed: Vec<String> },
    Text { max_len: usize },
    List { max_items: usize, max_item_len: usize },
}

/// Visibility rule: the field is shown (and validated, and submitted) only
/// while `field` currently equals `equals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWhen {
    pub field: String,
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub default: FieldValue,
    pub required: bool,
    pub visible_when: Option<VisibleWhen>,
}

impl FieldSpec {
    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Boolean,
            default: FieldValue::Bool(default),
            required: false,
            visible_when: None,
        }
    }

    pub fn integer(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Integer { min, max },
            default: FieldValue::Int(default),
            required: false,
            visible_when: None,
        }
    }

    pub fn enumeration(name: &str, allowed: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Enum {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
            default: FieldValue::Text(default.to_string()),
            required: false,
            visible_when: None,
        }
    }

    pub fn text(name: &str, max_len: usize, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text { max_len },
            default: FieldValue::Text(default.to_string()),
            required: false,
            visible_when: None,
        }
    }

    pub fn list(name: &str, max_items: usize, max_item_len: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::List {
                max_items,
                max_item_len,
            },
            default: FieldValue::List(Vec::new()),
            required: false,
            visible_when: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn visible_when(mut self, field: &str, equals: &str) -> Self {
        self.visible_when = Some(VisibleWhen {
            field: field.to_string(),
            equals: equals.to_string(),
        });
        self
    }
}

/// Validation schema for one settings resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSchema {
    key: String,
    fields: Vec<FieldSpec>,
}

impl SettingsSchema {
    /// Builds a schema, rejecting specs that could put the engine in an
    /// inconsistent state later:
    /// - duplicate field names
    /// - a conditional field whose parent is missing or not enum-kind,
    ///   or whose trigger value is outside the parent's allowed set
    /// - a conditional field marked required (it could end up hidden and
    ///   required at submit time)
    /// - a default that violates the field's own bounds
    pub fn new(key: &str, fields: Vec<FieldSpec>) -> Result<Self, String> {
        crate::domain::validate::validate_resource_key(key)
            .map_err(|e| format!("schema `{key}`: {e}"))?;

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("schema `{key}`: duplicate field `{}`", field.name));
            }

            if let Some(cond) = &field.visible_when {
                if field.required {
                    return Err(format!(
                        "schema `{key}`: conditional field `{}` must not be required",
                        field.name
                    ));
                }
                let Some(parent) = fields.iter().find(|f| f.name == cond.field) else {
                    return Err(format!(
                        "schema `{key}`: field `{}` depends on unknown field `{}`",
                        field.name, cond.field
                    ));
                };
                match &parent.kind {
                    FieldKind::Enum { allowed } => {
                        if !allowed.contains(&cond.equals) {
                            return Err(format!(
                                "schema `{key}`: field `{}` triggers on `{}`, not allowed for `{}`",
                                field.name, cond.equals, cond.field
                            ));
                        }
                    }
                    _ => {
                        return Err(format!(
                            "schema `{key}`: field `{}` depends on non-enum field `{}`",
                            field.name, cond.field
                        ));
                    }
                }
            }

            if let Err(e) = crate::domain::validate::check_value(field, &field.default) {
                return Err(format!(
                    "schema `{key}`: default for `{}` is invalid: {}",
                    field.name, e.message
                ));
            }
        }

        Ok(Self {
            key: key.to_string(),
            fields,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Payload with every field at its declared default.
    pub fn defaults(&self) -> SettingsPayload {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }

    /// True while `field` is shown given the current payload. Fields with no
    /// visibility rule are always visible; a missing or non-text parent value
    /// hides the dependent field.
    pub fn is_visible(&self, field: &FieldSpec, payload: &SettingsPayload) -> bool {
        match &field.visible_when {
            None => true,
            Some(cond) => payload
                .get(&cond.field)
                .and_then(FieldValue::as_text)
                .is_some_and(|v| v == cond.equals),
        }
    }

    /// Fields visible under the current payload, in declaration order.
    pub fn visible_fields<'a>(
        &'a self,
        payload: &'a SettingsPayload,
    ) -> impl Iterator<Item = &'a FieldSpec> {
        self.fields.iter().filter(|f| self.is_visible(f, payload))
    }

    /// Projection of `payload` onto the currently visible fields. This is the
    /// shape that goes on the wire: hidden fields never leave the client.
    pub fn visible_payload(&self, payload: &SettingsPayload) -> SettingsPayload {
        self.visible_fields(payload)
            .filter_map(|f| {
                payload
                    .get(&f.name)
                    .map(|v| (f.name.clone(), v.clone()))
            })
            .collect()
    }
}
