//! Entity-type schema registry.
//!
//! One generic lifecycle engine serves every master-data domain. The
//! per-domain differences (field list, field kinds, which field drives
//! the as-of-date filter) are data, not code: an `EntitySchema` per
//! entity type, held in a read-only `SchemaRegistry`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tresor_shared::types::{FieldMap, FieldValue};

use crate::workflow::error::WorkflowError;

/// The kind of value a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Numeric value; numeric strings are accepted and compared by value.
    Number,
    /// Calendar date.
    Date,
    /// Boolean flag.
    Flag,
}

impl FieldKind {
    /// Returns true if `value` is acceptable for this kind.
    #[must_use]
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            Self::Text => matches!(value, FieldValue::Text(_)),
            Self::Number => value.as_decimal().is_some(),
            Self::Date => matches!(value, FieldValue::Date(_)),
            Self::Flag => matches!(value, FieldValue::Flag(_)),
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Flag => "flag",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single attribute in an entity schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Attribute name.
    pub name: String,
    /// Accepted value kind.
    pub kind: FieldKind,
    /// Whether the attribute must be present when a record is
    /// submitted for approval.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    /// Creates a field spec.
    #[must_use]
    pub fn new(name: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
        }
    }
}

/// Schema for one master-data entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Domain slug used in API paths (bank, currency, gl-account, ...).
    pub entity_type: String,
    /// Attribute specifications.
    pub fields: Vec<FieldSpec>,
    /// The date attribute the as-of-date listing filter compares against.
    pub date_field: Option<String>,
}

impl EntitySchema {
    /// Creates a schema without an as-of-date field.
    #[must_use]
    pub fn new(entity_type: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            fields,
            date_field: None,
        }
    }

    /// Sets the as-of-date field.
    #[must_use]
    pub fn with_date_field(mut self, field: &str) -> Self {
        self.date_field = Some(field.to_string());
        self
    }

    /// Looks up one attribute spec by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validates that every proposed field is known and of the right kind.
    ///
    /// Run before any mutation; guard violations fail closed.
    pub fn validate_fields(&self, fields: &FieldMap) -> Result<(), WorkflowError> {
        for (name, value) in fields {
            let Some(spec) = self.field(name) else {
                return Err(WorkflowError::UnknownField {
                    entity_type: self.entity_type.clone(),
                    field: name.clone(),
                });
            };
            if !spec.kind.accepts(value) {
                return Err(WorkflowError::FieldKindMismatch {
                    field: name.clone(),
                    expected: spec.kind,
                });
            }
        }
        Ok(())
    }

    /// Validates that every required field is present.
    ///
    /// Applied when a record enters approval, not while it is a draft.
    pub fn validate_required(&self, fields: &FieldMap) -> Result<(), WorkflowError> {
        for spec in self.fields.iter().filter(|f| f.required) {
            if !fields.contains_key(&spec.name) {
                return Err(WorkflowError::MissingRequiredField {
                    field: spec.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Read-only registry of entity schemas, keyed by domain slug.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    /// Builds a registry from a list of schemas.
    #[must_use]
    pub fn new(schemas: Vec<EntitySchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.entity_type.clone(), s))
                .collect(),
        }
    }

    /// Looks up the schema for an entity type.
    pub fn get(&self, entity_type: &str) -> Result<&EntitySchema, WorkflowError> {
        self.schemas
            .get(entity_type)
            .ok_or_else(|| WorkflowError::UnknownEntityType(entity_type.to_string()))
    }

    /// Returns the registered domain slugs, sorted.
    #[must_use]
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.schemas.keys().cloned().collect();
        domains.sort();
        domains
    }

    /// Default schemas for the treasury master-data domains.
    #[must_use]
    pub fn treasury_defaults() -> Self {
        use FieldKind::{Date, Flag, Number, Text};

        Self::new(vec![
            EntitySchema::new(
                "bank",
                vec![
                    FieldSpec::new("name", Text, true),
                    FieldSpec::new("swift_code", Text, true),
                    FieldSpec::new("country", Text, false),
                ],
            ),
            EntitySchema::new(
                "bank-account",
                vec![
                    FieldSpec::new("account_number", Text, true),
                    FieldSpec::new("bank_name", Text, true),
                    FieldSpec::new("currency", Text, true),
                    FieldSpec::new("overdraft_limit", Number, false),
                ],
            ),
            EntitySchema::new(
                "currency",
                vec![
                    FieldSpec::new("code", Text, true),
                    FieldSpec::new("name", Text, true),
                    FieldSpec::new("decimal_places", Number, false),
                ],
            ),
            EntitySchema::new(
                "gl-account",
                vec![
                    FieldSpec::new("code", Text, true),
                    FieldSpec::new("description", Text, true),
                    FieldSpec::new("is_posting_account", Flag, false),
                ],
            ),
            EntitySchema::new(
                "counterparty",
                vec![
                    FieldSpec::new("name", Text, true),
                    FieldSpec::new("category", Text, false),
                    FieldSpec::new("credit_limit", Number, false),
                ],
            ),
            EntitySchema::new(
                "payable-receivable",
                vec![
                    FieldSpec::new("name", Text, true),
                    FieldSpec::new("direction", Text, true),
                    FieldSpec::new("gl_code", Text, false),
                ],
            ),
            EntitySchema::new(
                "fund-plan",
                vec![
                    FieldSpec::new("name", Text, true),
                    FieldSpec::new("plan_date", Date, true),
                    FieldSpec::new("amount", Number, true),
                    FieldSpec::new("currency", Text, true),
                ],
            )
            .with_date_field("plan_date"),
            EntitySchema::new(
                "fx-exposure",
                vec![
                    FieldSpec::new("reference", Text, true),
                    FieldSpec::new("exposure_date", Date, true),
                    FieldSpec::new("amount", Number, true),
                    FieldSpec::new("currency", Text, true),
                    FieldSpec::new("hedged", Flag, false),
                ],
            )
            .with_date_field("exposure_date"),
        ])
    }
}
