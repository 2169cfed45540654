use crate::{
    schema::{EntitySchema, SchemaError},
    traits::Record,
    value::Value,
};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

///
/// CompositeKey
///
/// An entity's identity: its key components in primary-key declaration
/// order. Rendering is deterministic — a single component renders as the
/// bare stringified value, multiple components render as `col=val;`
/// pairs — and two keys denote the same identity iff their renderings
/// are equal.
///

#[derive(Clone, Debug)]
pub struct CompositeKey {
    parts: Vec<(String, Value)>,
}

impl CompositeKey {
    /// Read the key components off a record, in declaration order.
    pub fn of(record: &dyn Record, schema: &EntitySchema) -> Result<Self, SchemaError> {
        let mut parts = Vec::new();
        for field in schema.key_fields() {
            let value = record
                .get(&field.name)
                .ok_or_else(|| SchemaError::UnknownField {
                    entity: schema.entity.clone(),
                    field: field.name.clone(),
                })?;
            parts.push((field.column.clone(), value));
        }

        Ok(Self { parts })
    }

    pub(crate) const fn from_parts(parts: Vec<(String, Value)>) -> Self {
        Self { parts }
    }

    /// True when every component is its zero value — the entity has not
    /// been persisted yet.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|(_, value)| value.is_zero())
    }

    /// The deterministic identity string.
    #[must_use]
    pub fn render(&self) -> String {
        match self.parts.as_slice() {
            [(_, value)] => value.to_string(),
            parts => {
                let mut out = String::new();
                for (column, value) in parts {
                    out.push_str(column);
                    out.push('=');
                    out.push_str(&value.to_string());
                    out.push(';');
                }
                out
            }
        }
    }

    /// The value bound for foreign-key parameters referencing this key:
    /// the raw component for single-column keys, the rendered identity
    /// string otherwise.
    #[must_use]
    pub fn fk_value(&self) -> Value {
        match self.parts.as_slice() {
            [(_, value)] => value.clone(),
            _ => Value::Text(self.render()),
        }
    }

    pub(crate) fn parts(&self) -> &[(String, Value)] {
        &self.parts
    }
}

/// Shorthand used by the cascade paths.
pub(crate) fn is_new(record: &dyn Record, schema: &EntitySchema) -> Result<bool, SchemaError> {
    Ok(CompositeKey::of(record, schema)?.is_zero())
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl PartialEq for CompositeKey {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}

impl Eq for CompositeKey {}

impl Hash for CompositeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.render().hash(state);
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
