use crate::{
    driver::{Row, RowStream},
    error::Error,
    executor::ExecuteError,
    schema::{CompositeKey, EntitySchema, RelationKind, RelationSchema, SchemaError, SchemaRegistry},
    traits::{Entity, Record},
    value::Value,
};
use futures::StreamExt;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

///
/// Rehydrator
///
/// Folds one flat joined row stream back into typed entity graphs. The
/// stream interleaves the root's columns with each included relation's
/// columns in include order; every segment opens with a constant marker
/// cell, so cells are addressed positionally — joined tables routinely
/// repeat column names.
///
/// Single pass, insertion-ordered: a row whose root key has been seen
/// folds its relation segments into the existing root instead of
/// materializing a duplicate.
///

pub(crate) struct Rehydrator<'a> {
    registry: &'a SchemaRegistry,
}

struct RelationSegment<'a> {
    relation: &'a RelationSchema,
    target: Arc<EntitySchema>,
    /// Position of the segment's first field cell, past its marker.
    offset: usize,
}

impl<'a> Rehydrator<'a> {
    pub(crate) const fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub(crate) async fn collect<E: Entity>(
        &self,
        schema: &EntitySchema,
        includes: &[String],
        mut rows: RowStream,
    ) -> Result<Vec<E>, Error> {
        let mut segments = Vec::with_capacity(includes.len());
        let mut offset = 1 + schema.fields.len();
        for name in includes {
            let relation = schema
                .relation(name)
                .ok_or_else(|| SchemaError::UnknownRelation {
                    entity: schema.entity.clone(),
                    relation: name.clone(),
                })?;
            let target = self.registry.target_schema(&relation.target)?;
            let fields = target.fields.len();
            segments.push(RelationSegment {
                relation,
                target,
                offset: offset + 1,
            });
            offset += 1 + fields;
        }

        let mut roots: Vec<E> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        // Fan-out bookkeeping per materialized root: which ToOne targets
        // are already set, which ToMany child keys already attached.
        let mut to_one_set: HashSet<(usize, String)> = HashSet::new();
        let mut seen_children: HashMap<(usize, String), HashSet<String>> = HashMap::new();

        while let Some(row) = rows.next().await {
            let row = row?;

            let values = read_segment(&row, 1, schema)?;
            let key = segment_key(schema, &values).render();
            let root = match index.get(&key) {
                Some(i) => *i,
                None => {
                    let mut entity = E::default();
                    apply_fields(&mut entity, schema, values)?;
                    roots.push(entity);
                    index.insert(key, roots.len() - 1);
                    roots.len() - 1
                }
            };

            for segment in &segments {
                let values = read_segment(&row, segment.offset, &segment.target)?;
                // An all-NULL segment is a LEFT JOIN miss; nothing to attach.
                if values.iter().all(Value::is_null) {
                    continue;
                }

                let slot = (root, segment.relation.name.clone());
                match segment.relation.kind {
                    RelationKind::ToOne => {
                        // First row wins; later rows repeat the same target.
                        if !to_one_set.insert(slot) {
                            continue;
                        }
                    }
                    RelationKind::ToMany => {
                        let child_key = segment_key(&segment.target, &values).render();
                        if !seen_children.entry(slot).or_default().insert(child_key) {
                            continue;
                        }
                    }
                }

                let mut child = (segment.relation.target.instantiate)();
                apply_fields(child.as_mut(), &segment.target, values)?;
                roots[root].attach(&segment.relation.name, child)?;
            }
        }

        Ok(roots)
    }
}

/// Segment cells in field declaration order, starting at `offset`.
fn read_segment(row: &Row, offset: usize, schema: &EntitySchema) -> Result<Vec<Value>, Error> {
    let mut values = Vec::with_capacity(schema.fields.len());
    for (i, field) in schema.fields.iter().enumerate() {
        let value = row
            .at(offset + i)
            .ok_or_else(|| ExecuteError::MissingCell {
                entity: schema.entity.clone(),
                column: field.column.clone(),
            })?;
        values.push(value.clone());
    }

    Ok(values)
}

fn segment_key(schema: &EntitySchema, values: &[Value]) -> CompositeKey {
    let parts = schema
        .fields
        .iter()
        .zip(values)
        .filter(|(field, _)| field.key)
        .map(|(field, value)| (field.column.clone(), value.clone()))
        .collect();

    CompositeKey::from_parts(parts)
}

fn apply_fields(
    record: &mut dyn Record,
    schema: &EntitySchema,
    values: Vec<Value>,
) -> Result<(), SchemaError> {
    for (field, value) in schema.fields.iter().zip(values) {
        record.set(&field.name, value)?;
    }

    Ok(())
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
