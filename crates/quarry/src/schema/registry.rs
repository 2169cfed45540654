use crate::{
    schema::{EntityDeclaration, EntitySchema, RelationTarget, SchemaError},
    traits::Entity,
};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

///
/// SchemaRegistry
///
/// Per-database cache of validated schemas, keyed by type identity.
/// Schemas are built outside the lock on first use; when two callers
/// race, the first insert wins and both observe the same `Arc` — a
/// partially built schema is never visible.
///

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    cache: RwLock<HashMap<TypeId, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached schema for `E`, building and validating it on first use.
    pub fn schema<E: Entity>(&self) -> Result<Arc<EntitySchema>, SchemaError> {
        self.schema_for(TypeId::of::<E>(), E::declaration)
    }

    /// Relation-target lookup for dyn contexts (cascades, rehydration).
    pub(crate) fn target_schema(
        &self,
        target: &RelationTarget,
    ) -> Result<Arc<EntitySchema>, SchemaError> {
        self.schema_for(target.type_id, target.declaration)
    }

    fn schema_for(
        &self,
        type_id: TypeId,
        declare: impl FnOnce() -> EntityDeclaration,
    ) -> Result<Arc<EntitySchema>, SchemaError> {
        if let Some(schema) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(schema.clone());
        }

        let built = Arc::new(EntitySchema::build(declare())?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(type_id).or_insert(built).clone())
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
