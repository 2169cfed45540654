use crate::{
    config::ConnectOptions,
    driver::StoreDriver,
    error::Error,
    executor::Executor,
    filter::Filter,
    rehydrate::Rehydrator,
    schema::{CompositeKey, EntitySchema, RelationKind, RelationSchema, SchemaError, SchemaRegistry},
    sql::{DialectKind, Direction, QueryGenerator, SelectScope, key_filter},
    traits::Entity,
    value::Value,
};
use std::{any::TypeId, marker::PhantomData, sync::Arc};

///
/// Database
///
/// The owning handle: one driver, one dialect, one schema registry.
/// Everything else is per-call — repositories and query builders borrow
/// the handle and carry no state of their own.
///

pub struct Database {
    driver: Arc<dyn StoreDriver>,
    dialect: DialectKind,
    options: ConnectOptions,
    registry: SchemaRegistry,
}

impl Database {
    #[must_use]
    pub fn new(driver: Arc<dyn StoreDriver>, dialect: DialectKind, options: ConnectOptions) -> Self {
        Self {
            driver,
            dialect,
            options,
            registry: SchemaRegistry::new(),
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> DialectKind {
        self.dialect
    }

    #[must_use]
    pub const fn options(&self) -> &ConnectOptions {
        &self.options
    }

    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The dialect-native connection string for this database's options.
    #[must_use]
    pub fn connection_string(&self) -> String {
        self.dialect.dialect().connection_string(&self.options)
    }

    #[must_use]
    pub const fn repository<E: Entity>(&self) -> Repository<'_, E> {
        Repository {
            db: self,
            _marker: PhantomData,
        }
    }
}

///
/// Repository
///
/// The typed operation surface for one entity type. Reads acquire a bare
/// connection; writes run through the executor's transaction funnel.
/// Absence is never an error: Get-style operations return `None` or an
/// empty list for zero matches.
///

pub struct Repository<'db, E: Entity> {
    db: &'db Database,
    _marker: PhantomData<E>,
}

impl<'db, E: Entity> Repository<'db, E> {
    fn schema(&self) -> Result<Arc<EntitySchema>, SchemaError> {
        self.db.registry.schema::<E>()
    }

    /// Start a fluent query. Successive `filter` calls AND together.
    #[must_use]
    pub const fn query(&self) -> QueryBuilder<'db, E> {
        QueryBuilder {
            db: self.db,
            filter: None,
            includes: Vec::new(),
            order: Vec::new(),
            limit: None,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, filter: Filter, includes: &[&str]) -> Result<Option<E>, Error> {
        self.query()
            .filter(filter)
            .include_each(includes)
            .first()
            .await
    }

    pub async fn get_all(&self, filter: Option<Filter>, includes: &[&str]) -> Result<Vec<E>, Error> {
        let mut builder = self.query().include_each(includes);
        if let Some(filter) = filter {
            builder = builder.filter(filter);
        }

        builder.fetch().await
    }

    /// Look up by primary key. Only single-column keys are addressable by
    /// one value; composite-key entities go through `get` with a filter.
    pub async fn get_by_id(
        &self,
        id: impl Into<Value>,
        includes: &[&str],
    ) -> Result<Option<E>, Error> {
        let schema = self.schema()?;
        let mut keys = schema.key_fields();
        let (Some(field), None) = (keys.next(), keys.next()) else {
            return Err(SchemaError::KeyArity {
                entity: schema.entity.clone(),
                expected: schema.key_fields().count(),
                got: 1,
            }
            .into());
        };

        self.query()
            .filter(Filter::eq(&field.name, id))
            .include_each(includes)
            .first()
            .await
    }

    /// The children of one parent through a ToMany relation, selected on
    /// the child table scoped by the parent's foreign key.
    pub async fn get_many<C: Entity>(
        &self,
        parent: &E,
        relation: &str,
        filter: Option<Filter>,
    ) -> Result<Vec<C>, Error> {
        let schema = self.schema()?;
        let relation = resolve_relation::<C>(&schema, relation, RelationKind::ToMany)?;

        let parent_key = CompositeKey::of(parent, &schema)?.fk_value();
        let scope = QueryGenerator::child_scope(relation, parent_key);

        let mut builder: QueryBuilder<'db, C> = QueryBuilder {
            db: self.db,
            filter: None,
            includes: Vec::new(),
            order: Vec::new(),
            limit: None,
            _marker: PhantomData,
        };
        if let Some(filter) = filter {
            builder = builder.filter(filter);
        }

        builder.fetch_scoped(Some(scope)).await
    }

    /// The ToOne target of one parent: the parent is re-selected by key
    /// with the relation included, and the joined target extracted.
    pub async fn get_one<C: Entity + Clone>(
        &self,
        parent: &E,
        relation: &str,
    ) -> Result<Option<C>, Error> {
        let schema = self.schema()?;
        resolve_relation::<C>(&schema, relation, RelationKind::ToOne)?;

        let filter = key_filter(parent, &schema)?;
        let parents = self.query().filter(filter).include(relation).fetch().await?;

        Ok(parents.into_iter().next().and_then(|p| {
            p.to_one(relation)
                .and_then(|target| target.as_any().downcast_ref::<C>())
                .cloned()
        }))
    }

    /// Insert the entity and its graph. Generated keys and timestamps are
    /// visible on the returned value.
    pub async fn insert(&self, mut entity: E) -> Result<E, Error> {
        let schema = self.schema()?;
        let mut conn = self.db.driver.connect().await?;

        Executor::new(self.db.dialect.dialect(), &self.db.registry)
            .insert(conn.as_mut(), &mut entity, &schema)
            .await?;

        Ok(entity)
    }

    /// Update the entity's own row; relations stay untouched.
    pub async fn update(&self, entity: E) -> Result<E, Error> {
        self.update_with(entity, &[]).await
    }

    /// Update the entity and reconcile the named relations, including
    /// orphan cleanup on ToMany collections.
    pub async fn update_with(&self, mut entity: E, includes: &[&str]) -> Result<E, Error> {
        let schema = self.schema()?;
        let includes: Vec<String> = includes.iter().map(ToString::to_string).collect();
        let mut conn = self.db.driver.connect().await?;

        Executor::new(self.db.dialect.dialect(), &self.db.registry)
            .update(conn.as_mut(), &mut entity, &schema, &includes)
            .await?;

        Ok(entity)
    }

    /// Physically delete the entity's row, returning the affected count.
    pub async fn delete(&self, entity: &E) -> Result<u64, Error> {
        let schema = self.schema()?;
        let dialect = self.db.dialect.dialect();
        let query =
            QueryGenerator::new(dialect, &self.db.registry).delete_for_record(entity, &schema)?;
        let mut conn = self.db.driver.connect().await?;

        Executor::new(dialect, &self.db.registry)
            .delete(conn.as_mut(), &query)
            .await
    }

    /// Physically delete every row matching the filter.
    pub async fn delete_where(&self, filter: Filter) -> Result<u64, Error> {
        let schema = self.schema()?;
        let dialect = self.db.dialect.dialect();
        let query =
            QueryGenerator::new(dialect, &self.db.registry).delete_where(&schema, Some(&filter))?;
        let mut conn = self.db.driver.connect().await?;

        Executor::new(dialect, &self.db.registry)
            .delete(conn.as_mut(), &query)
            .await
    }
}

fn resolve_relation<'s, C: Entity>(
    schema: &'s EntitySchema,
    name: &str,
    kind: RelationKind,
) -> Result<&'s RelationSchema, Error> {
    let relation = schema
        .relation(name)
        .ok_or_else(|| SchemaError::UnknownRelation {
            entity: schema.entity.clone(),
            relation: name.to_string(),
        })?;

    if relation.kind != kind || relation.target.type_id != TypeId::of::<C>() {
        return Err(SchemaError::RelationType {
            entity: schema.entity.clone(),
            relation: name.to_string(),
        }
        .into());
    }

    Ok(relation)
}

///
/// QueryBuilder
///
/// Consuming fluent builder over one select. Compiles the filter, renders
/// the statement, runs it on a fresh connection, and rehydrates the rows.
///

#[must_use]
pub struct QueryBuilder<'db, E: Entity> {
    db: &'db Database,
    filter: Option<Filter>,
    includes: Vec<String>,
    order: Vec<(String, Direction)>,
    limit: Option<u32>,
    _marker: PhantomData<E>,
}

impl<E: Entity> QueryBuilder<'_, E> {
    /// AND another filter onto the query.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing & filter,
            None => filter,
        });
        self
    }

    /// Join a declared relation and populate it on the results.
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.includes.push(relation.into());
        self
    }

    pub fn include_each(mut self, relations: &[&str]) -> Self {
        for relation in relations {
            self.includes.push((*relation).to_string());
        }
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), Direction::Asc));
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), Direction::Desc));
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub async fn fetch(self) -> Result<Vec<E>, Error> {
        self.fetch_scoped(None).await
    }

    /// First matching root, `None` for zero matches. A join fans the root
    /// across rows, so the row limit is only pushed down when nothing is
    /// included.
    pub async fn first(mut self) -> Result<Option<E>, Error> {
        if self.includes.is_empty() {
            self.limit = Some(1);
        }

        Ok(self.fetch().await?.into_iter().next())
    }

    async fn fetch_scoped(self, scope: Option<SelectScope>) -> Result<Vec<E>, Error> {
        let registry = &self.db.registry;
        let schema = registry.schema::<E>()?;
        let dialect = self.db.dialect.dialect();

        let query = QueryGenerator::new(dialect, registry).select(
            &schema,
            self.filter.as_ref(),
            &self.includes,
            &self.order,
            self.limit,
            scope,
        )?;
        let sql = dialect.build_select(&query);
        tracing::debug!(sql = %sql, count = query.params.len(), "executing select");

        let mut conn = self.db.driver.connect().await?;
        let rows = conn.query(&sql, &query.params).await?;

        Rehydrator::new(registry)
            .collect::<E>(&schema, &self.includes, rows)
            .await
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
