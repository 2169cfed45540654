use crate::{
    error::Error,
    filter::{Filter, FilterCompiler, resolve_field},
    schema::{EntitySchema, RelationKind, RelationSchema, SchemaError, SchemaRegistry},
    sql::{
        BoundColumn, DeleteQuery, Direction, InsertQuery, JoinClause, JoinKind, OrderBy, Params,
        QueryKind, SelectField, SelectQuery, SqlDialect, UpdateQuery,
    },
    traits::Record,
    value::Value,
};
use time::OffsetDateTime;
use uuid::Uuid;

/// Marker alias opening the root segment of a joined projection.
pub(crate) const ROOT_MARKER: &str = "_split_root";

/// Marker alias prefix opening each included relation's segment.
pub(crate) const SPLIT_PREFIX: &str = "_split_";

///
/// SelectScope
///
/// An extra equality ANDed onto a select against a column the entity does
/// not map, such as the child-side foreign key of a ToMany relation.
///

#[derive(Clone, Debug)]
pub(crate) struct SelectScope {
    pub source: String,
    pub column: String,
    pub param: String,
    pub value: Value,
}

///
/// QueryGenerator
///
/// Builds the statement model for one schema at a time. Selects carry
/// marker fields so the rehydrator can segment joined rows; writes stamp
/// generated keys and timestamps onto the record before binding.
///

pub(crate) struct QueryGenerator<'a> {
    dialect: &'a dyn SqlDialect,
    registry: &'a SchemaRegistry,
}

impl<'a> QueryGenerator<'a> {
    pub(crate) const fn new(dialect: &'a dyn SqlDialect, registry: &'a SchemaRegistry) -> Self {
        Self { dialect, registry }
    }

    pub(crate) fn select(
        &self,
        schema: &EntitySchema,
        filter: Option<&Filter>,
        includes: &[String],
        order: &[(String, Direction)],
        limit: Option<u32>,
        scope: Option<SelectScope>,
    ) -> Result<SelectQuery, Error> {
        let root = schema.qualified_table();

        let mut fields = vec![SelectField::Marker {
            alias: ROOT_MARKER.to_string(),
        }];
        for field in &schema.fields {
            fields.push(SelectField::Column {
                source: root.clone(),
                column: field.column.clone(),
            });
        }

        let mut joins = Vec::new();
        for name in includes {
            let relation =
                schema
                    .relation(name)
                    .ok_or_else(|| SchemaError::UnknownRelation {
                        entity: schema.entity.clone(),
                        relation: name.clone(),
                    })?;
            joins.push(include_join(&root, schema, relation));
            fields.push(SelectField::Marker {
                alias: format!("{SPLIT_PREFIX}{}", relation.name),
            });

            let target = self.registry.target_schema(&relation.target)?;
            for field in &target.fields {
                fields.push(SelectField::Column {
                    source: relation.name.clone(),
                    column: field.column.clone(),
                });
            }
        }

        let clause = FilterCompiler::new(schema, self.dialect, self.registry, QueryKind::Select)
            .compile(filter)?;
        let mut where_sql = clause.sql;
        let mut params = clause.params;

        if let Some(scope) = scope {
            let bound = format!(
                "{}.{} = @{}",
                self.dialect.escape_table(&scope.source),
                self.dialect.escape_column(&scope.column),
                scope.param
            );
            where_sql = if where_sql.is_empty() {
                bound
            } else {
                format!("{where_sql} AND {bound}")
            };
            params.set(scope.param, scope.value);
        }

        let mut order_by = Vec::with_capacity(order.len());
        for (field, direction) in order {
            let resolved = resolve_field(schema, self.registry, field)?;
            order_by.push(OrderBy {
                source: resolved.source,
                column: resolved.column,
                direction: *direction,
            });
        }

        Ok(SelectQuery {
            table: root,
            fields,
            joins,
            where_sql,
            order: order_by,
            limit,
            params,
        })
    }

    /// Build an INSERT, assigning generated keys and the update stamp onto
    /// the record first so the caller sees them after the write.
    pub(crate) fn insert(
        &self,
        record: &mut dyn Record,
        schema: &EntitySchema,
    ) -> Result<InsertQuery, Error> {
        for field in &schema.fields {
            if field.key
                && field.auto_value
                && read_value(&*record, schema, &field.name)?.is_zero()
            {
                record.set(&field.name, Value::Uuid(Uuid::new_v4()))?;
            }
        }
        if let Some(field) = schema.updated_at_field() {
            record.set(&field.name, Value::Timestamp(OffsetDateTime::now_utc()))?;
        }

        let mut query = InsertQuery {
            table: schema.qualified_table(),
            ..InsertQuery::default()
        };
        for field in &schema.fields {
            let value = read_value(&*record, schema, &field.name)?;
            query.bind_column(BoundColumn {
                column: field.column.clone(),
                param: format!("p_{}", field.column),
                value,
            });
        }

        Ok(query)
    }

    /// Build an UPDATE keyed on every primary-key column. Key, auto-value
    /// and ignore-on-update fields stay out of the assignment list.
    pub(crate) fn update(
        &self,
        record: &mut dyn Record,
        schema: &EntitySchema,
    ) -> Result<UpdateQuery, Error> {
        if let Some(field) = schema.updated_at_field() {
            record.set(&field.name, Value::Timestamp(OffsetDateTime::now_utc()))?;
        }

        let mut query = UpdateQuery {
            table: schema.qualified_table(),
            ..UpdateQuery::default()
        };
        for field in &schema.fields {
            if field.key || field.auto_value || field.ignore_on_update {
                continue;
            }
            let value = read_value(&*record, schema, &field.name)?;
            query.bind_assignment(BoundColumn {
                column: field.column.clone(),
                param: format!("p_{}", field.column),
                value,
            });
        }

        let filter = key_filter(&*record, schema)?;
        let clause = FilterCompiler::new(schema, self.dialect, self.registry, QueryKind::Update)
            .compile(Some(&filter))?;
        query.where_sql = clause.sql;
        query.params.merge(clause.params);

        Ok(query)
    }

    pub(crate) fn delete_for_record(
        &self,
        record: &dyn Record,
        schema: &EntitySchema,
    ) -> Result<DeleteQuery, Error> {
        let filter = key_filter(record, schema)?;
        self.delete_where(schema, Some(&filter))
    }

    pub(crate) fn delete_where(
        &self,
        schema: &EntitySchema,
        filter: Option<&Filter>,
    ) -> Result<DeleteQuery, Error> {
        let clause = FilterCompiler::new(schema, self.dialect, self.registry, QueryKind::Delete)
            .compile(filter)?;

        Ok(DeleteQuery {
            table: schema.qualified_table(),
            where_sql: clause.sql,
            params: clause.params,
        })
    }

    /// Reconciliation delete for a ToMany include: rows bound to the
    /// parent whose local key is not among the kept keys. An empty keep
    /// list deletes every child of the parent.
    pub(crate) fn delete_orphans(
        &self,
        relation: &RelationSchema,
        parent_key: Value,
        keep: Vec<Value>,
    ) -> DeleteQuery {
        let table = self.dialect.escape_table(&relation.target_table);
        let fk_param = format!("p_fk_{}", relation.foreign_key);

        let mut where_sql = format!(
            "{table}.{} = @{fk_param}",
            self.dialect.escape_column(&relation.foreign_key)
        );
        let mut params = Params::new();
        params.set(fk_param, parent_key);

        if !keep.is_empty() {
            let keep_param = format!("p_keys_{}", relation.local_key);
            where_sql.push_str(&format!(
                " AND {table}.{} NOT IN (@{keep_param})",
                self.dialect.escape_column(&relation.local_key)
            ));
            params.set(keep_param, Value::List(keep));
        }

        DeleteQuery {
            table: relation.target_table.clone(),
            where_sql,
            params,
        }
    }

    /// Scope a child select to one parent through the relation's foreign
    /// key, which the child entity itself does not map.
    pub(crate) fn child_scope(relation: &RelationSchema, parent_key: Value) -> SelectScope {
        SelectScope {
            source: relation.target_table.clone(),
            column: relation.foreign_key.clone(),
            param: format!("p_fk_{}", relation.foreign_key),
            value: parent_key,
        }
    }
}

fn include_join(root: &str, schema: &EntitySchema, relation: &RelationSchema) -> JoinClause {
    match relation.kind {
        RelationKind::ToOne => JoinClause {
            kind: JoinKind::Left,
            table: relation.target_table.clone(),
            alias: relation.name.clone(),
            left_source: root.to_string(),
            left_column: relation.foreign_key.clone(),
            right_column: relation.target_key().to_string(),
        },
        RelationKind::ToMany => JoinClause {
            kind: JoinKind::Left,
            table: relation.target_table.clone(),
            alias: relation.name.clone(),
            left_source: root.to_string(),
            left_column: schema.key_column().to_string(),
            right_column: relation.foreign_key.clone(),
        },
    }
}

/// An equality filter over every primary-key column of a record.
pub(crate) fn key_filter(record: &dyn Record, schema: &EntitySchema) -> Result<Filter, SchemaError> {
    let mut nodes = Vec::with_capacity(schema.fields.len());
    for field in schema.key_fields() {
        let value = read_value(record, schema, &field.name)?;
        nodes.push(Filter::eq(&field.name, value));
    }

    Ok(Filter::and(nodes))
}

fn read_value(
    record: &dyn Record,
    schema: &EntitySchema,
    field: &str,
) -> Result<Value, SchemaError> {
    record.get(field).ok_or_else(|| SchemaError::UnknownField {
        entity: schema.entity.clone(),
        field: field.to_string(),
    })
}
