use crate::{
    error::Error,
    executor::{Executor, Transaction, cascade_error},
    schema::{CompositeKey, EntitySchema, RelationKind, RelationSchema, SchemaError, is_new},
    sql::{BoundColumn, QueryGenerator},
    traits::Record,
};
use futures::future::BoxFuture;

/// Parameter name for a ToOne foreign key stamped onto the owning row.
fn m2o_param(relation: &RelationSchema) -> String {
    let table = relation.target_table.replace('.', "_");

    format!("p_m2o_{table}_{}", relation.foreign_key)
}

/// Parameter name for the parent key stamped onto a ToMany child row.
fn fk_param(relation: &RelationSchema) -> String {
    format!("p_fk_{}", relation.foreign_key)
}

impl Executor<'_> {
    /// One cascade level of an insert. `fk` carries the parent's key when
    /// this record is a ToMany child; it lands on the row as an extra
    /// bound column the child entity does not map itself.
    pub(crate) fn insert_graph<'f, 'c: 'f>(
        &'f self,
        tx: &'f mut Transaction<'c>,
        record: &'f mut dyn Record,
        schema: &'f EntitySchema,
        fk: Option<BoundColumn>,
    ) -> BoxFuture<'f, Result<(), Error>> {
        Box::pin(async move {
            let generator = QueryGenerator::new(self.dialect, self.registry);

            // New ToOne targets go in first; their keys become this row's
            // foreign-key columns.
            let mut bound = Vec::new();
            if let Some(fk) = fk {
                bound.push(fk);
            }
            for relation in &schema.relations {
                if relation.kind != RelationKind::ToOne {
                    continue;
                }
                let target_schema = self.registry.target_schema(&relation.target)?;
                let Some(target) = record.to_one_mut(&relation.name) else {
                    continue;
                };
                if is_new(&*target, &target_schema)? {
                    tracing::debug!(
                        entity = %schema.entity,
                        relation = %relation.name,
                        "cascading insert into ToOne target",
                    );
                    self.insert_graph(tx, target, &target_schema, None)
                        .await
                        .map_err(|err| cascade_error("insert", &target_schema.entity, err))?;
                }
                let key = CompositeKey::of(&*target, &target_schema)?;
                bound.push(BoundColumn {
                    column: relation.foreign_key.clone(),
                    param: m2o_param(relation),
                    value: key.fk_value(),
                });
            }

            let mut query = generator.insert(record, schema)?;
            for column in bound {
                query.bind_column(column);
            }
            let sql = self.dialect.build_insert(&query);
            tx.execute(&sql, &query.params).await?;

            // The generator stamped any generated key before execution, so
            // children can be written against it now.
            let parent_key = CompositeKey::of(&*record, schema)?.fk_value();
            for relation in &schema.relations {
                if relation.kind != RelationKind::ToMany {
                    continue;
                }
                let target_schema = self.registry.target_schema(&relation.target)?;
                for child in record.to_many_mut(&relation.name) {
                    // Children with an established identity are left alone;
                    // update-with-includes is the reconciliation path.
                    if !is_new(&*child, &target_schema)? {
                        continue;
                    }
                    let fk = BoundColumn {
                        column: relation.foreign_key.clone(),
                        param: fk_param(relation),
                        value: parent_key.clone(),
                    };
                    self.insert_graph(tx, child, &target_schema, Some(fk))
                        .await
                        .map_err(|err| cascade_error("insert", &target_schema.entity, err))?;
                }
            }

            Ok(())
        })
    }

    /// One cascade level of an update. Only the named relations are
    /// touched; each included ToMany relation ends with an orphan
    /// reconciliation delete against the collected child keys.
    pub(crate) fn update_graph<'f, 'c: 'f>(
        &'f self,
        tx: &'f mut Transaction<'c>,
        record: &'f mut dyn Record,
        schema: &'f EntitySchema,
        includes: &'f [String],
        fk: Option<BoundColumn>,
    ) -> BoxFuture<'f, Result<(), Error>> {
        Box::pin(async move {
            let generator = QueryGenerator::new(self.dialect, self.registry);

            // The parent UPDATE is built up front (timestamps stamped) and
            // executed last, once every included relation has settled.
            let mut query = generator.update(record, schema)?;
            if let Some(fk) = fk {
                query.bind_assignment(fk);
            }

            let parent_key = CompositeKey::of(&*record, schema)?.fk_value();
            for name in includes {
                let relation =
                    schema
                        .relation(name)
                        .ok_or_else(|| SchemaError::UnknownRelation {
                            entity: schema.entity.clone(),
                            relation: name.clone(),
                        })?;
                let target_schema = self.registry.target_schema(&relation.target)?;

                match relation.kind {
                    RelationKind::ToOne => {
                        let Some(target) = record.to_one_mut(&relation.name) else {
                            continue;
                        };
                        if is_new(&*target, &target_schema)? {
                            self.insert_graph(tx, target, &target_schema, None)
                                .await
                                .map_err(|err| {
                                    cascade_error("insert", &target_schema.entity, err)
                                })?;
                        } else {
                            self.update_graph(tx, target, &target_schema, &[], None)
                                .await
                                .map_err(|err| {
                                    cascade_error("update", &target_schema.entity, err)
                                })?;
                        }
                        let key = CompositeKey::of(&*target, &target_schema)?;
                        query.bind_assignment(BoundColumn {
                            column: relation.foreign_key.clone(),
                            param: m2o_param(relation),
                            value: key.fk_value(),
                        });
                    }
                    RelationKind::ToMany => {
                        let mut keep = Vec::new();
                        for child in record.to_many_mut(&relation.name) {
                            let fk = BoundColumn {
                                column: relation.foreign_key.clone(),
                                param: fk_param(relation),
                                value: parent_key.clone(),
                            };
                            if is_new(&*child, &target_schema)? {
                                self.insert_graph(tx, child, &target_schema, Some(fk))
                                    .await
                                    .map_err(|err| {
                                        cascade_error("insert", &target_schema.entity, err)
                                    })?;
                            } else {
                                self.update_graph(tx, child, &target_schema, &[], Some(fk))
                                    .await
                                    .map_err(|err| {
                                        cascade_error("update", &target_schema.entity, err)
                                    })?;
                            }
                            keep.push(CompositeKey::of(&*child, &target_schema)?.fk_value());
                        }

                        // Previously persisted children absent from the
                        // collection go away with the rest of the write.
                        let orphans =
                            generator.delete_orphans(relation, parent_key.clone(), keep);
                        let sql = self.dialect.build_delete(&orphans);
                        tx.execute(&sql, &orphans.params).await?;
                    }
                }
            }

            let sql = self.dialect.build_update(&query);
            tx.execute(&sql, &query.params).await?;

            Ok(())
        })
    }
}
