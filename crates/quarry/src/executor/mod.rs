//! Transactional statement execution and the cascading write algorithms.

mod cascade;
mod transaction;

#[cfg(test)]
mod tests;

pub use transaction::Transaction;

use crate::{
    driver::StoreConnection,
    error::Error,
    schema::{EntitySchema, SchemaRegistry},
    sql::{DeleteQuery, SqlDialect},
    traits::Record,
};
use thiserror::Error as ThisError;

///
/// ExecuteError
///
/// Failures raised while running a graph operation. A cascade failure
/// names the related entity and the action that failed; the transaction
/// has already been rolled back by the time it surfaces.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum ExecuteError {
    #[error("could not {action} related {entity}: {source}")]
    Cascade {
        action: &'static str,
        entity: String,
        #[source]
        source: Box<Error>,
    },

    #[error("result row for '{entity}' is missing its '{column}' cell")]
    MissingCell { entity: String, column: String },
}

pub(crate) fn cascade_error(action: &'static str, entity: &str, source: Error) -> Error {
    ExecuteError::Cascade {
        action,
        entity: entity.to_string(),
        source: Box::new(source),
    }
    .into()
}

///
/// Executor
///
/// Owns the write funnel: begin a transaction on the supplied connection,
/// run the cascade, commit on success, roll back on any error at any
/// depth. One transaction per top-level write; nested cascade levels
/// share it through the `Transaction` context.
///

pub(crate) struct Executor<'a> {
    dialect: &'a dyn SqlDialect,
    registry: &'a SchemaRegistry,
}

impl<'a> Executor<'a> {
    pub(crate) const fn new(dialect: &'a dyn SqlDialect, registry: &'a SchemaRegistry) -> Self {
        Self { dialect, registry }
    }

    /// Insert an entity graph: ToOne targets first, then the entity's own
    /// row, then new ToMany children stamped with the parent key.
    pub(crate) async fn insert(
        &self,
        conn: &mut dyn StoreConnection,
        record: &mut dyn Record,
        schema: &EntitySchema,
    ) -> Result<(), Error> {
        let mut tx = Transaction::begin(conn).await?;
        match self.insert_graph(&mut tx, record, schema, None).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Update an entity and reconcile the named relations: new children
    /// insert, established children update, absent children are orphan-
    /// deleted.
    pub(crate) async fn update(
        &self,
        conn: &mut dyn StoreConnection,
        record: &mut dyn Record,
        schema: &EntitySchema,
        includes: &[String],
    ) -> Result<(), Error> {
        let mut tx = Transaction::begin(conn).await?;
        match self
            .update_graph(&mut tx, record, schema, includes, None)
            .await
        {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Execute a physical DELETE, returning the affected-row count.
    pub(crate) async fn delete(
        &self,
        conn: &mut dyn StoreConnection,
        query: &DeleteQuery,
    ) -> Result<u64, Error> {
        let mut tx = Transaction::begin(conn).await?;
        let sql = self.dialect.build_delete(query);
        match tx.execute(&sql, &query.params).await {
            Ok(count) => {
                tx.commit().await?;
                Ok(count)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err.into())
            }
        }
    }
}
