use crate::{
    driver::{DriverError, StoreConnection},
    sql::Params,
};

///
/// Transaction
///
/// The explicit transaction context threaded through every cascade level.
/// Exactly one exists per top-level write; nested operations receive a
/// mutable borrow and execute on the caller's transaction — there is no
/// nested-transaction semantics to model.
///

pub struct Transaction<'c> {
    conn: &'c mut dyn StoreConnection,
}

impl<'c> Transaction<'c> {
    pub(crate) async fn begin(conn: &'c mut dyn StoreConnection) -> Result<Self, DriverError> {
        conn.begin().await?;

        Ok(Self { conn })
    }

    pub(crate) async fn commit(self) -> Result<(), DriverError> {
        self.conn.commit().await
    }

    /// Best-effort rollback on the failure path. The original error is the
    /// one the caller sees; a rollback failure is only logged.
    pub(crate) async fn rollback(self) {
        tracing::warn!("rolling back transaction");
        if let Err(err) = self.conn.rollback().await {
            tracing::warn!(%err, "rollback failed");
        }
    }

    pub(crate) async fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, DriverError> {
        tracing::debug!(sql, count = params.len(), "executing statement");

        self.conn.execute(sql, params).await
    }
}
