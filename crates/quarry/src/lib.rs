//! Quarry — a typed object-relational persistence core.
//!
//! Entities declare their mapping once; the registry validates and caches
//! the resulting schema. Filters compile to parameterized SQL fragments,
//! the generator builds whole statements, and the executor walks entity
//! graphs through cascading writes inside a single transaction. Joined
//! result rows fold back into typed graphs through the rehydrator.
//!
//! The store itself sits behind the async [`StoreDriver`] boundary; no
//! concrete database driver ships with the crate.

mod config;
mod driver;
mod error;
mod executor;
mod filter;
mod rehydrate;
mod repository;
mod schema;
mod sql;
mod traits;
mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::{
    config::ConnectOptions,
    driver::{DriverError, Row, RowStream, StoreConnection, StoreDriver},
    error::Error,
    executor::ExecuteError,
    filter::{CompareOp, CompileError, Filter, GroupOp, MethodKind, WhereClause},
    repository::{Database, QueryBuilder, Repository},
    schema::{
        CompositeKey, EntityDeclaration, EntitySchema, FieldDecl, FieldSchema, RelationDecl,
        RelationKind, RelationSchema, RelationTarget, SchemaError, SchemaRegistry,
    },
    sql::{
        BoundColumn, DeleteQuery, DialectKind, Direction, InsertQuery, JoinClause, JoinKind,
        MySqlDialect, OrderBy, Params, QueryKind, SelectField, SelectQuery, SqlDialect,
        SqlServerDialect, UpdateQuery,
    },
    traits::{Entity, Record},
    value::Value,
};
