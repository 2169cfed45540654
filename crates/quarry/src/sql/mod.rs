mod dialect;
mod generator;
mod query;


pub use dialect::{DialectKind, MySqlDialect, SqlDialect, SqlServerDialect};
pub use query::{
    BoundColumn, DeleteQuery, Direction, InsertQuery, JoinClause, JoinKind, OrderBy, Params,
    QueryKind, SelectField, SelectQuery, UpdateQuery,
};

pub(crate) use generator::{QueryGenerator, ROOT_MARKER, SPLIT_PREFIX, SelectScope, key_filter};
