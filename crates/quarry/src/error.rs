use crate::{
    driver::DriverError, executor::ExecuteError, filter::CompileError, schema::SchemaError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level aggregation of the module error domains. Callers match on
/// the domain; display text comes from the underlying error.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
