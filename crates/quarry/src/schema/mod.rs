//! Entity declarations, validated schemas, composite keys, and the
//! build-once schema registry.

mod declare;
mod entity;
mod key;
mod registry;

pub use declare::{EntityDeclaration, FieldDecl, RelationDecl, RelationKind, RelationTarget};
pub use entity::{EntitySchema, FieldSchema, RelationSchema};
pub use key::CompositeKey;
pub(crate) use key::is_new;
pub use registry::SchemaRegistry;

use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Declaration/validation failures and dynamic record-access mismatches.
/// Schema building fails at first use of a type; field and relation
/// access errors surface from `Record` implementations.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("entity '{entity}' declares more than one {flag} field")]
    ConflictingFlag { entity: String, flag: &'static str },

    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("entity '{entity}' declares relation '{relation}' more than once")]
    DuplicateRelation { entity: String, relation: String },

    #[error("field '{field}' on entity '{entity}' expects a {expected} value")]
    FieldType {
        entity: String,
        field: String,
        expected: &'static str,
    },

    #[error(
        "relation '{relation}' on entity '{entity}' uses foreign key column '{column}' which is already a mapped column"
    )]
    ForeignKeyCollision {
        entity: String,
        relation: String,
        column: String,
    },

    #[error("entity '{entity}' has {expected} key fields but {got} key values were supplied")]
    KeyArity {
        entity: String,
        expected: usize,
        got: usize,
    },

    #[error("entity '{entity}' declares no primary key fields")]
    NoPrimaryKey { entity: String },

    #[error("relation '{relation}' on entity '{entity}' was given a child of the wrong type")]
    RelationType { entity: String, relation: String },

    #[error("entity '{entity}' has no field named '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("entity '{entity}' has no relation named '{relation}'")]
    UnknownRelation { entity: String, relation: String },
}
