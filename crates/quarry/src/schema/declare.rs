use crate::traits::{Entity, Record};
use std::any::TypeId;
use std::fmt;

///
/// RelationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationKind {
    ToMany,
    ToOne,
}

///
/// RelationTarget
///
/// Everything the core needs to reach the other side of a relation
/// without naming its type: identity for the registry cache, the
/// declaration to build its schema, and an instantiator for
/// rehydration.
///

#[derive(Clone, Copy)]
pub struct RelationTarget {
    pub(crate) type_id: TypeId,
    pub(crate) declaration: fn() -> EntityDeclaration,
    pub(crate) instantiate: fn() -> Box<dyn Record>,
}

impl RelationTarget {
    #[must_use]
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            declaration: E::declaration,
            instantiate: blank::<E>,
        }
    }
}

impl fmt::Debug for RelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationTarget")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

fn blank<E: Entity>() -> Box<dyn Record> {
    Box::new(E::default())
}

///
/// FieldDecl
///
/// One mapped field: entity-side name, table-side column, and the
/// behavior flags the generator consults (key membership, generated
/// key values, timestamp stamping, update exclusion, soft-delete
/// marking).
///

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub column: String,
    pub nullable: bool,
    pub key: bool,
    pub auto_value: bool,
    pub updated_at: bool,
    pub ignore_on_update: bool,
    pub soft_delete: bool,
}

impl FieldDecl {
    /// A plain mapped field whose column matches its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            column: name.clone(),
            name,
            nullable: false,
            key: false,
            auto_value: false,
            updated_at: false,
            ignore_on_update: false,
            soft_delete: false,
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark this field as part of the primary key.
    #[must_use]
    pub const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Generate a fresh v4 UUID on insert when the current value is zero.
    #[must_use]
    pub const fn auto_value(mut self) -> Self {
        self.auto_value = true;
        self
    }

    /// Stamp with the current UTC time on insert and update.
    #[must_use]
    pub const fn updated_at(mut self) -> Self {
        self.updated_at = true;
        self
    }

    /// Written on insert, never touched by updates.
    #[must_use]
    pub const fn ignore_on_update(mut self) -> Self {
        self.ignore_on_update = true;
        self
    }

    /// Marks the logical-delete flag; composed into SELECT and DELETE
    /// filters as `column != 1`.
    #[must_use]
    pub const fn soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self
    }
}

///
/// RelationDecl
///

#[derive(Clone, Debug)]
pub struct RelationDecl {
    pub name: String,
    pub kind: RelationKind,
    /// ToOne: the FK column on the owning table referencing the target's
    /// key. ToMany: the FK column on the child table referencing this
    /// entity's key.
    pub foreign_key: String,
    /// ToMany only: the child column matched against collected child keys
    /// during orphan reconciliation. Defaults to the target's primary key
    /// column.
    pub local_key: Option<String>,
    pub target: RelationTarget,
}

///
/// EntityDeclaration
///
/// The builder entities hand to the registry. Unvalidated; the registry
/// turns it into an `EntitySchema`, rejecting inconsistent declarations
/// at first use.
///

#[derive(Clone, Debug)]
pub struct EntityDeclaration {
    pub entity: String,
    pub table: String,
    pub schema_name: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub relations: Vec<RelationDecl>,
}

impl EntityDeclaration {
    #[must_use]
    pub fn new(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table: table.into(),
            schema_name: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Qualify the table with a database schema/namespace.
    #[must_use]
    pub fn in_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn to_one(
        mut self,
        name: impl Into<String>,
        target: RelationTarget,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDecl {
            name: name.into(),
            kind: RelationKind::ToOne,
            foreign_key: foreign_key.into(),
            local_key: None,
            target,
        });
        self
    }

    #[must_use]
    pub fn to_many(
        mut self,
        name: impl Into<String>,
        target: RelationTarget,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDecl {
            name: name.into(),
            kind: RelationKind::ToMany,
            foreign_key: foreign_key.into(),
            local_key: None,
            target,
        });
        self
    }

    /// ToMany with an explicit reconciliation column on the child.
    #[must_use]
    pub fn to_many_keyed(
        mut self,
        name: impl Into<String>,
        target: RelationTarget,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDecl {
            name: name.into(),
            kind: RelationKind::ToMany,
            foreign_key: foreign_key.into(),
            local_key: Some(local_key.into()),
            target,
        });
        self
    }
}
