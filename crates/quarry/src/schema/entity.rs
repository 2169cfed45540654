use crate::schema::{
    EntityDeclaration, FieldDecl, RelationDecl, RelationKind, RelationTarget, SchemaError,
};

///
/// FieldSchema
///

#[derive(Clone, Debug)]
pub struct FieldSchema {
    pub name: String,
    pub column: String,
    pub nullable: bool,
    pub key: bool,
    pub auto_value: bool,
    pub updated_at: bool,
    pub ignore_on_update: bool,
    pub soft_delete: bool,
}

impl From<FieldDecl> for FieldSchema {
    fn from(decl: FieldDecl) -> Self {
        Self {
            name: decl.name,
            column: decl.column,
            nullable: decl.nullable,
            key: decl.key,
            auto_value: decl.auto_value,
            updated_at: decl.updated_at,
            ignore_on_update: decl.ignore_on_update,
            soft_delete: decl.soft_delete,
        }
    }
}

///
/// RelationSchema
///
/// A declared relation with the target side resolved: the target's
/// qualified table, its key columns, and the reconciliation column for
/// ToMany orphan deletes.
///

#[derive(Clone, Debug)]
pub struct RelationSchema {
    pub name: String,
    pub kind: RelationKind,
    pub foreign_key: String,
    pub local_key: String,
    pub target_entity: String,
    pub target_table: String,
    pub target_keys: Vec<String>,
    pub(crate) target: RelationTarget,
}

impl RelationSchema {
    /// First key column on the target side; resolution guarantees at
    /// least one.
    #[must_use]
    pub fn target_key(&self) -> &str {
        self.target_keys.first().map_or("", String::as_str)
    }
}

///
/// EntitySchema
///
/// The validated, immutable descriptor the rest of the core works from.
/// Built once per type by the registry.
///

#[derive(Clone, Debug)]
pub struct EntitySchema {
    pub entity: String,
    pub table: String,
    pub schema_name: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub relations: Vec<RelationSchema>,
}

impl EntitySchema {
    /// Validate a declaration and resolve its relation targets.
    pub(crate) fn build(decl: EntityDeclaration) -> Result<Self, SchemaError> {
        let entity = decl.entity;

        if !decl.fields.iter().any(|f| f.key) {
            return Err(SchemaError::NoPrimaryKey { entity });
        }

        let mut names: Vec<&str> = Vec::with_capacity(decl.fields.len());
        let mut columns: Vec<&str> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            if names.contains(&field.name.as_str()) || columns.contains(&field.column.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity,
                    field: field.name.clone(),
                });
            }
            names.push(&field.name);
            columns.push(&field.column);
        }

        if flag_count(&decl.fields, |f| f.updated_at) > 1 {
            return Err(SchemaError::ConflictingFlag {
                entity,
                flag: "updated-at",
            });
        }
        if flag_count(&decl.fields, |f| f.soft_delete) > 1 {
            return Err(SchemaError::ConflictingFlag {
                entity,
                flag: "soft-delete",
            });
        }

        let mut relations = Vec::with_capacity(decl.relations.len());
        for relation in decl.relations {
            if relations
                .iter()
                .any(|r: &RelationSchema| r.name == relation.name)
            {
                return Err(SchemaError::DuplicateRelation {
                    entity,
                    relation: relation.name,
                });
            }
            if relation.kind == RelationKind::ToOne
                && columns.contains(&relation.foreign_key.as_str())
            {
                return Err(SchemaError::ForeignKeyCollision {
                    entity,
                    relation: relation.name,
                    column: relation.foreign_key,
                });
            }
            relations.push(resolve_relation(&entity, relation)?);
        }

        Ok(Self {
            entity,
            table: decl.table,
            schema_name: decl.schema_name,
            fields: decl.fields.into_iter().map(FieldSchema::from).collect(),
            relations,
        })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationSchema> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.key)
    }

    /// First primary-key column; validation guarantees at least one.
    #[must_use]
    pub fn key_column(&self) -> &str {
        self.key_fields().next().map_or("", |f| f.column.as_str())
    }

    #[must_use]
    pub fn updated_at_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.updated_at)
    }

    #[must_use]
    pub fn soft_delete_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.soft_delete)
    }

    /// Dotted table reference (`namespace.table` or bare table); dialects
    /// escape each segment.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        match &self.schema_name {
            Some(ns) => format!("{ns}.{}", self.table),
            None => self.table.clone(),
        }
    }
}

fn flag_count(fields: &[FieldDecl], pick: impl Fn(&FieldDecl) -> bool) -> usize {
    fields.iter().filter(|f| pick(f)).count()
}

fn resolve_relation(entity: &str, decl: RelationDecl) -> Result<RelationSchema, SchemaError> {
    let target_decl = (decl.target.declaration)();

    // The child-side fk column is written by the executor, never mapped
    // by the child entity itself.
    if decl.kind == RelationKind::ToMany
        && target_decl
            .fields
            .iter()
            .any(|f| f.column == decl.foreign_key)
    {
        return Err(SchemaError::ForeignKeyCollision {
            entity: entity.to_string(),
            relation: decl.name,
            column: decl.foreign_key,
        });
    }

    let target_keys: Vec<String> = target_decl
        .fields
        .iter()
        .filter(|f| f.key)
        .map(|f| f.column.clone())
        .collect();

    let Some(first_key) = target_keys.first() else {
        return Err(SchemaError::NoPrimaryKey {
            entity: target_decl.entity,
        });
    };

    let local_key = decl.local_key.unwrap_or_else(|| first_key.clone());
    let target_table = match &target_decl.schema_name {
        Some(ns) => format!("{ns}.{}", target_decl.table),
        None => target_decl.table.clone(),
    };

    Ok(RelationSchema {
        name: decl.name,
        kind: decl.kind,
        foreign_key: decl.foreign_key,
        local_key,
        target_entity: target_decl.entity,
        target_table,
        target_keys,
        target: decl.target,
    })
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
