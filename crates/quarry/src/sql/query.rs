use crate::value::Value;
use derive_more::{Deref, DerefMut, IntoIterator};

///
/// Params
///
/// Named bind values in insertion order. Re-binding a name replaces its
/// value in place, so repeated binds keep the original position.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn merge(&mut self, other: Self) {
        for (name, value) in other {
            self.set(name, value);
        }
    }
}

///
/// QueryKind
///
/// The statement context a WHERE clause compiles under. Soft-delete
/// scoping applies to reads and deletes, never to key-targeted updates.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryKind {
    Delete,
    Select,
    Update,
}

///
/// SelectField
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectField {
    /// A source column projected under a different name.
    Aliased {
        source: String,
        column: String,
        alias: String,
    },

    /// A plain source-qualified column.
    Column { source: String, column: String },

    /// A constant `1 AS alias` segment boundary for the rehydrator.
    Marker { alias: String },
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

///
/// JoinClause
///
/// Every join takes an alias, so two relations against the same table
/// stay addressable independently.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub left_source: String,
    pub left_column: String,
    pub right_column: String,
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

///
/// OrderBy
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderBy {
    pub source: String,
    pub column: String,
    pub direction: Direction,
}

///
/// SelectQuery
///

#[derive(Clone, Debug, Default)]
pub struct SelectQuery {
    pub table: String,
    pub fields: Vec<SelectField>,
    pub joins: Vec<JoinClause>,
    pub where_sql: String,
    pub order: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub params: Params,
}

///
/// BoundColumn
///
/// A column/parameter/value triple stamped onto a statement from outside
/// the entity's own field map, such as a parent key cascading into a
/// child insert.
///

#[derive(Clone, Debug)]
pub struct BoundColumn {
    pub column: String,
    pub param: String,
    pub value: Value,
}

///
/// InsertQuery
///

#[derive(Clone, Debug, Default)]
pub struct InsertQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub placeholders: Vec<String>,
    pub params: Params,
}

impl InsertQuery {
    pub fn bind_column(&mut self, bound: BoundColumn) {
        self.columns.push(bound.column);
        self.placeholders.push(bound.param.clone());
        self.params.set(bound.param, bound.value);
    }
}

///
/// UpdateQuery
///

#[derive(Clone, Debug, Default)]
pub struct UpdateQuery {
    pub table: String,
    pub assignments: Vec<(String, String)>,
    pub where_sql: String,
    pub params: Params,
}

impl UpdateQuery {
    pub fn bind_assignment(&mut self, bound: BoundColumn) {
        self.params.set(bound.param.clone(), bound.value);
        self.assignments.push((bound.column, bound.param));
    }
}

///
/// DeleteQuery
///

#[derive(Clone, Debug, Default)]
pub struct DeleteQuery {
    pub table: String,
    pub where_sql: String,
    pub params: Params,
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
