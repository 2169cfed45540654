use crate::value::Value;
use std::fmt;
use std::ops::{BitAnd, BitOr};

///
/// Filter AST
///
/// Pure representation of query predicates. No schema knowledge and no
/// SQL here; field names are resolved and escaped by the compiler, so a
/// filter can be built once and compiled against any dialect.
///
/// Fields are entity field names; `relation.field` reaches across a
/// declared relation into the joined target.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

///
/// GroupOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupOp {
    And,
    Or,
}

impl GroupOp {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

///
/// MethodKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    StartsWith,
    EndsWith,
    Contains,
    In,
    NotIn,
}

///
/// CompareFilter
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompareFilter {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

///
/// MethodFilter
///

#[derive(Clone, Debug, PartialEq)]
pub struct MethodFilter {
    pub field: String,
    pub kind: MethodKind,
    pub value: Value,
}

///
/// Filter
///

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Compare(CompareFilter),
    Group { op: GroupOp, nodes: Vec<Filter> },
    Method(MethodFilter),
}

impl Filter {
    fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(CompareFilter {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    fn method(field: impl Into<String>, kind: MethodKind, value: impl Into<Value>) -> Self {
        Self::Method(MethodFilter {
            field: field.into(),
            kind,
            value: value.into(),
        })
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// Compiles to `IS NULL`.
    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Eq, Value::Null)
    }

    /// Compiles to `IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Ne, Value::Null)
    }

    #[must_use]
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::method(field, MethodKind::StartsWith, value)
    }

    #[must_use]
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::method(field, MethodKind::EndsWith, value)
    }

    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::method(field, MethodKind::Contains, value)
    }

    #[must_use]
    pub fn in_list<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::method(field, MethodKind::In, Value::List(values))
    }

    #[must_use]
    pub fn not_in_list<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::method(field, MethodKind::NotIn, Value::List(values))
    }

    #[must_use]
    pub const fn and(nodes: Vec<Self>) -> Self {
        Self::Group {
            op: GroupOp::And,
            nodes,
        }
    }

    #[must_use]
    pub const fn or(nodes: Vec<Self>) -> Self {
        Self::Group {
            op: GroupOp::Or,
            nodes,
        }
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::and(vec![self, rhs])
    }
}

impl BitAnd for &Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Self::Output {
        Filter::and(vec![self.clone(), rhs.clone()])
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::or(vec![self, rhs])
    }
}

impl BitOr for &Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Self::Output {
        Filter::or(vec![self.clone(), rhs.clone()])
    }
}
