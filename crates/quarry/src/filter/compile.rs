use crate::{
    filter::{CompareFilter, CompareOp, Filter, MethodFilter, MethodKind},
    schema::{EntitySchema, SchemaError, SchemaRegistry},
    sql::{Params, QueryKind, SqlDialect},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// CompileError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("a filter group must contain at least one node")]
    EmptyGroup,

    #[error("field '{field}' cannot be compared to null with '{op}'; use eq/ne")]
    NullOperand { field: String, op: CompareOp },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

///
/// WhereClause
///
/// A compiled filter: dialect-escaped fragment text plus the parameters
/// it binds, in binding order.
///

#[derive(Clone, Debug)]
pub struct WhereClause {
    pub sql: String,
    pub params: Params,
}

impl WhereClause {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

///
/// ResolvedField
///
/// Where a filter field lands in SQL: the source (root table, or the
/// relation's join alias for dotted fields), the column, and the base
/// used for parameter names.
///

pub(crate) struct ResolvedField {
    pub source: String,
    pub column: String,
    pub param_base: String,
}

pub(crate) fn resolve_field(
    schema: &EntitySchema,
    registry: &SchemaRegistry,
    field: &str,
) -> Result<ResolvedField, CompileError> {
    if let Some((relation_name, target_field)) = field.split_once('.') {
        let relation =
            schema
                .relation(relation_name)
                .ok_or_else(|| SchemaError::UnknownRelation {
                    entity: schema.entity.clone(),
                    relation: relation_name.to_string(),
                })?;
        let target = registry.target_schema(&relation.target)?;
        let resolved = target
            .field(target_field)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: target.entity.clone(),
                field: target_field.to_string(),
            })?;

        // Joined targets are always addressed through the relation alias,
        // never the bare table, so two relations to the same table stay
        // independent.
        return Ok(ResolvedField {
            source: relation.name.clone(),
            column: resolved.column.clone(),
            param_base: resolved.name.clone(),
        });
    }

    let resolved = schema.field(field).ok_or_else(|| SchemaError::UnknownField {
        entity: schema.entity.clone(),
        field: field.to_string(),
    })?;

    Ok(ResolvedField {
        source: schema.qualified_table(),
        column: resolved.column.clone(),
        param_base: resolved.name.clone(),
    })
}

///
/// FilterCompiler
///
/// One compile pass over a filter tree. The parameter counter is global
/// to the pass: every leaf consumes a slot (null comparisons included,
/// though they bind nothing), so generated names never collide.
///

pub(crate) struct FilterCompiler<'a> {
    schema: &'a EntitySchema,
    dialect: &'a dyn SqlDialect,
    registry: &'a SchemaRegistry,
    kind: QueryKind,
    counter: usize,
    params: Params,
}

impl<'a> FilterCompiler<'a> {
    pub(crate) fn new(
        schema: &'a EntitySchema,
        dialect: &'a dyn SqlDialect,
        registry: &'a SchemaRegistry,
        kind: QueryKind,
    ) -> Self {
        Self {
            schema,
            dialect,
            registry,
            kind,
            counter: 0,
            params: Params::new(),
        }
    }

    /// Compile the filter, composing the soft-delete flag for SELECT and
    /// DELETE statements.
    pub(crate) fn compile(mut self, filter: Option<&Filter>) -> Result<WhereClause, CompileError> {
        let mut sql = String::new();
        if let Some(filter) = filter {
            self.node(filter, &mut sql, true)?;
        }

        if matches!(self.kind, QueryKind::Select | QueryKind::Delete)
            && let Some(flag) = self.schema.soft_delete_field()
        {
            let column = format!(
                "{}.{}",
                self.dialect.escape_table(&self.schema.qualified_table()),
                self.dialect.escape_column(&flag.column),
            );
            sql = if sql.is_empty() {
                format!("{column} != 1")
            } else {
                format!("({sql}) AND {column} != 1")
            };
        }

        Ok(WhereClause {
            sql,
            params: self.params,
        })
    }

    fn node(&mut self, filter: &Filter, out: &mut String, root: bool) -> Result<(), CompileError> {
        match filter {
            Filter::Compare(cmp) => self.comparison(cmp, out),
            Filter::Method(method) => self.method(method, out),
            Filter::Group { op, nodes } => {
                if nodes.is_empty() {
                    return Err(CompileError::EmptyGroup);
                }

                let mut inner = String::new();
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        inner.push_str(op.sql());
                    }
                    self.node(node, &mut inner, false)?;
                }

                // Nested groups with branching parenthesize; the root and
                // single-child groups render flat.
                if root || nodes.len() == 1 {
                    out.push_str(&inner);
                } else {
                    out.push('(');
                    out.push_str(&inner);
                    out.push(')');
                }
                Ok(())
            }
        }
    }

    fn comparison(&mut self, cmp: &CompareFilter, out: &mut String) -> Result<(), CompileError> {
        let field = resolve_field(self.schema, self.registry, &cmp.field)?;
        let column = self.qualify(&field);

        if cmp.value.is_null() {
            match cmp.op {
                CompareOp::Eq => out.push_str(&format!("{column} IS NULL")),
                CompareOp::Ne => out.push_str(&format!("{column} IS NOT NULL")),
                op => {
                    return Err(CompileError::NullOperand {
                        field: cmp.field.clone(),
                        op,
                    });
                }
            }
            // A null comparison still consumes a counter slot.
            self.counter += 1;
        } else {
            let name = self.next_param(&field.param_base);
            out.push_str(&format!("{column} {} @{name}", cmp.op.sql()));
            self.params.set(name, cmp.value.clone());
        }

        Ok(())
    }

    fn method(&mut self, method: &MethodFilter, out: &mut String) -> Result<(), CompileError> {
        let field = resolve_field(self.schema, self.registry, &method.field)?;
        let column = self.qualify(&field);
        let name = self.next_param(&field.param_base);

        match method.kind {
            MethodKind::StartsWith | MethodKind::EndsWith | MethodKind::Contains => {
                let pattern = match method.kind {
                    MethodKind::StartsWith => format!("{}%", method.value),
                    MethodKind::EndsWith => format!("%{}", method.value),
                    _ => format!("%{}%", method.value),
                };
                out.push_str(&format!("{column} LIKE @{name}"));
                self.params.set(name, Value::Text(pattern));
            }
            MethodKind::In | MethodKind::NotIn => {
                let values = match &method.value {
                    Value::List(values) => values.clone(),
                    other => vec![other.clone()],
                };
                let keyword = if method.kind == MethodKind::In {
                    "IN"
                } else {
                    "NOT IN"
                };
                out.push_str(&format!("{column} {keyword} (@{name})"));
                self.params.set(name, Value::List(values));
            }
        }

        Ok(())
    }

    fn qualify(&self, field: &ResolvedField) -> String {
        format!(
            "{}.{}",
            self.dialect.escape_table(&field.source),
            self.dialect.escape_column(&field.column),
        )
    }

    fn next_param(&mut self, base: &str) -> String {
        let name = format!("{base}_p{}", self.counter);
        self.counter += 1;
        name
    }
}
