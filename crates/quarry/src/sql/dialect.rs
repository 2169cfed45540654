use crate::{
    config::ConnectOptions,
    sql::{DeleteQuery, InsertQuery, JoinClause, OrderBy, SelectField, SelectQuery, UpdateQuery},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// SqlDialect
///
/// Renders the statement model into vendor SQL. The provided methods
/// cover the shared shape; dialects override the hooks where vendors
/// disagree (identifier escaping, row limiting, connection strings).
///
/// Parameter placeholders always render as `@name`; drivers translate
/// to their wire format when binding.
///

pub trait SqlDialect: Send + Sync {
    /// Escape a table reference, one segment per dotted namespace part.
    fn escape_table(&self, name: &str) -> String;

    fn escape_column(&self, name: &str) -> String;

    fn connection_string(&self, options: &ConnectOptions) -> String;

    /// Row-limit text placed between `SELECT` and the field list.
    fn limit_prefix(&self, _limit: Option<u32>) -> String {
        String::new()
    }

    /// Row-limit text appended after ORDER BY.
    fn limit_suffix(&self, limit: Option<u32>) -> String {
        limit.map_or_else(String::new, |n| format!(" LIMIT {n}"))
    }

    fn build_select(&self, query: &SelectQuery) -> String {
        let fields = query
            .fields
            .iter()
            .map(|f| self.render_field(f))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "SELECT {}{fields} FROM {}",
            self.limit_prefix(query.limit),
            self.escape_table(&query.table)
        );
        for join in &query.joins {
            sql.push(' ');
            sql.push_str(&self.render_join(join));
        }
        if !query.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&query.where_sql);
        }
        if !query.order.is_empty() {
            let order = query
                .order
                .iter()
                .map(|o| self.render_order(o))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        sql.push_str(&self.limit_suffix(query.limit));

        sql
    }

    fn build_insert(&self, query: &InsertQuery) -> String {
        let columns = query
            .columns
            .iter()
            .map(|c| self.escape_column(c))
            .collect::<Vec<_>>()
            .join(", ");
        let values = query
            .placeholders
            .iter()
            .map(|p| format!("@{p}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({columns}) VALUES ({values})",
            self.escape_table(&query.table)
        )
    }

    fn build_update(&self, query: &UpdateQuery) -> String {
        let assignments = query
            .assignments
            .iter()
            .map(|(column, param)| format!("{} = @{param}", self.escape_column(column)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "UPDATE {} SET {assignments}",
            self.escape_table(&query.table)
        );
        if !query.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&query.where_sql);
        }

        sql
    }

    fn build_delete(&self, query: &DeleteQuery) -> String {
        let mut sql = format!("DELETE FROM {}", self.escape_table(&query.table));
        if !query.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&query.where_sql);
        }

        sql
    }

    fn render_field(&self, field: &SelectField) -> String {
        match field {
            SelectField::Aliased {
                source,
                column,
                alias,
            } => format!(
                "{}.{} AS {}",
                self.escape_table(source),
                self.escape_column(column),
                self.escape_column(alias)
            ),
            SelectField::Column { source, column } => format!(
                "{}.{}",
                self.escape_table(source),
                self.escape_column(column)
            ),
            SelectField::Marker { alias } => format!("1 AS {}", self.escape_column(alias)),
        }
    }

    fn render_join(&self, join: &JoinClause) -> String {
        format!(
            "{} {} AS {} ON {}.{} = {}.{}",
            join.kind.sql(),
            self.escape_table(&join.table),
            self.escape_table(&join.alias),
            self.escape_table(&join.left_source),
            self.escape_column(&join.left_column),
            self.escape_table(&join.alias),
            self.escape_column(&join.right_column)
        )
    }

    fn render_order(&self, order: &OrderBy) -> String {
        format!(
            "{}.{} {}",
            self.escape_table(&order.source),
            self.escape_column(&order.column),
            order.direction.sql()
        )
    }
}

///
/// MySqlDialect
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn escape_table(&self, name: &str) -> String {
        name.split('.')
            .map(|part| format!("`{part}`"))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn escape_column(&self, name: &str) -> String {
        format!("`{name}`")
    }

    fn connection_string(&self, options: &ConnectOptions) -> String {
        let mut out = format!("Server={};", options.host);
        if let Some(port) = options.port {
            out.push_str(&format!("Port={port};"));
        }
        out.push_str(&format!(
            "Database={};Uid={};Pwd={};",
            options.database, options.username, options.password
        ));

        out
    }
}

///
/// SqlServerDialect
///
/// Brackets for identifiers and `TOP (n)` instead of a LIMIT suffix.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn escape_table(&self, name: &str) -> String {
        name.split('.')
            .map(|part| format!("[{part}]"))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn escape_column(&self, name: &str) -> String {
        format!("[{name}]")
    }

    fn connection_string(&self, options: &ConnectOptions) -> String {
        let server = match options.port {
            Some(port) => format!("{},{port}", options.host),
            None => options.host.clone(),
        };

        format!(
            "Server={server};Database={};User Id={};Password={};",
            options.database, options.username, options.password
        )
    }

    fn limit_prefix(&self, limit: Option<u32>) -> String {
        limit.map_or_else(String::new, |n| format!("TOP ({n}) "))
    }

    fn limit_suffix(&self, _limit: Option<u32>) -> String {
        String::new()
    }
}

///
/// DialectKind
///
/// Serializable dialect selector carried in configuration.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum DialectKind {
    #[display("mysql")]
    #[serde(rename = "mysql")]
    MySql,

    #[display("sqlserver")]
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl DialectKind {
    #[must_use]
    pub fn dialect(self) -> &'static dyn SqlDialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::SqlServer => &SqlServerDialect,
        }
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
