//! Predicate AST and the parameterized SQL fragment compiler.

mod ast;
mod compile;


pub use ast::{CompareFilter, CompareOp, Filter, GroupOp, MethodFilter, MethodKind};
pub use compile::{CompileError, WhereClause};
pub(crate) use compile::{FilterCompiler, ResolvedField, resolve_field};
