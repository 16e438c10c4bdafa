//! Database error and scope-condition helpers.

use std::fmt::Display;

use sea_orm::sea_query::{Condition, Expr};
use sea_orm::ColumnTrait;

use crate::domain::access::TenantScope;
use crate::domain::error::DomainError;

/// Convert any displayable error into a `DomainError::Database`.
pub fn db_err(e: impl Display) -> DomainError {
    DomainError::database(e.to_string())
}

/// Translate a tenant scope into a SQL condition on the given tenant-id
/// column. An empty `Only` set must match no rows, never all rows, so it
/// becomes a constant-false predicate rather than an empty `IN ()`.
pub fn scope_condition<C: ColumnTrait>(scope: &TenantScope, tenant_col: C) -> Condition {
    match scope {
        TenantScope::All => Condition::all(),
        TenantScope::Only(ids) if ids.is_empty() => Condition::all().add(Expr::value(false)),
        TenantScope::Only(ids) => Condition::all().add(tenant_col.is_in(ids.iter().copied())),
    }
}
