//! Listing filters and pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AccessOutcome, PackageStatus, VisitorKind};

/// One page of results with the total row count under the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Caller-supplied package listing filters. All fields are conjunctive
/// additions to the tenant scope restriction, never a replacement for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageFilter {
    pub tenant_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub status: Option<PackageStatus>,
    pub received_from: Option<DateTime<Utc>>,
    pub received_until: Option<DateTime<Utc>>,
    /// Free-text match on the addressee name or tracking code.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PackageFilter {
    /// True when the caller supplied none of the optional filters, which
    /// makes the service apply its default view window.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.tenant_id.is_none()
            && self.unit_id.is_none()
            && self.status.is_none()
            && self.received_from.is_none()
            && self.received_until.is_none()
            && self.search.is_none()
    }
}

/// Caller-supplied access-event listing filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessEventFilter {
    pub tenant_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub kind: Option<VisitorKind>,
    pub outcome: Option<AccessOutcome>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
    /// Free-text match on the visitor name.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl AccessEventFilter {
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.tenant_id.is_none()
            && self.unit_id.is_none()
            && self.kind.is_none()
            && self.outcome.is_none()
            && self.created_from.is_none()
            && self.created_until.is_none()
            && self.search.is_none()
    }
}

/// Filters for read-through listings of remote tickets and visitor logs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteBrowseFilter {
    pub tenant_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}
