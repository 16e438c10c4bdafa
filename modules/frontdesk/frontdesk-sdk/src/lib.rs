//! Public models for the frontdesk module.
//!
//! Transport-agnostic data structures shared between the frontdesk
//! implementation and its consumers. No persistence or HTTP types leak
//! through this crate.

pub mod filters;
pub mod models;

pub use filters::{AccessEventFilter, Page, PackageFilter, RemoteBrowseFilter};
pub use models::{
    AccessEvent, AccessMethod, AccessOutcome, Block, NewAccessEvent, NewPackage, Package,
    PackageStatus, Principal, Resident, Tenant, Unit, VisitorKind,
};
