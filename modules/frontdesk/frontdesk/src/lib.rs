//! Front-desk core for multi-tenant condominium operations.
//!
//! Local packages and access events are the unit of durability; the remote
//! directory holds a best-effort projection of them. Every read and write
//! goes through the tenant scope computed by [`domain::access::AccessPolicy`].
//!
//! Public models live in `frontdesk-sdk` and are re-exported here.

pub use frontdesk_sdk::{
    AccessEvent, AccessEventFilter, AccessMethod, AccessOutcome, Block, NewAccessEvent, NewPackage,
    Package, PackageFilter, PackageStatus, Page, Principal, RemoteBrowseFilter, Resident, Tenant,
    Unit, VisitorKind,
};

pub mod config;
pub mod domain;
pub mod infra;

pub use config::FrontDeskConfig;
pub use domain::access::{AccessPolicy, TenantScope};
pub use domain::error::DomainError;
pub use domain::ports::{RemoteDirectory, RemoteError, RemoteRecord};
pub use domain::refresh::{PickupCodeRefresher, RefreshSummary};
pub use domain::service::access_events::AccessEventsService;
pub use domain::service::packages::PackagesService;
pub use domain::service::remote_browse::RemoteBrowseService;
