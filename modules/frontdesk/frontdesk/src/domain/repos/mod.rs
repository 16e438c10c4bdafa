//! Repository traits.
//!
//! Every read and mutation on tenant-owned resources takes a
//! [`TenantScope`](crate::domain::access::TenantScope): the scope predicate
//! is part of the query itself, so an unauthorized row is indistinguishable
//! from an absent one.

mod access_events_repo;
mod directory_repo;
mod packages_repo;

pub use access_events_repo::AccessEventsRepository;
pub use directory_repo::DirectoryRepository;
pub use packages_repo::{PackagesRepository, RemoteTicketRef};
