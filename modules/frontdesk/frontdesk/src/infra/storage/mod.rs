//! Storage layer. All `SeaORM`-specific code lives here:
//! - `entity/` - entity definitions and SDK-type mappers
//! - `migrations/` - schema migrations
//! - `*_sea_repo` - repository trait implementations

pub mod entity;
pub mod migrations;

mod access_events_sea_repo;
mod db;
mod directory_sea_repo;
mod packages_sea_repo;

pub use access_events_sea_repo::OrmAccessEventsRepository;
pub use directory_sea_repo::OrmDirectoryRepository;
pub use packages_sea_repo::OrmPackagesRepository;
