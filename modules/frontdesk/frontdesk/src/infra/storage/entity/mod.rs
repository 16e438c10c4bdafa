//! `SeaORM` entity definitions.
//!
//! Enum-typed domain fields are stored as their snake_case string form so
//! the schema stays portable across backends; conversion back into SDK
//! types is fallible and surfaces as a database error.

pub mod access_event;
pub mod block;
pub mod package;
pub mod resident;
pub mod tenant;
pub mod unit;

#[cfg(test)]
mod mapper_test;
