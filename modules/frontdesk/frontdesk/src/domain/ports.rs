//! Outbound ports of the domain.
//!
//! The remote directory is an opaque CRM-like system addressed by named
//! object types and string ids. Its field naming is org-specific, so all
//! writes go through [`RemoteDirectory::pick_field`] and degrade gracefully
//! when a preferred field name is absent.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// A remote record with transport metadata already stripped.
pub type RemoteRecord = Map<String, Value>;

/// Result of a remote create: the new id plus whatever fields the remote
/// echoed back (some orgs compute side values such as a pickup code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCreated {
    pub id: String,
    pub fields: RemoteRecord,
}

/// Failures talking to the remote directory.
///
/// Neither variant is ever fatal to a committed local operation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport, authentication, or timeout failure reaching the remote
    /// system. The request may never have arrived.
    #[error("remote directory unavailable: {0}")]
    Unavailable(String),

    /// The remote system understood the request and refused the payload.
    #[error("remote directory rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Object-type-addressed CRUD against the remote directory.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Names of fields the remote schema currently exposes as writable for
    /// `object_type`. Volatile and org-specific; callers never assume a
    /// field exists.
    ///
    /// # Errors
    /// `RemoteError` when the schema cannot be fetched.
    async fn describe(&self, object_type: &str) -> Result<HashSet<String>, RemoteError>;

    /// First candidate present in `describe(object_type)`, or `None` when
    /// no candidate exists on this org. Deterministic for an unchanged
    /// schema.
    ///
    /// # Errors
    /// `RemoteError` when the schema cannot be fetched.
    async fn pick_field(
        &self,
        object_type: &str,
        candidates: &[&str],
    ) -> Result<Option<String>, RemoteError> {
        let available = self.describe(object_type).await?;
        Ok(candidates
            .iter()
            .find(|c| available.contains(**c))
            .map(|c| (*c).to_owned()))
    }

    /// Create a record. Fields with null, empty-string, or empty-list
    /// values are dropped before send: the remote API treats presence, not
    /// value, as intent to set.
    ///
    /// # Errors
    /// `RemoteError` on transport failure or remote validation refusal.
    async fn create(
        &self,
        object_type: &str,
        fields: RemoteRecord,
    ) -> Result<RemoteCreated, RemoteError>;

    /// Update fields on an existing record.
    ///
    /// # Errors
    /// `RemoteError` on transport failure or remote validation refusal.
    async fn update(
        &self,
        object_type: &str,
        id: &str,
        fields: RemoteRecord,
    ) -> Result<(), RemoteError>;

    /// Delete a record. Returns `false` when the record no longer exists.
    ///
    /// # Errors
    /// `RemoteError` on transport failure or remote refusal.
    async fn delete(&self, object_type: &str, id: &str) -> Result<bool, RemoteError>;

    /// Run a SOQL-like query. Each returned record has its transport
    /// metadata stripped.
    ///
    /// # Errors
    /// `RemoteError` on transport failure or a malformed query.
    async fn query(&self, soql: &str) -> Result<Vec<RemoteRecord>, RemoteError>;
}

/// Quote a string literal for a SOQL predicate.
#[must_use]
pub fn soql_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Format an instant the way the remote query language expects:
/// ISO-8601 UTC, second precision, `Z` suffix, unquoted.
#[must_use]
pub fn soql_datetime(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(soql_quote("O'Brien"), "'O\\'Brien'");
        assert_eq!(soql_quote("plain"), "'plain'");
    }

    #[test]
    fn datetime_is_utc_second_precision() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 15).unwrap();
        assert_eq!(soql_datetime(at), "2026-03-01T08:30:15Z");
    }
}
