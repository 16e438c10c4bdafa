//! Core entities of the front-desk domain.
//!
//! Remote correlation keys (`remote_*` fields) link local rows to their
//! counterparts in the remote directory system. They are optional and
//! write-once: set only by a successful remote create, cleared only by
//! deletion.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A condominium: the authorization and data-ownership boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    /// Correlation key of the property record in the remote directory.
    /// `None` means the tenant is not mapped and its resources are never
    /// reconciled remotely.
    pub remote_property_id: Option<String>,
}

/// A building block within a tenant; intermediate between [`Tenant`] and
/// [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
}

/// A dwelling unit inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub block_id: Uuid,
    pub number: String,
    pub floor: Option<String>,
    pub remote_unit_id: Option<String>,
}

/// A resident of a unit; the counterparty for remote lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub remote_contact_id: Option<String>,
    pub remote_opportunity_id: Option<String>,
}

/// An authenticated actor. The caller resolves role membership into the
/// `privileged` flag before constructing a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub authenticated: bool,
    /// Superuser or "Administrator" role member; authorized for all tenants.
    pub privileged: bool,
    pub granted_tenants: BTreeSet<Uuid>,
}

impl Principal {
    /// An unauthenticated principal with no grants.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            authenticated: false,
            privileged: false,
            granted_tenants: BTreeSet::new(),
        }
    }
}

/// Lifecycle status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Received,
    Delivered,
    Returned,
}

impl PackageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "delivered" => Ok(Self::Delivered),
            "returned" => Ok(Self::Returned),
            other => Err(format!("unknown package status: {other}")),
        }
    }
}

/// A package held at the front desk for a resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
    pub addressee_id: Uuid,
    pub carrier: Option<String>,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
    pub received_by: Uuid,
    pub received_at: DateTime<Utc>,
    pub status: PackageStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by: Option<Uuid>,
    pub recipient_name: Option<String>,
    /// Remote ticket correlation key; empty until reconciled.
    pub remote_ticket_id: Option<String>,
    /// Remote-issued pickup code, refreshed by the periodic task.
    pub pickup_code: Option<String>,
}

/// Input for package intake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPackage {
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
    pub addressee_id: Uuid,
    pub carrier: Option<String>,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
}

/// Declared type of the person in an access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorKind {
    Resident,
    Visitor,
    Vendor,
    Courier,
}

impl VisitorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Visitor => "visitor",
            Self::Vendor => "vendor",
            Self::Courier => "courier",
        }
    }
}

impl FromStr for VisitorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resident" => Ok(Self::Resident),
            "visitor" => Ok(Self::Visitor),
            "vendor" => Ok(Self::Vendor),
            "courier" => Ok(Self::Courier),
            other => Err(format!("unknown visitor kind: {other}")),
        }
    }
}

/// How the person identified at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    Tag,
    QrCode,
    Biometric,
    Password,
}

impl AccessMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::QrCode => "qr_code",
            Self::Biometric => "biometric",
            Self::Password => "password",
        }
    }
}

impl FromStr for AccessMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tag" => Ok(Self::Tag),
            "qr_code" => Ok(Self::QrCode),
            "biometric" => Ok(Self::Biometric),
            "password" => Ok(Self::Password),
            other => Err(format!("unknown access method: {other}")),
        }
    }
}

/// Outcome of a check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Permitted,
    Denied,
    Requested,
    CheckedIn,
    CheckedOut,
}

impl AccessOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permitted => "permitted",
            Self::Denied => "denied",
            Self::Requested => "requested",
            Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out",
        }
    }
}

impl FromStr for AccessOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permitted" => Ok(Self::Permitted),
            "denied" => Ok(Self::Denied),
            "requested" => Ok(Self::Requested),
            "checked_in" => Ok(Self::CheckedIn),
            "checked_out" => Ok(Self::CheckedOut),
            other => Err(format!("unknown access outcome: {other}")),
        }
    }
}

/// A visitor/access log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Option<Uuid>,
    /// Responsible party for the visit, when known.
    pub resident_id: Option<Uuid>,
    pub visitor_name: String,
    pub visitor_document: Option<String>,
    pub visitor_phone: Option<String>,
    pub kind: VisitorKind,
    pub method: AccessMethod,
    pub outcome: AccessOutcome,
    pub denial_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub remote_log_id: Option<String>,
    /// Remote-issued pre-approval expiry, when the event was created from
    /// an unexpired pre-approval.
    pub valid_until: Option<DateTime<Utc>>,
}

/// Input for recording a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessEvent {
    pub tenant_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub resident_id: Option<Uuid>,
    pub visitor_name: String,
    pub visitor_document: Option<String>,
    pub visitor_phone: Option<String>,
    pub kind: VisitorKind,
    pub method: AccessMethod,
    pub outcome: AccessOutcome,
    pub denial_reason: Option<String>,
}
