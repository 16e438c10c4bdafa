//! Local/remote reconciliation.
//!
//! Each resource instance moves through `Unsynced -> Synced -> stale ->
//! deleted` keyed by its remote correlation field. The local row is the
//! unit of durability; remote state is a best-effort projection of it, so
//! a remote failure is logged and leaves the instance eligible for a later
//! attempt, never surfaced as fatal.
//!
//! Payload field names are negotiated against the remote schema through
//! [`RemoteDirectory::pick_field`]: org-specific optional fields are
//! silently omitted when absent.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use frontdesk_sdk::{AccessEvent, AccessOutcome, Package, Resident, Tenant};
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::RemoteObjectsConfig;
use crate::domain::access::TenantScope;
use crate::domain::ports::{soql_datetime, soql_quote, RemoteDirectory, RemoteRecord};
use crate::domain::repos::{AccessEventsRepository, PackagesRepository};

/// Fixed field names shared by every org running the managed package.
const FLD_PROPERTY: &str = "reda__Property__c";
const FLD_CONTACT: &str = "reda__Contact__c";
const FLD_PACKAGE_NAME: &str = "reda__Package_Name__c";
const FLD_PACKAGE_FOR: &str = "reda__Package_For__c";
const FLD_PACKAGE_DESC: &str = "reda__Package_Description__c";
const FLD_RECEIVED_AT: &str = "reda__Received_Date_Time__c";

/// Ordered candidates for org-variable optional fields.
const PACKAGE_TYPE_FIELDS: &[&str] = &["reda__Package_Type__c", "Package_Type__c"];
const STATUS_FIELDS: &[&str] = &["reda__Status__c", "Status__c"];
const HANDED_OVER_AT_FIELDS: &[&str] = &[
    "reda__Handed_Over_Date_Time__c",
    "reda__Delivered_Date_Time__c",
];
const RECIPIENT_FIELDS: &[&str] = &["reda__Received_By__c", "Received_By__c"];
const PASSWORD_FIELDS: &[&str] = &["reda__Password__c", "Password__c"];
const CHECK_IN_FIELDS: &[&str] = &["reda__Check_In_Datetime__c", "Check_In_Datetime__c"];
const GUEST_NAME_FIELDS: &[&str] = &[
    "reda__Guest_Name__c",
    "reda__Visitor_Name__c",
    "Visitor_Name__c",
];
const GUEST_PHONE_FIELDS: &[&str] = &[
    "reda__Guest_Phone__c",
    "reda__Visitor_Phone__c",
    "Visitor_Phone__c",
];
const GUEST_TYPE_FIELDS: &[&str] = &["reda__Guest_Type__c", "Guest_Type__c"];
const DESCRIPTION_FIELDS: &[&str] = &["reda__Description__c", "Description__c", "Notes__c"];
const OPPORTUNITY_FIELDS: &[&str] = &["reda__Opportunity__c", "Opportunity__c"];
const PERMITTED_TILL_FIELDS: &[&str] = &["reda__Permitted_Till_Datetime__c"];

const DESCRIPTION_MAX: usize = 255;

/// Propagates committed local changes to the remote directory and persists
/// returned correlation keys through field-scoped updates.
pub struct Reconciler<P, A> {
    db: DatabaseConnection,
    remote: Arc<dyn RemoteDirectory>,
    packages: Arc<P>,
    access_events: Arc<A>,
    objects: RemoteObjectsConfig,
}

impl<P, A> Reconciler<P, A>
where
    P: PackagesRepository,
    A: AccessEventsRepository,
{
    pub fn new(
        db: DatabaseConnection,
        remote: Arc<dyn RemoteDirectory>,
        packages: Arc<P>,
        access_events: Arc<A>,
        objects: RemoteObjectsConfig,
    ) -> Self {
        Self {
            db,
            remote,
            packages,
            access_events,
            objects,
        }
    }

    /// Create the remote ticket for a freshly committed package and write
    /// the returned correlation key (and any remote-issued pickup code)
    /// back onto the row.
    ///
    /// Skipped, not failed, when the owning tenant carries no remote
    /// property key.
    ///
    /// # Errors
    /// Remote and storage failures; the caller logs them as warnings and
    /// leaves the package `Unsynced`.
    #[instrument(skip_all, fields(package_id = %package.id))]
    pub async fn package_created(
        &self,
        package: Package,
        tenant: Tenant,
        addressee: Option<Resident>,
    ) -> anyhow::Result<()> {
        let Some(property_id) = tenant.remote_property_id.as_deref() else {
            debug!("tenant has no remote property mapping; skipping reconciliation");
            return Ok(());
        };

        // Guard against double invocation of the post-commit step: re-read
        // the correlation field and skip when an earlier run already set it.
        let current = self
            .packages
            .get(&self.db, &TenantScope::All, package.id)
            .await?;
        let Some(current) = current else {
            debug!("package deleted before reconciliation ran");
            return Ok(());
        };
        if current.remote_ticket_id.is_some() {
            debug!("package already reconciled");
            return Ok(());
        }

        let mut fields = build_ticket_payload(&package, property_id, addressee.as_ref());
        if let Some(type_field) = self
            .remote
            .pick_field(&self.objects.ticket, PACKAGE_TYPE_FIELDS)
            .await?
        {
            if let Some(carrier) = package.carrier.as_deref() {
                fields.insert(type_field, Value::from(carrier));
            }
        }

        let created = self
            .remote
            .create(&self.objects.ticket, fields)
            .await
            .context("remote ticket create")?;

        let pickup_code = first_string_field(&created.fields, PASSWORD_FIELDS);
        let wrote = self
            .packages
            .set_remote_ticket_id(&self.db, package.id, &created.id, pickup_code.as_deref())
            .await?;
        if !wrote {
            warn!(
                remote_ticket_id = %created.id,
                "correlation key already set by a concurrent run; the duplicate remote ticket is orphaned"
            );
        }
        Ok(())
    }

    /// Push delivery delta fields to an already-synced remote ticket.
    ///
    /// # Errors
    /// Remote failures; the local mutation stands regardless.
    #[instrument(skip_all, fields(package_id = %package.id))]
    pub async fn package_delivered(&self, package: Package) -> anyhow::Result<()> {
        let Some(remote_id) = package.remote_ticket_id.as_deref() else {
            debug!("package was never reconciled; nothing to update remotely");
            return Ok(());
        };

        let mut fields = RemoteRecord::new();
        if let Some(status_field) = self
            .remote
            .pick_field(&self.objects.ticket, STATUS_FIELDS)
            .await?
        {
            fields.insert(status_field, Value::from("Handed Over"));
        }
        if let Some(at) = package.delivered_at {
            if let Some(field) = self
                .remote
                .pick_field(&self.objects.ticket, HANDED_OVER_AT_FIELDS)
                .await?
            {
                fields.insert(field, Value::from(soql_datetime(at)));
            }
        }
        if let Some(recipient) = package.recipient_name.as_deref() {
            if let Some(field) = self
                .remote
                .pick_field(&self.objects.ticket, RECIPIENT_FIELDS)
                .await?
            {
                fields.insert(field, Value::from(recipient));
            }
        }

        if fields.is_empty() {
            debug!("no writable delivery fields on this org; skipping remote update");
            return Ok(());
        }

        self.remote
            .update(&self.objects.ticket, remote_id, fields)
            .await
            .context("remote ticket update")?;
        Ok(())
    }

    /// Best-effort remote ticket deletion, called before the local delete.
    /// A failure degrades to an orphaned remote record; the local delete
    /// proceeds regardless.
    #[instrument(skip(self))]
    pub async fn package_deleted(&self, remote_ticket_id: &str) {
        match self.remote.delete(&self.objects.ticket, remote_ticket_id).await {
            Ok(true) => debug!("remote ticket deleted"),
            Ok(false) => debug!("remote ticket already gone"),
            Err(e) => warn!(error = %e, "remote ticket delete failed; remote record is orphaned"),
        }
    }

    /// Create the remote visitor log for a freshly committed access event.
    ///
    /// # Errors
    /// Remote and storage failures; caller logs them, event stays unsynced.
    #[instrument(skip_all, fields(event_id = %event.id))]
    pub async fn access_event_created(
        &self,
        event: AccessEvent,
        tenant: Tenant,
        responsible: Option<Resident>,
    ) -> anyhow::Result<()> {
        let Some(property_id) = tenant.remote_property_id.as_deref() else {
            debug!("tenant has no remote property mapping; skipping reconciliation");
            return Ok(());
        };

        let current = self
            .access_events
            .get(&self.db, &TenantScope::All, event.id)
            .await?;
        let Some(current) = current else {
            debug!("access event deleted before reconciliation ran");
            return Ok(());
        };
        if current.remote_log_id.is_some() {
            debug!("access event already reconciled");
            return Ok(());
        }

        let object = self.objects.visitor_log.as_str();
        let mut fields = RemoteRecord::new();
        fields.insert(FLD_PROPERTY.to_owned(), Value::from(property_id));

        if let Some(field) = self.remote.pick_field(object, STATUS_FIELDS).await? {
            fields.insert(field, Value::from(remote_outcome(event.outcome)));
        }
        if let Some(field) = self.remote.pick_field(object, CHECK_IN_FIELDS).await? {
            fields.insert(field, Value::from(soql_datetime(event.created_at)));
        }
        if let Some(field) = self.remote.pick_field(object, GUEST_NAME_FIELDS).await? {
            fields.insert(field, Value::from(event.visitor_name.as_str()));
        }
        if let Some(phone) = event.visitor_phone.as_deref() {
            if let Some(field) = self.remote.pick_field(object, GUEST_PHONE_FIELDS).await? {
                fields.insert(field, Value::from(normalize_phone(phone)));
            }
        }
        if let Some(field) = self.remote.pick_field(object, GUEST_TYPE_FIELDS).await? {
            fields.insert(field, Value::from(remote_guest_type(&event)));
        }
        if let Some(contact_id) = responsible
            .as_ref()
            .and_then(|r| r.remote_contact_id.as_deref())
        {
            fields.insert(FLD_CONTACT.to_owned(), Value::from(contact_id));
        }
        if let Some(field) = self.remote.pick_field(object, DESCRIPTION_FIELDS).await? {
            fields.insert(field, Value::from(visitor_description(&event)));
        }

        let created = self
            .remote
            .create(object, fields)
            .await
            .context("remote visitor log create")?;

        let wrote = self
            .access_events
            .set_remote_log_id(&self.db, event.id, &created.id)
            .await?;
        if !wrote {
            warn!(
                remote_log_id = %created.id,
                "correlation key already set by a concurrent run; the duplicate remote log is orphaned"
            );
        }
        Ok(())
    }

    /// Best-effort remote visitor-log deletion before the local delete.
    #[instrument(skip(self))]
    pub async fn access_event_deleted(&self, remote_log_id: &str) {
        match self
            .remote
            .delete(&self.objects.visitor_log, remote_log_id)
            .await
        {
            Ok(true) => debug!("remote visitor log deleted"),
            Ok(false) => debug!("remote visitor log already gone"),
            Err(e) => warn!(error = %e, "remote visitor log delete failed; remote record is orphaned"),
        }
    }

    /// Look up an unexpired remote pre-approval for a visitor phone and a
    /// responsible party's opportunity key.
    ///
    /// Returns the remote expiry only when it lies strictly in the future.
    /// Best-effort: every failure is swallowed and treated as "no
    /// pre-approval".
    #[instrument(skip(self))]
    pub async fn check_preapproval(
        &self,
        phone: &str,
        opportunity_id: &str,
    ) -> Option<DateTime<Utc>> {
        self.check_preapproval_at(phone, opportunity_id, Utc::now())
            .await
    }

    /// Pre-approval lookup against an explicit instant. An expiry equal to
    /// `now` is already expired.
    pub async fn check_preapproval_at(
        &self,
        phone: &str,
        opportunity_id: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let digits = normalize_phone(phone);
        if digits.is_empty() || opportunity_id.is_empty() {
            return None;
        }

        match self.query_preapproval(&digits, opportunity_id).await {
            Ok(found) => found.filter(|expiry| *expiry > now),
            Err(e) => {
                debug!(error = %e, "pre-approval lookup failed; proceeding without one");
                None
            }
        }
    }

    async fn query_preapproval(
        &self,
        phone_digits: &str,
        opportunity_id: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let object = &self.objects.visitor_log;
        let Some(expiry_field) = self
            .remote
            .pick_field(object, PERMITTED_TILL_FIELDS)
            .await?
        else {
            return Ok(None);
        };
        let Some(phone_field) = self.remote.pick_field(object, GUEST_PHONE_FIELDS).await? else {
            return Ok(None);
        };
        let Some(opportunity_field) =
            self.remote.pick_field(object, OPPORTUNITY_FIELDS).await?
        else {
            return Ok(None);
        };

        let soql = format!(
            "SELECT Id, {expiry_field} FROM {object} \
             WHERE {expiry_field} != null \
             AND {phone_field} = {phone} \
             AND {opportunity_field} = {opportunity} \
             ORDER BY CreatedDate DESC LIMIT 1",
            phone = soql_quote(phone_digits),
            opportunity = soql_quote(opportunity_id),
        );

        let records = self.remote.query(&soql).await?;
        let Some(record) = records.first() else {
            return Ok(None);
        };
        let Some(raw) = record.get(&expiry_field).and_then(Value::as_str) else {
            return Ok(None);
        };
        Ok(parse_remote_datetime(raw))
    }
}

impl<P, A> std::fmt::Debug for Reconciler<P, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("ticket_object", &self.objects.ticket)
            .field("visitor_log_object", &self.objects.visitor_log)
            .finish()
    }
}

/// Fixed part of the remote ticket payload. Empty values are dropped here
/// and again by the client before send.
fn build_ticket_payload(
    package: &Package,
    property_id: &str,
    addressee: Option<&Resident>,
) -> RemoteRecord {
    let mut fields = Map::new();
    fields.insert(FLD_PROPERTY.to_owned(), Value::from(property_id));

    let name = package
        .tracking_code
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| format!("Package {}", package.id));
    fields.insert(FLD_PACKAGE_NAME.to_owned(), Value::from(name));

    if let Some(addressee) = addressee {
        fields.insert(
            FLD_PACKAGE_FOR.to_owned(),
            Value::from(addressee.name.as_str()),
        );
        if let Some(contact_id) = addressee.remote_contact_id.as_deref() {
            fields.insert(FLD_CONTACT.to_owned(), Value::from(contact_id));
        }
    }

    let description = truncate(
        &[package.carrier.as_deref(), package.notes.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" "),
        DESCRIPTION_MAX,
    );
    if !description.is_empty() {
        fields.insert(FLD_PACKAGE_DESC.to_owned(), Value::from(description));
    }

    fields.insert(
        FLD_RECEIVED_AT.to_owned(),
        Value::from(soql_datetime(package.received_at)),
    );
    fields
}

fn remote_outcome(outcome: AccessOutcome) -> &'static str {
    match outcome {
        AccessOutcome::Permitted => "Permitted",
        AccessOutcome::Denied => "Denied",
        AccessOutcome::Requested => "Requested",
        AccessOutcome::CheckedIn => "Checked In",
        AccessOutcome::CheckedOut => "Checked Out",
    }
}

fn remote_guest_type(event: &AccessEvent) -> &'static str {
    match event.kind {
        frontdesk_sdk::VisitorKind::Resident => "Resident",
        frontdesk_sdk::VisitorKind::Visitor => "Visitor",
        frontdesk_sdk::VisitorKind::Vendor => "Vendor",
        frontdesk_sdk::VisitorKind::Courier => "Courier",
    }
}

fn visitor_description(event: &AccessEvent) -> String {
    let mut parts = vec![format!("Visitor: {}", event.visitor_name)];
    if let Some(doc) = event.visitor_document.as_deref() {
        parts.push(format!("Document: {doc}"));
    }
    if let Some(phone) = event.visitor_phone.as_deref() {
        parts.push(format!("Phone: {phone}"));
    }
    if let Some(reason) = event.denial_reason.as_deref() {
        parts.push(format!("Denied: {reason}"));
    }
    truncate(&parts.join(" | "), DESCRIPTION_MAX)
}

/// Strip formatting from a phone number and drop the leading country code
/// the way the remote side stores numbers.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with("55") && digits.len() > 11 {
        digits[2..].to_owned()
    } else {
        digits
    }
}

/// Remote datetimes arrive either as RFC 3339 or in the compact
/// `+0000`-offset form; accept both.
#[must_use]
pub fn parse_remote_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn first_string_field(record: &RemoteRecord, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|c| record.get(*c).and_then(Value::as_str))
        .map(str::to_owned)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use frontdesk_sdk::PackageStatus;
    use uuid::Uuid;

    fn sample_package() -> Package {
        Package {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            addressee_id: Uuid::new_v4(),
            carrier: Some("FedEx".to_owned()),
            tracking_code: Some("TRK-42".to_owned()),
            notes: Some("fragile".to_owned()),
            received_by: Uuid::new_v4(),
            received_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            status: PackageStatus::Received,
            delivered_at: None,
            delivered_by: None,
            recipient_name: None,
            remote_ticket_id: None,
            pickup_code: None,
        }
    }

    fn sample_resident() -> Resident {
        Resident {
            id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            name: "Ana Souza".to_owned(),
            document: None,
            phone: Some("+55 (11) 93213-8078".to_owned()),
            active: true,
            remote_contact_id: Some("003xx0000000001".to_owned()),
            remote_opportunity_id: Some("006xx0000000001".to_owned()),
        }
    }

    #[test]
    fn ticket_payload_carries_fixed_fields() {
        let package = sample_package();
        let resident = sample_resident();
        let payload = build_ticket_payload(&package, "a0Bxx000000001", Some(&resident));

        assert_eq!(payload[FLD_PROPERTY], "a0Bxx000000001");
        assert_eq!(payload[FLD_PACKAGE_NAME], "TRK-42");
        assert_eq!(payload[FLD_PACKAGE_FOR], "Ana Souza");
        assert_eq!(payload[FLD_CONTACT], "003xx0000000001");
        assert_eq!(payload[FLD_PACKAGE_DESC], "FedEx fragile");
        assert_eq!(payload[FLD_RECEIVED_AT], "2026-03-01T09:00:00Z");
    }

    #[test]
    fn ticket_payload_falls_back_to_package_id_name() {
        let mut package = sample_package();
        package.tracking_code = None;
        package.carrier = None;
        package.notes = None;
        let payload = build_ticket_payload(&package, "p", None);

        assert_eq!(payload[FLD_PACKAGE_NAME], format!("Package {}", package.id));
        assert!(!payload.contains_key(FLD_PACKAGE_DESC));
        assert!(!payload.contains_key(FLD_PACKAGE_FOR));
    }

    #[test]
    fn phone_normalization_strips_country_code() {
        assert_eq!(normalize_phone("+55 (11) 93213-8078"), "11932138078");
        assert_eq!(normalize_phone("11932138078"), "11932138078");
        assert_eq!(normalize_phone("5511"), "5511");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn remote_datetime_accepts_both_offset_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            parse_remote_datetime("2026-03-01T12:00:00.000+0000"),
            Some(expected)
        );
        assert_eq!(
            parse_remote_datetime("2026-03-01T12:00:00+00:00"),
            Some(expected)
        );
        assert_eq!(parse_remote_datetime("not a date"), None);
    }

    #[test]
    fn description_is_truncated() {
        let long = "x".repeat(400);
        assert_eq!(truncate(&long, DESCRIPTION_MAX).chars().count(), 255);
    }
}
