use chrono::{TimeZone, Utc};
use frontdesk_sdk::{AccessEvent, Package, PackageStatus};
use uuid::Uuid;

use super::{access_event, package};

fn package_model(status: &str) -> package::Model {
    package::Model {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        unit_id: Uuid::new_v4(),
        addressee_id: Uuid::new_v4(),
        carrier: Some("Loggi".to_owned()),
        tracking_code: None,
        notes: None,
        received_by: Uuid::new_v4(),
        received_at: Utc.with_ymd_and_hms(2026, 2, 10, 14, 0, 0).unwrap(),
        status: status.to_owned(),
        delivered_at: None,
        delivered_by: None,
        recipient_name: None,
        remote_ticket_id: Some("a0B000000000001".to_owned()),
        pickup_code: None,
    }
}

#[test]
fn package_model_round_trips_status() {
    let model = package_model("received");
    let id = model.id;

    let package = Package::try_from(model).unwrap();
    assert_eq!(package.id, id);
    assert_eq!(package.status, PackageStatus::Received);
    assert_eq!(package.remote_ticket_id.as_deref(), Some("a0B000000000001"));
}

#[test]
fn package_model_rejects_unknown_status() {
    let err = Package::try_from(package_model("lost")).unwrap_err();
    assert!(err.contains("lost"));
}

#[test]
fn access_event_model_rejects_unknown_outcome() {
    let model = access_event::Model {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        unit_id: None,
        resident_id: None,
        visitor_name: "Ana".to_owned(),
        visitor_document: None,
        visitor_phone: None,
        kind: "visitor".to_owned(),
        method: "tag".to_owned(),
        outcome: "teleported".to_owned(),
        denial_reason: None,
        created_by: Uuid::new_v4(),
        created_at: Utc.with_ymd_and_hms(2026, 2, 10, 14, 0, 0).unwrap(),
        remote_log_id: None,
        valid_until: None,
    };

    let err = AccessEvent::try_from(model).unwrap_err();
    assert!(err.contains("teleported"));
}
