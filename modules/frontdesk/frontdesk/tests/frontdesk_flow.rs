//! End-to-end flows over an in-memory database: intake, delivery,
//! deletion, access events, tenant scoping, and the reconciliation
//! writebacks, with the remote directory replaced by a programmable mock.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use uuid::Uuid;

use frontdesk::config::RemoteObjectsConfig;
use frontdesk::domain::ports::{RemoteCreated, RemoteDirectory, RemoteError, RemoteRecord};
use frontdesk::domain::reconcile::Reconciler;
use frontdesk::infra::storage::entity::{block, resident, tenant, unit};
use frontdesk::infra::storage::migrations::Migrator;
use frontdesk::infra::storage::{
    OrmAccessEventsRepository, OrmDirectoryRepository, OrmPackagesRepository,
};
use frontdesk::{
    AccessEventFilter, AccessEventsService, AccessMethod, AccessOutcome, AccessPolicy,
    DomainError, NewAccessEvent, NewPackage, PackageFilter, PackageStatus, PackagesService,
    Principal, VisitorKind,
};

#[derive(Default)]
struct MockRemote {
    fields: Mutex<HashMap<String, HashSet<String>>>,
    created: Mutex<Vec<(String, RemoteRecord)>>,
    updated: Mutex<Vec<(String, String, RemoteRecord)>>,
    deleted: Mutex<Vec<(String, String)>>,
    create_echo: Mutex<RemoteRecord>,
    query_response: Mutex<Vec<RemoteRecord>>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    counter: AtomicUsize,
}

impl MockRemote {
    fn with_default_schema() -> Self {
        let remote = Self::default();
        remote.set_fields(
            "reda__Ticket__c",
            &[
                "reda__Property__c",
                "reda__Contact__c",
                "reda__Package_Name__c",
                "reda__Package_For__c",
                "reda__Package_Description__c",
                "reda__Received_Date_Time__c",
                "reda__Package_Type__c",
                "reda__Status__c",
                "reda__Handed_Over_Date_Time__c",
                "reda__Received_By__c",
                "reda__Password__c",
            ],
        );
        remote.set_fields(
            "reda__Visitor_Log__c",
            &[
                "reda__Property__c",
                "reda__Contact__c",
                "reda__Status__c",
                "reda__Check_In_Datetime__c",
                "reda__Guest_Name__c",
                "reda__Guest_Phone__c",
                "reda__Guest_Type__c",
                "reda__Description__c",
                "reda__Opportunity__c",
                "reda__Permitted_Till_Datetime__c",
            ],
        );
        remote
    }

    fn set_fields(&self, object: &str, names: &[&str]) {
        self.fields.lock().unwrap().insert(
            object.to_owned(),
            names.iter().map(|n| (*n).to_owned()).collect(),
        );
    }

    fn created_payloads(&self) -> Vec<(String, RemoteRecord)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteDirectory for MockRemote {
    async fn describe(&self, object_type: &str) -> Result<HashSet<String>, RemoteError> {
        Ok(self
            .fields
            .lock()
            .unwrap()
            .get(object_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        object_type: &str,
        fields: RemoteRecord,
    ) -> Result<RemoteCreated, RemoteError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_owned()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.created
            .lock()
            .unwrap()
            .push((object_type.to_owned(), fields));
        Ok(RemoteCreated {
            id: format!("REM-{n}"),
            fields: self.create_echo.lock().unwrap().clone(),
        })
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        fields: RemoteRecord,
    ) -> Result<(), RemoteError> {
        self.updated
            .lock()
            .unwrap()
            .push((object_type.to_owned(), id.to_owned(), fields));
        Ok(())
    }

    async fn delete(&self, object_type: &str, id: &str) -> Result<bool, RemoteError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_owned()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((object_type.to_owned(), id.to_owned()));
        Ok(true)
    }

    async fn query(&self, _soql: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
        Ok(self.query_response.lock().unwrap().clone())
    }
}

type TestPackagesService =
    PackagesService<OrmPackagesRepository, OrmAccessEventsRepository, OrmDirectoryRepository>;
type TestAccessEventsService =
    AccessEventsService<OrmPackagesRepository, OrmAccessEventsRepository, OrmDirectoryRepository>;

struct Env {
    db: DatabaseConnection,
    remote: Arc<MockRemote>,
    packages: TestPackagesService,
    access_events: TestAccessEventsService,
    reconciler: Arc<Reconciler<OrmPackagesRepository, OrmAccessEventsRepository>>,
}

async fn env() -> Env {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let remote = Arc::new(MockRemote::with_default_schema());
    let packages_repo = Arc::new(OrmPackagesRepository);
    let events_repo = Arc::new(OrmAccessEventsRepository);
    let directory_repo = Arc::new(OrmDirectoryRepository);
    let reconciler = Arc::new(Reconciler::new(
        db.clone(),
        remote.clone() as Arc<dyn RemoteDirectory>,
        packages_repo.clone(),
        events_repo.clone(),
        RemoteObjectsConfig::default(),
    ));

    let packages = PackagesService::new(
        db.clone(),
        AccessPolicy::new(),
        packages_repo,
        directory_repo.clone(),
        reconciler.clone(),
    );
    let access_events = AccessEventsService::new(
        db.clone(),
        AccessPolicy::new(),
        events_repo,
        directory_repo,
        reconciler.clone(),
    );

    Env {
        db,
        remote,
        packages,
        access_events,
        reconciler,
    }
}

fn privileged() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        authenticated: true,
        privileged: true,
        granted_tenants: BTreeSet::new(),
    }
}

fn operator_for(tenant_id: Uuid) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        authenticated: true,
        privileged: false,
        granted_tenants: [tenant_id].into_iter().collect(),
    }
}

async fn seed_tenant(db: &DatabaseConnection, remote_property_id: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    tenant::ActiveModel {
        id: ActiveValue::Set(id),
        name: ActiveValue::Set(format!("Condo {id}")),
        tax_id: ActiveValue::Set(None),
        remote_property_id: ActiveValue::Set(remote_property_id.map(str::to_owned)),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

async fn seed_unit(db: &DatabaseConnection, tenant_id: Uuid) -> Uuid {
    let block_id = Uuid::new_v4();
    block::ActiveModel {
        id: ActiveValue::Set(block_id),
        tenant_id: ActiveValue::Set(tenant_id),
        name: ActiveValue::Set("A".to_owned()),
    }
    .insert(db)
    .await
    .unwrap();

    let unit_id = Uuid::new_v4();
    unit::ActiveModel {
        id: ActiveValue::Set(unit_id),
        block_id: ActiveValue::Set(block_id),
        number: ActiveValue::Set("101".to_owned()),
        floor: ActiveValue::Set(Some("1".to_owned())),
        remote_unit_id: ActiveValue::Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    unit_id
}

async fn seed_resident(
    db: &DatabaseConnection,
    unit_id: Uuid,
    phone: Option<&str>,
    remote_opportunity_id: Option<&str>,
) -> Uuid {
    let id = Uuid::new_v4();
    resident::ActiveModel {
        id: ActiveValue::Set(id),
        unit_id: ActiveValue::Set(unit_id),
        name: ActiveValue::Set("Ana Souza".to_owned()),
        document: ActiveValue::Set(None),
        phone: ActiveValue::Set(phone.map(str::to_owned)),
        active: ActiveValue::Set(true),
        remote_contact_id: ActiveValue::Set(Some("003xx01".to_owned())),
        remote_opportunity_id: ActiveValue::Set(remote_opportunity_id.map(str::to_owned)),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

fn new_package(tenant_id: Uuid, unit_id: Uuid, addressee_id: Uuid) -> NewPackage {
    NewPackage {
        tenant_id,
        unit_id,
        addressee_id,
        carrier: Some("Loggi".to_owned()),
        tracking_code: Some("TRK-1".to_owned()),
        notes: None,
    }
}

fn new_event(tenant_id: Uuid, unit_id: Uuid, resident_id: Uuid) -> NewAccessEvent {
    NewAccessEvent {
        tenant_id,
        unit_id: Some(unit_id),
        resident_id: Some(resident_id),
        visitor_name: "Bruno Lima".to_owned(),
        visitor_document: None,
        visitor_phone: Some("+55 11 91234-5678".to_owned()),
        kind: VisitorKind::Visitor,
        method: AccessMethod::QrCode,
        outcome: AccessOutcome::Requested,
        denial_reason: None,
    }
}

#[tokio::test]
async fn intake_reconciles_and_writes_back_correlation_key() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let actor = privileged();
    let package = env
        .packages
        .create(&actor, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();
    assert_eq!(package.status, PackageStatus::Received);
    assert_eq!(package.remote_ticket_id, None);

    // The post-commit hook already ran; the stored row carries the key.
    let stored = env.packages.get(&actor, package.id).await.unwrap();
    assert_eq!(stored.remote_ticket_id.as_deref(), Some("REM-1"));

    let created = env.remote.created_payloads();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "reda__Ticket__c");
    assert_eq!(created[0].1["reda__Property__c"], "a0Pxx01");
    assert_eq!(created[0].1["reda__Package_Name__c"], "TRK-1");
    assert_eq!(created[0].1["reda__Package_For__c"], "Ana Souza");
}

#[tokio::test]
async fn intake_picks_up_remote_issued_pickup_code() {
    let env = env().await;
    env.remote
        .create_echo
        .lock()
        .unwrap()
        .insert("reda__Password__c".to_owned(), Value::from("4711"));
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let actor = privileged();
    let package = env
        .packages
        .create(&actor, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    let stored = env.packages.get(&actor, package.id).await.unwrap();
    assert_eq!(stored.pickup_code.as_deref(), Some("4711"));
}

#[tokio::test]
async fn unmapped_tenant_is_never_reconciled() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, None).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let actor = privileged();
    let package = env
        .packages
        .create(&actor, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    let stored = env.packages.get(&actor, package.id).await.unwrap();
    assert_eq!(stored.remote_ticket_id, None);
    assert!(env.remote.created_payloads().is_empty());
}

#[tokio::test]
async fn remote_outage_does_not_fail_intake() {
    let env = env().await;
    env.remote.fail_create.store(true, Ordering::SeqCst);
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let actor = privileged();
    let package = env
        .packages
        .create(&actor, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    // Local row committed, still unsynced.
    let stored = env.packages.get(&actor, package.id).await.unwrap();
    assert_eq!(stored.remote_ticket_id, None);
}

#[tokio::test]
async fn unauthorized_tenant_reads_as_not_found() {
    let env = env().await;
    let tenant_a = seed_tenant(&env.db, None).await;
    let tenant_b = seed_tenant(&env.db, None).await;
    let unit_b = seed_unit(&env.db, tenant_b).await;
    let resident_b = seed_resident(&env.db, unit_b, None, None).await;

    let package = env
        .packages
        .create(&privileged(), new_package(tenant_b, unit_b, resident_b))
        .await
        .unwrap();

    let outsider = operator_for(tenant_a);
    let err = env.packages.get(&outsider, package.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    let err = env
        .packages
        .create(&outsider, new_package(tenant_b, unit_b, resident_b))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "tenant", .. }));

    let err = env.packages.delete(&outsider, package.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn unauthenticated_principal_sees_nothing() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, None).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;
    env.packages
        .create(&privileged(), new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    let page = env
        .packages
        .list(&Principal::anonymous(), &PackageFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn listing_is_scoped_and_preselects_sole_tenant() {
    let env = env().await;
    let tenant_a = seed_tenant(&env.db, None).await;
    let unit_a = seed_unit(&env.db, tenant_a).await;
    let resident_a = seed_resident(&env.db, unit_a, None, None).await;
    let tenant_b = seed_tenant(&env.db, None).await;
    let unit_b = seed_unit(&env.db, tenant_b).await;
    let resident_b = seed_resident(&env.db, unit_b, None, None).await;

    let admin = privileged();
    env.packages
        .create(&admin, new_package(tenant_a, unit_a, resident_a))
        .await
        .unwrap();
    env.packages
        .create(&admin, new_package(tenant_b, unit_b, resident_b))
        .await
        .unwrap();

    let page = env
        .packages
        .list(&admin, &PackageFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let operator = operator_for(tenant_a);
    let page = env
        .packages
        .list(&operator, &PackageFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].tenant_id, tenant_a);
}

#[tokio::test]
async fn default_window_hides_older_months() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, None).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let current = env
        .packages
        .create(&admin, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    // Backdate a second package into a previous month through the repo.
    use frontdesk::domain::repos::PackagesRepository;
    let mut old = current.clone();
    old.id = Uuid::new_v4();
    old.tracking_code = Some("TRK-OLD".to_owned());
    old.received_at = Utc::now() - Duration::days(62);
    OrmPackagesRepository.insert(&env.db, &old).await.unwrap();

    let page = env
        .packages
        .list(&admin, &PackageFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, current.id);

    // An explicit date range overrides the default window.
    let filter = PackageFilter {
        received_from: Some(Utc::now() - Duration::days(90)),
        ..PackageFilter::default()
    };
    let page = env.packages.list(&admin, &filter).await.unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn delivery_updates_remote_and_refuses_double_handover() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let package = env
        .packages
        .create(&admin, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    let delivered = env
        .packages
        .deliver(&admin, package.id, "Carlos Souza")
        .await
        .unwrap();
    assert_eq!(delivered.status, PackageStatus::Delivered);
    assert_eq!(delivered.recipient_name.as_deref(), Some("Carlos Souza"));
    assert!(delivered.delivered_at.is_some());

    let updates = env.remote.updated.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1, "REM-1");
    assert_eq!(updates[0].2["reda__Status__c"], "Handed Over");

    let err = env
        .packages
        .deliver(&admin, package.id, "Carlos Souza")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "status", .. }));
}

#[tokio::test]
async fn delete_survives_remote_failure() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let package = env
        .packages
        .create(&admin, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    env.remote.fail_delete.store(true, Ordering::SeqCst);
    env.packages.delete(&admin, package.id).await.unwrap();

    let err = env.packages.get(&admin, package.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn access_event_reconciles_visitor_log() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let event = env
        .access_events
        .create(&admin, new_event(tenant_id, unit_id, resident_id))
        .await
        .unwrap();
    assert_eq!(event.outcome, AccessOutcome::Requested);

    let stored = env.access_events.get(&admin, event.id).await.unwrap();
    assert_eq!(stored.remote_log_id.as_deref(), Some("REM-1"));

    let created = env.remote.created_payloads();
    assert_eq!(created[0].0, "reda__Visitor_Log__c");
    assert_eq!(created[0].1["reda__Guest_Name__c"], "Bruno Lima");
    // Phone goes out in normalized digit form.
    assert_eq!(created[0].1["reda__Guest_Phone__c"], "11912345678");
    assert_eq!(created[0].1["reda__Status__c"], "Requested");
}

#[tokio::test]
async fn unexpired_preapproval_upgrades_outcome() {
    let env = env().await;
    let expiry = Utc::now() + Duration::hours(3);
    env.remote
        .query_response
        .lock()
        .unwrap()
        .push(RemoteRecord::from_iter([
            ("Id".to_owned(), Value::from("LOG-1")),
            (
                "reda__Permitted_Till_Datetime__c".to_owned(),
                Value::from(expiry.to_rfc3339()),
            ),
        ]));
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id =
        seed_resident(&env.db, unit_id, Some("11911111111"), Some("006xx01")).await;

    let event = env
        .access_events
        .create(&privileged(), new_event(tenant_id, unit_id, resident_id))
        .await
        .unwrap();
    assert_eq!(event.outcome, AccessOutcome::Permitted);
    let valid_until = event.valid_until.unwrap();
    assert_eq!(valid_until.timestamp(), expiry.timestamp());
}

#[tokio::test]
async fn expired_preapproval_leaves_outcome_untouched() {
    let env = env().await;
    let expiry = Utc::now() - Duration::minutes(1);
    env.remote
        .query_response
        .lock()
        .unwrap()
        .push(RemoteRecord::from_iter([
            ("Id".to_owned(), Value::from("LOG-1")),
            (
                "reda__Permitted_Till_Datetime__c".to_owned(),
                Value::from(expiry.to_rfc3339()),
            ),
        ]));
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id =
        seed_resident(&env.db, unit_id, Some("11911111111"), Some("006xx01")).await;

    let event = env
        .access_events
        .create(&privileged(), new_event(tenant_id, unit_id, resident_id))
        .await
        .unwrap();
    assert_eq!(event.outcome, AccessOutcome::Requested);
    assert_eq!(event.valid_until, None);
}

#[tokio::test]
async fn access_event_delete_removes_remote_log_first() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let event = env
        .access_events
        .create(&admin, new_event(tenant_id, unit_id, resident_id))
        .await
        .unwrap();
    env.access_events.delete(&admin, event.id).await.unwrap();

    let deleted = env.remote.deleted.lock().unwrap().clone();
    assert_eq!(
        deleted,
        vec![("reda__Visitor_Log__c".to_owned(), "REM-1".to_owned())]
    );

    let page = env
        .access_events
        .list(&admin, &AccessEventFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn resident_must_live_in_selected_unit() {
    let env = env().await;
    let tenant_id = seed_tenant(&env.db, None).await;
    let unit_a = seed_unit(&env.db, tenant_id).await;
    let unit_b = seed_unit(&env.db, tenant_id).await;
    let resident_b = seed_resident(&env.db, unit_b, None, None).await;

    let err = env
        .packages
        .create(&privileged(), new_package(tenant_id, unit_a, resident_b))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation { field: "addressee", .. }
    ));
}

#[tokio::test]
async fn responsible_resident_from_another_tenant_reads_as_not_found() {
    let env = env().await;
    let tenant_a = seed_tenant(&env.db, None).await;
    let unit_a = seed_unit(&env.db, tenant_a).await;
    let tenant_b = seed_tenant(&env.db, None).await;
    let unit_b = seed_unit(&env.db, tenant_b).await;
    let resident_b =
        seed_resident(&env.db, unit_b, Some("11922222222"), Some("006xx99")).await;

    let err = env
        .access_events
        .create(
            &operator_for(tenant_a),
            new_event(tenant_a, unit_a, resident_b),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::NotFound { entity: "resident", .. }
    ));

    // Nothing was recorded locally and nothing reached the remote.
    let page = env
        .access_events
        .list(&privileged(), &AccessEventFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(env.remote.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn preapproval_expiring_exactly_now_is_not_honored() {
    use chrono::TimeZone;

    let env = env().await;
    let expiry = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap();
    env.remote
        .query_response
        .lock()
        .unwrap()
        .push(RemoteRecord::from_iter([
            ("Id".to_owned(), Value::from("LOG-1")),
            (
                "reda__Permitted_Till_Datetime__c".to_owned(),
                Value::from(expiry.to_rfc3339()),
            ),
        ]));

    let at_expiry = env
        .reconciler
        .check_preapproval_at("11911111111", "006xx01", expiry)
        .await;
    assert_eq!(at_expiry, None);

    let just_before = env
        .reconciler
        .check_preapproval_at("11911111111", "006xx01", expiry - Duration::seconds(1))
        .await;
    assert_eq!(just_before, Some(expiry));
}

#[tokio::test]
async fn pickup_code_refresh_sweeps_reconciled_packages() {
    use frontdesk::PickupCodeRefresher;

    let env = env().await;
    let tenant_id = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unit_id = seed_unit(&env.db, tenant_id).await;
    let resident_id = seed_resident(&env.db, unit_id, None, None).await;

    let admin = privileged();
    let package = env
        .packages
        .create(&admin, new_package(tenant_id, unit_id, resident_id))
        .await
        .unwrap();

    env.remote
        .query_response
        .lock()
        .unwrap()
        .push(RemoteRecord::from_iter([
            ("Id".to_owned(), Value::from("REM-1")),
            ("reda__Password__c".to_owned(), Value::from("9999")),
        ]));

    let refresher = PickupCodeRefresher::new(
        env.db.clone(),
        env.remote.clone() as Arc<dyn RemoteDirectory>,
        Arc::new(OrmPackagesRepository),
        RemoteObjectsConfig::default(),
    );
    let summary = refresher.run_once().await.unwrap();
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 0);

    let stored = env.packages.get(&admin, package.id).await.unwrap();
    assert_eq!(stored.pickup_code.as_deref(), Some("9999"));

    // A second sweep sees an unchanged code and writes nothing.
    let summary = refresher.run_once().await.unwrap();
    assert_eq!(summary.updated, 0);
}

#[tokio::test]
async fn remote_browse_requires_a_resolvable_property() {
    use frontdesk::{RemoteBrowseFilter, RemoteBrowseService};

    let env = env().await;
    let mapped = seed_tenant(&env.db, Some("a0Pxx01")).await;
    let unmapped = seed_tenant(&env.db, None).await;
    env.remote
        .query_response
        .lock()
        .unwrap()
        .push(RemoteRecord::from_iter([(
            "Id".to_owned(),
            Value::from("T-1"),
        )]));

    let browse = RemoteBrowseService::new(
        env.db.clone(),
        AccessPolicy::new(),
        Arc::new(OrmDirectoryRepository),
        env.remote.clone() as Arc<dyn RemoteDirectory>,
        RemoteObjectsConfig::default(),
    );

    // Privileged browsing needs no property restriction.
    let records = browse
        .list_remote_tickets(&privileged(), &RemoteBrowseFilter::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    // A sole mapped grant resolves to that tenant's property.
    let records = browse
        .list_remote_tickets(&operator_for(mapped), &RemoteBrowseFilter::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    // An unmapped tenant has nothing remotely; the listing is empty rather
    // than unfiltered.
    let records = browse
        .list_remote_tickets(&operator_for(unmapped), &RemoteBrowseFilter::default())
        .await
        .unwrap();
    assert!(records.is_empty());

    // Asking for a tenant outside the scope reads as not found.
    let filter = RemoteBrowseFilter {
        tenant_id: Some(mapped),
        ..RemoteBrowseFilter::default()
    };
    let err = browse
        .list_remote_tickets(&operator_for(unmapped), &filter)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "tenant", .. }));
}
