//! Shared test infrastructure for engine and API tests.
//!
//! - `setup_engine()` - in-memory store, outbox and engine wired together
//! - `insert_meeting()` - place a meeting directly in the store
//! - `FlakyStore` / `BrokenSink` - failure injection for the upstream paths

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, NaiveTime};

use rolecall::auth::Caller;
use rolecall::models::meeting::{Meeting, Slot, meeting_id_for};
use rolecall::models::member::MemberRecord;
use rolecall::notify::{NotificationSink, NotifyError, Outbox};
use rolecall::reservation::{EngineConfig, ReservationEngine};
use rolecall::store::{
    MeetingStore, MemoryStore, MergePolicy, SortOrder, StoreError, Transaction, UpsertOutcome,
    Versioned,
};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_EMAIL: &str = "vpe@club.test";

/// A fixed Monday, so cadence arithmetic is predictable.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn ten_am() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap()
}

pub fn alice() -> Caller {
    Caller::member("u-alice", "Alice", "alice@club.test")
}

pub fn bob() -> Caller {
    Caller::member("u-bob", "Bob", "bob@club.test")
}

pub fn admin() -> Caller {
    Caller::admin("u-vpe", "Vera", ADMIN_EMAIL)
}

// ============================================================================
// ENGINE SETUP
// ============================================================================

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        admin_email: Some(ADMIN_EMAIL.to_string()),
        max_attempts: 3,
    }
}

pub fn setup_engine() -> (MemoryStore, Outbox, ReservationEngine<MemoryStore, Outbox>) {
    let store = MemoryStore::new();
    let outbox = Outbox::new();
    let engine = ReservationEngine::new(store.clone(), outbox.clone(), engine_config());
    (store, outbox, engine)
}

/// Insert a meeting with empty slots for `roles`. Returns its id.
pub async fn insert_meeting<S: MeetingStore>(
    store: &S,
    date: NaiveDate,
    roles: &[&str],
    published: bool,
) -> String {
    let meeting = Meeting {
        id: meeting_id_for(date),
        scheduled_at: date.and_time(ten_am()),
        published,
        slots: roles.iter().map(|r| Slot::empty(*r)).collect(),
    };
    let id = meeting.id.clone();
    store
        .upsert_meeting(meeting, MergePolicy::InsertOnly)
        .await
        .expect("insert meeting");
    id
}

pub async fn meeting<S: MeetingStore>(store: &S, id: &str) -> Meeting {
    store
        .get_meeting(id)
        .await
        .expect("store read")
        .expect("meeting exists")
        .value
}

pub async fn history<S: MeetingStore>(store: &S, member_id: &str) -> Vec<String> {
    store
        .get_member(member_id)
        .await
        .expect("store read")
        .map(|m| m.value.role_history)
        .unwrap_or_default()
}

// ============================================================================
// FAILURE INJECTION
// ============================================================================

/// Sink that refuses every notice.
pub struct BrokenSink;

impl NotificationSink for BrokenSink {
    fn notify(&self, _recipient: &str, _subject: &str, _body_html: &str) -> Result<String, NotifyError> {
        Err(NotifyError::Rejected("mail relay down".to_string()))
    }
}

/// Store whose commits fail with `Unavailable` while `offline` is set.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub offline: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

impl MeetingStore for FlakyStore {
    async fn get_meeting(&self, id: &str) -> Result<Option<Versioned<Meeting>>, StoreError> {
        self.inner.get_meeting(id).await
    }

    async fn get_member(&self, member_id: &str) -> Result<Option<Versioned<MemberRecord>>, StoreError> {
        self.inner.get_member(member_id).await
    }

    async fn upsert_meeting(&self, meeting: Meeting, policy: MergePolicy) -> Result<UpsertOutcome, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.upsert_meeting(meeting, policy).await
    }

    async fn delete_meeting(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete_meeting(id).await
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        self.inner.delete_all().await
    }

    async fn query_meetings_from(&self, from: NaiveDate, order: SortOrder) -> Result<Vec<Meeting>, StoreError> {
        self.inner.query_meetings_from(from, order).await
    }

    async fn query_latest_meeting(&self) -> Result<Option<Meeting>, StoreError> {
        self.inner.query_latest_meeting().await
    }

    async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.commit(tx).await
    }
}
