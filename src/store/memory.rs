use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::models::meeting::Meeting;
use crate::models::member::MemberRecord;

use super::{
    MeetingStore, MergePolicy, SortOrder, StoreError, Transaction, UpsertOutcome, Version,
    Versioned,
};

#[derive(Default)]
struct Documents {
    meetings: HashMap<String, Versioned<Meeting>>,
    members: HashMap<String, Versioned<MemberRecord>>,
    /// Last version handed out. Store-wide and never reset, so a document
    /// deleted and created again cannot match a snapshot of its old self.
    clock: Version,
}

impl Documents {
    fn tick(&mut self) -> Version {
        self.clock = self.clock.next();
        self.clock
    }
}

/// In-process [`MeetingStore`]. Clones share the same documents.
///
/// The lock is held only while reading a snapshot or while checking and
/// applying a transaction, never across an engine operation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Documents> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn meeting_count(&self) -> usize {
        self.lock().meetings.len()
    }
}

fn current_version<T>(doc: Option<&Versioned<T>>) -> Version {
    doc.map_or(Version::ABSENT, |d| d.version)
}

impl MeetingStore for MemoryStore {
    async fn get_meeting(&self, id: &str) -> Result<Option<Versioned<Meeting>>, StoreError> {
        Ok(self.lock().meetings.get(id).cloned())
    }

    async fn get_member(&self, member_id: &str) -> Result<Option<Versioned<MemberRecord>>, StoreError> {
        Ok(self.lock().members.get(member_id).cloned())
    }

    async fn upsert_meeting(
        &self,
        meeting: Meeting,
        policy: MergePolicy,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut docs = self.lock();
        let current = docs
            .meetings
            .get(&meeting.id)
            .map(|existing| existing.value.scheduled_at);
        match (current, policy) {
            (None, _) => {
                let version = docs.tick();
                docs.meetings.insert(
                    meeting.id.clone(),
                    Versioned {
                        version,
                        value: meeting,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
            (Some(_), MergePolicy::InsertOnly) => Err(StoreError::Conflict(format!(
                "meeting {} already exists",
                meeting.id
            ))),
            (Some(scheduled_at), MergePolicy::KeepSlots) => {
                if scheduled_at != meeting.scheduled_at {
                    let version = docs.tick();
                    if let Some(existing) = docs.meetings.get_mut(&meeting.id) {
                        existing.value.scheduled_at = meeting.scheduled_at;
                        existing.version = version;
                    }
                }
                Ok(UpsertOutcome::Merged)
            }
        }
    }

    async fn delete_meeting(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().meetings.remove(id).is_some())
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        let mut docs = self.lock();
        let count = docs.meetings.len();
        docs.meetings.clear();
        Ok(count)
    }

    async fn query_meetings_from(
        &self,
        from: NaiveDate,
        order: SortOrder,
    ) -> Result<Vec<Meeting>, StoreError> {
        let mut meetings: Vec<Meeting> = self
            .lock()
            .meetings
            .values()
            .filter(|m| m.value.date() >= from)
            .map(|m| m.value.clone())
            .collect();
        meetings.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        if order == SortOrder::Descending {
            meetings.reverse();
        }
        Ok(meetings)
    }

    async fn query_latest_meeting(&self) -> Result<Option<Meeting>, StoreError> {
        Ok(self
            .lock()
            .meetings
            .values()
            .max_by(|a, b| {
                a.value
                    .scheduled_at
                    .cmp(&b.value.scheduled_at)
                    .then(a.value.id.cmp(&b.value.id))
            })
            .map(|m| m.value.clone()))
    }

    async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        let mut docs = self.lock();

        // Check every expectation before touching anything.
        for (expected, meeting) in &tx.meetings {
            let found = current_version(docs.meetings.get(&meeting.id));
            if found != *expected {
                return Err(StoreError::Conflict(format!(
                    "meeting {} is at version {}, expected {}",
                    meeting.id, found.0, expected.0
                )));
            }
        }
        for (expected, member) in &tx.members {
            let found = current_version(docs.members.get(&member.member_id));
            if found != *expected {
                return Err(StoreError::Conflict(format!(
                    "member {} is at version {}, expected {}",
                    member.member_id, found.0, expected.0
                )));
            }
        }

        for (_, meeting) in tx.meetings {
            let version = docs.tick();
            docs.meetings.insert(meeting.id.clone(), Versioned { version, value: meeting });
        }
        for (_, member) in tx.members {
            let version = docs.tick();
            docs.members.insert(member.member_id.clone(), Versioned { version, value: member });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::meeting::Slot;
    use chrono::NaiveTime;

    fn meeting(id: &str, y: i32, m: u32, d: u32) -> Meeting {
        Meeting {
            id: id.to_string(),
            scheduled_at: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            published: true,
            slots: vec![Slot::empty("Timer")],
        }
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .upsert_meeting(meeting("a", 2026, 3, 7), MergePolicy::InsertOnly)
            .await
            .unwrap();
        let snap = store.get_meeting("a").await.unwrap().unwrap();

        let mut changed = snap.value.clone();
        changed.published = false;
        // Member expectation is wrong (record does not exist at version 5).
        let tx = Transaction::new()
            .put_meeting(snap.version, changed)
            .put_member(Version(5), MemberRecord::new("u1", "Alice", "a@x"));
        assert!(matches!(store.commit(tx).await, Err(StoreError::Conflict(_))));

        let after = store.get_meeting("a").await.unwrap().unwrap();
        assert_eq!(after.version, snap.version);
        assert!(after.value.published);
        assert!(store.get_member("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryStore::new();
        store
            .upsert_meeting(meeting("a", 2026, 3, 7), MergePolicy::InsertOnly)
            .await
            .unwrap();
        let snap = store.get_meeting("a").await.unwrap().unwrap();

        store
            .commit(Transaction::new().put_meeting(snap.version, snap.value.clone()))
            .await
            .unwrap();
        let again = store
            .commit(Transaction::new().put_meeting(snap.version, snap.value.clone()))
            .await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn keep_slots_merge_preserves_occupancy() {
        let store = MemoryStore::new();
        let mut booked = meeting("a", 2026, 3, 7);
        booked.slots[0].occupant = crate::models::meeting::Occupant::Manual {
            display_name: "Guest".into(),
        };
        store.upsert_meeting(booked.clone(), MergePolicy::InsertOnly).await.unwrap();

        let outcome = store
            .upsert_meeting(meeting("a", 2026, 3, 7), MergePolicy::KeepSlots)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Merged);
        assert_eq!(store.get_meeting("a").await.unwrap().unwrap().value, booked);

        let dup = store.upsert_meeting(meeting("a", 2026, 3, 7), MergePolicy::InsertOnly).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn recreated_meeting_rejects_old_snapshot() {
        let store = MemoryStore::new();
        store
            .upsert_meeting(meeting("2026-10-24", 2026, 10, 24), MergePolicy::InsertOnly)
            .await
            .unwrap();
        let stale = store.get_meeting("2026-10-24").await.unwrap().unwrap();

        store.delete_all().await.unwrap();
        let mut fresh = meeting("2026-10-24", 2026, 10, 24);
        fresh.slots = vec![Slot::empty("Speaker 1"), Slot::empty("Speaker 2")];
        store.upsert_meeting(fresh.clone(), MergePolicy::InsertOnly).await.unwrap();

        let mut claimed = stale.value.clone();
        claimed.slots[0].occupant = crate::models::meeting::Occupant::Member {
            member_id: "u".into(),
            display_name: "U".into(),
        };
        let result = store
            .commit(Transaction::new().put_meeting(stale.version, claimed))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.get_meeting("2026-10-24").await.unwrap().unwrap().value, fresh);

        assert!(store.delete_meeting("2026-10-24").await.unwrap());
        store.upsert_meeting(fresh, MergePolicy::InsertOnly).await.unwrap();
        let again = store.get_meeting("2026-10-24").await.unwrap().unwrap();
        assert!(again.version > stale.version);
    }

    #[tokio::test]
    async fn queries_order_by_schedule() {
        let store = MemoryStore::new();
        for (id, d) in [("b", 14), ("a", 7), ("c", 21)] {
            store
                .upsert_meeting(meeting(id, 2026, 3, d), MergePolicy::InsertOnly)
                .await
                .unwrap();
        }
        let from = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let asc: Vec<String> = store
            .query_meetings_from(from, SortOrder::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(asc, vec!["b", "c"]);

        let latest = store.query_latest_meeting().await.unwrap().unwrap();
        assert_eq!(latest.id, "c");
        assert_eq!(store.delete_all().await.unwrap(), 3);
        assert!(store.query_latest_meeting().await.unwrap().is_none());
    }
}
