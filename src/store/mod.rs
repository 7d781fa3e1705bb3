//! Versioned document store for meetings and member records.
//!
//! Every document carries a [`Version`] that changes on each write and is never
//! reused, not even after the document is deleted and created again. Writers
//! read a snapshot, compute the new document, and commit it conditional on the
//! version they read; a commit whose expectation no longer holds fails with
//! [`StoreError::Conflict`] and changes nothing.

mod memory;

pub use memory::MemoryStore;

use std::fmt;
use std::future::Future;

use chrono::NaiveDate;

use crate::models::meeting::{Meeting, Slot};
use crate::models::member::MemberRecord;

/// Document version. `Version::ABSENT` means "the document must not exist yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64);

impl Version {
    pub const ABSENT: Version = Version(0);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

/// A document together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: Version,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// What an upsert does when the meeting already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the stored slots and publication flag; refresh the schedule time.
    KeepSlots,
    /// Fail with `Conflict` if the meeting exists.
    InsertOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An expected version did not match; nothing was written.
    Conflict(String),
    /// The backing store could not be reached.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(e) => write!(f, "Write conflict: {e}"),
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A set of conditional writes applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub meetings: Vec<(Version, Meeting)>,
    pub members: Vec<(Version, MemberRecord)>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_meeting(mut self, expected: Version, meeting: Meeting) -> Self {
        self.meetings.push((expected, meeting));
        self
    }

    pub fn put_member(mut self, expected: Version, member: MemberRecord) -> Self {
        self.members.push((expected, member));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty() && self.members.is_empty()
    }
}

/// Storage contract the reservation engine and schedule generator rely on.
pub trait MeetingStore: Send + Sync {
    fn get_meeting(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Versioned<Meeting>>, StoreError>> + Send;

    fn get_member(
        &self,
        member_id: &str,
    ) -> impl Future<Output = Result<Option<Versioned<MemberRecord>>, StoreError>> + Send;

    fn upsert_meeting(
        &self,
        meeting: Meeting,
        policy: MergePolicy,
    ) -> impl Future<Output = Result<UpsertOutcome, StoreError>> + Send;

    fn delete_meeting(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Remove every meeting. Returns how many were removed.
    fn delete_all(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Meetings dated on or after `from`.
    fn query_meetings_from(
        &self,
        from: NaiveDate,
        order: SortOrder,
    ) -> impl Future<Output = Result<Vec<Meeting>, StoreError>> + Send;

    /// The meeting with the latest `scheduled_at`, if any.
    fn query_latest_meeting(
        &self,
    ) -> impl Future<Output = Result<Option<Meeting>, StoreError>> + Send;

    /// Apply all writes in `tx` or none of them.
    fn commit(&self, tx: Transaction) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace a meeting's slots if it is still at `expected`.
    fn update_meeting_slots(
        &self,
        id: &str,
        expected: Version,
        slots: Vec<Slot>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let current = self
                .get_meeting(id)
                .await?
                .ok_or_else(|| StoreError::Conflict(format!("meeting {id} no longer exists")))?;
            let mut meeting = current.value;
            meeting.slots = slots;
            self.commit(Transaction::new().put_meeting(expected, meeting)).await
        }
    }
}
