//! Claim and release of meeting slots.
//!
//! Every mutation reads a versioned snapshot, validates it, and commits
//! conditional on that version. A version conflict re-runs the cycle up to
//! `EngineConfig::max_attempts` times, with a short sleep in between, before
//! surfacing `Conflict`; the re-read turns a lost race into `SlotAlreadyTaken`.

mod error;

pub use error::{ErrorKind, ReservationError};

use std::time::Duration;

use serde::Serialize;

use crate::auth::Caller;
use crate::models::meeting::{Meeting, Occupant, Slot, normalize_display_name, normalize_role};
use crate::models::member::MemberRecord;
use crate::notify::{self, NotificationSink, messages};
use crate::store::{MeetingStore, StoreError, Transaction, Version, Versioned};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Receives booking reports and self-initiated cancellations.
    pub admin_email: Option<String>,
    pub max_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            admin_email: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimReceipt {
    pub meeting_id: String,
    pub slot_index: usize,
    pub role: String,
    pub meeting_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseReceipt {
    pub meeting_id: String,
    pub slot_index: usize,
    pub role: String,
    pub released: Occupant,
    pub by_admin: bool,
}

pub struct ReservationEngine<S, N> {
    store: S,
    sink: N,
    config: EngineConfig,
}

fn slot_at<'a>(meeting: &'a Meeting, index: usize) -> Result<&'a Slot, ReservationError> {
    meeting
        .slots
        .get(index)
        .ok_or_else(|| ReservationError::SlotIndexOutOfRange {
            meeting_id: meeting.id.clone(),
            index,
            len: meeting.slots.len(),
        })
}

/// Short pause before re-reading after a lost race, growing per attempt.
async fn backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 2)).await;
}

fn require_admin(caller: &Caller, action: &str) -> Result<(), ReservationError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ReservationError::Unauthorized(format!(
            "{} may not {}",
            caller.member_id, action
        )))
    }
}

impl<S: MeetingStore, N: NotificationSink> ReservationEngine<S, N> {
    pub fn new(store: S, sink: N, config: EngineConfig) -> Self {
        ReservationEngine { store, sink, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    async fn load_meeting(&self, meeting_id: &str) -> Result<Versioned<Meeting>, ReservationError> {
        self.store
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| ReservationError::MeetingNotFound(meeting_id.to_string()))
    }

    /// Claim slot `slot_index` of `meeting_id` for `caller`.
    ///
    /// `role_name` must match the role currently at that index; a mismatch
    /// means the caller is looking at a stale agenda.
    pub async fn claim(
        &self,
        meeting_id: &str,
        slot_index: usize,
        caller: &Caller,
        role_name: &str,
    ) -> Result<ClaimReceipt, ReservationError> {
        let role_name = role_name.trim();
        for attempt in 1..=self.attempts() {
            let snap = self.load_meeting(meeting_id).await?;
            if !snap.value.published && !caller.is_admin {
                return Err(ReservationError::MeetingNotPublished(meeting_id.to_string()));
            }
            let slot = slot_at(&snap.value, slot_index)?;
            if slot.role != role_name {
                return Err(ReservationError::SlotChanged {
                    meeting_id: meeting_id.to_string(),
                    index: slot_index,
                    expected: role_name.to_string(),
                    found: slot.role.clone(),
                });
            }
            if slot.occupant.is_claimed() {
                return Err(ReservationError::SlotAlreadyTaken {
                    meeting_id: meeting_id.to_string(),
                    index: slot_index,
                });
            }

            let (member_version, mut record) = match self.store.get_member(&caller.member_id).await? {
                Some(found) => (found.version, found.value),
                None => (
                    Version::ABSENT,
                    MemberRecord::new(&caller.member_id, &caller.display_name, &caller.email),
                ),
            };
            record.display_name = caller.display_name.clone();
            if !caller.email.is_empty() {
                record.email = caller.email.clone();
            }
            record.record_role(role_name);

            let mut meeting = snap.value;
            meeting.slots[slot_index].occupant = Occupant::Member {
                member_id: caller.member_id.clone(),
                display_name: caller.display_name.clone(),
            };
            let meeting_date = meeting.display_date();
            let tx = Transaction::new()
                .put_meeting(snap.version, meeting)
                .put_member(member_version, record);

            match self.store.commit(tx).await {
                Ok(()) => {
                    log::info!(
                        "Slot {} ({}) of {} claimed by {}",
                        slot_index, role_name, meeting_id, caller.member_id
                    );
                    self.notify_claimed(caller, role_name, &meeting_date);
                    return Ok(ClaimReceipt {
                        meeting_id: meeting_id.to_string(),
                        slot_index,
                        role: role_name.to_string(),
                        meeting_date,
                    });
                }
                Err(StoreError::Conflict(reason)) => {
                    log::debug!("Claim attempt {} on {} lost a race: {}", attempt, meeting_id, reason);
                    backoff(attempt).await;
                }
                Err(e) => {
                    log::error!("Claim on {} failed: {}", meeting_id, e);
                    return Err(e.into());
                }
            }
        }
        Err(ReservationError::Conflict(format!(
            "slot {slot_index} of {meeting_id} kept changing"
        )))
    }

    /// Release a slot. Allowed for its occupant and for administrators.
    pub async fn release(
        &self,
        meeting_id: &str,
        slot_index: usize,
        caller: &Caller,
    ) -> Result<ReleaseReceipt, ReservationError> {
        for attempt in 1..=self.attempts() {
            let snap = self.load_meeting(meeting_id).await?;
            let slot = slot_at(&snap.value, slot_index)?;
            let self_initiated = match &slot.occupant {
                Occupant::Unclaimed => {
                    return Err(ReservationError::SlotNotOccupied {
                        meeting_id: meeting_id.to_string(),
                        index: slot_index,
                    });
                }
                Occupant::Member { member_id, .. } => *member_id == caller.member_id,
                Occupant::Manual { .. } => false,
            };
            if !self_initiated && !caller.is_admin {
                return Err(ReservationError::Unauthorized(format!(
                    "{} does not hold slot {} of {}",
                    caller.member_id, slot_index, meeting_id
                )));
            }

            let role = slot.role.clone();
            let displaced = slot.occupant.clone();
            let mut meeting = snap.value;
            meeting.slots[slot_index].occupant = Occupant::Unclaimed;
            let meeting_date = meeting.display_date();
            let mut tx = Transaction::new().put_meeting(snap.version, meeting);

            // The role leaves the history of whoever is displaced, which is
            // not the requester when an administrator cancels.
            let mut displaced_email = None;
            if let Some(member_id) = displaced.member_id() {
                match self.store.get_member(member_id).await? {
                    Some(found) => {
                        let mut record = found.value;
                        if !record.forget_role(&role) {
                            log::warn!("Member {} had no '{}' in their role history", member_id, role);
                        }
                        displaced_email = Some(record.email.clone());
                        tx = tx.put_member(found.version, record);
                    }
                    None => log::warn!("No member record for {} while releasing {}", member_id, meeting_id),
                }
            }

            match self.store.commit(tx).await {
                Ok(()) => {
                    log::info!(
                        "Slot {} ({}) of {} released by {}",
                        slot_index, role, meeting_id, caller.member_id
                    );
                    if let Some(email) = displaced_email {
                        self.notify_released(&displaced, &email, &role, &meeting_date, self_initiated);
                    }
                    return Ok(ReleaseReceipt {
                        meeting_id: meeting_id.to_string(),
                        slot_index,
                        role,
                        released: displaced,
                        by_admin: !self_initiated,
                    });
                }
                Err(StoreError::Conflict(reason)) => {
                    log::debug!("Release attempt {} on {} lost a race: {}", attempt, meeting_id, reason);
                    backoff(attempt).await;
                }
                Err(e) => {
                    log::error!("Release on {} failed: {}", meeting_id, e);
                    return Err(e.into());
                }
            }
        }
        Err(ReservationError::Conflict(format!(
            "slot {slot_index} of {meeting_id} kept changing"
        )))
    }

    /// Set or clear a slot's occupant by hand, bypassing ownership checks.
    ///
    /// A non-empty name becomes a `Manual` occupant unless the slot is already
    /// held by a member of exactly that name. Names are bounded like role
    /// names (`InvalidInput`). Role history is not touched.
    pub async fn admin_override_assign(
        &self,
        meeting_id: &str,
        slot_index: usize,
        caller: &Caller,
        display_name: &str,
    ) -> Result<Slot, ReservationError> {
        require_admin(caller, "assign slots")?;
        let name = normalize_display_name(display_name).map_err(ReservationError::InvalidInput)?;
        let result = self
            .edit_slots(meeting_id, |slots| {
                let len = slots.len();
                let slot = slots.get_mut(slot_index).ok_or_else(|| {
                    ReservationError::SlotIndexOutOfRange {
                        meeting_id: meeting_id.to_string(),
                        index: slot_index,
                        len,
                    }
                })?;
                slot.occupant = if name.is_empty() {
                    Occupant::Unclaimed
                } else {
                    match &slot.occupant {
                        Occupant::Member { display_name, .. } if *display_name == name => {
                            slot.occupant.clone()
                        }
                        _ => Occupant::Manual { display_name: name.clone() },
                    }
                };
                Ok(slot.clone())
            })
            .await?;
        log::info!(
            "Slot {} of {} set by {} to {:?}",
            slot_index, meeting_id, caller.member_id, result.occupant
        );
        Ok(result)
    }

    /// Append an empty slot for `role`.
    pub async fn add_slot(
        &self,
        meeting_id: &str,
        caller: &Caller,
        role: &str,
    ) -> Result<usize, ReservationError> {
        require_admin(caller, "edit the agenda")?;
        let role = normalize_role(role).map_err(ReservationError::InvalidInput)?;
        let index = self
            .edit_slots(meeting_id, |slots| {
                slots.push(Slot::empty(role.clone()));
                Ok(slots.len() - 1)
            })
            .await?;
        log::info!("Role '{}' added to {} at {}", role, meeting_id, index);
        Ok(index)
    }

    /// Remove the slot at `slot_index`, which must still carry `expected_role`.
    pub async fn remove_slot(
        &self,
        meeting_id: &str,
        slot_index: usize,
        caller: &Caller,
        expected_role: &str,
    ) -> Result<Slot, ReservationError> {
        require_admin(caller, "edit the agenda")?;
        let expected_role = expected_role.trim();
        let removed = self
            .edit_slots(meeting_id, |slots| {
                let slot = slots.get(slot_index).ok_or_else(|| {
                    ReservationError::SlotIndexOutOfRange {
                        meeting_id: meeting_id.to_string(),
                        index: slot_index,
                        len: slots.len(),
                    }
                })?;
                if slot.role != expected_role {
                    return Err(ReservationError::SlotChanged {
                        meeting_id: meeting_id.to_string(),
                        index: slot_index,
                        expected: expected_role.to_string(),
                        found: slot.role.clone(),
                    });
                }
                Ok(slots.remove(slot_index))
            })
            .await?;
        log::info!("Role '{}' removed from {}", removed.role, meeting_id);
        Ok(removed)
    }

    /// Rename the role at `slot_index`. The occupant stays.
    pub async fn rename_slot(
        &self,
        meeting_id: &str,
        slot_index: usize,
        caller: &Caller,
        new_role: &str,
    ) -> Result<Slot, ReservationError> {
        require_admin(caller, "edit the agenda")?;
        let new_role = normalize_role(new_role).map_err(ReservationError::InvalidInput)?;
        self.edit_slots(meeting_id, |slots| {
            let len = slots.len();
            let slot = slots.get_mut(slot_index).ok_or_else(|| {
                ReservationError::SlotIndexOutOfRange {
                    meeting_id: meeting_id.to_string(),
                    index: slot_index,
                    len,
                }
            })?;
            slot.role = new_role.clone();
            Ok(slot.clone())
        })
        .await
    }

    pub async fn set_published(
        &self,
        meeting_id: &str,
        caller: &Caller,
        published: bool,
    ) -> Result<Meeting, ReservationError> {
        require_admin(caller, "publish meetings")?;
        for attempt in 1..=self.attempts() {
            let snap = self.load_meeting(meeting_id).await?;
            let mut meeting = snap.value;
            if meeting.published == published {
                return Ok(meeting);
            }
            meeting.published = published;
            match self
                .store
                .commit(Transaction::new().put_meeting(snap.version, meeting.clone()))
                .await
            {
                Ok(()) => {
                    log::info!("Meeting {} published={}", meeting_id, published);
                    return Ok(meeting);
                }
                Err(StoreError::Conflict(_)) => backoff(attempt).await,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ReservationError::Conflict(format!("meeting {meeting_id} kept changing")))
    }

    /// Apply `edit` to a copy of the meeting's slots and write them back
    /// conditional on the version that was read.
    async fn edit_slots<T>(
        &self,
        meeting_id: &str,
        mut edit: impl FnMut(&mut Vec<Slot>) -> Result<T, ReservationError>,
    ) -> Result<T, ReservationError> {
        for attempt in 1..=self.attempts() {
            let snap = self.load_meeting(meeting_id).await?;
            let mut slots = snap.value.slots;
            let out = edit(&mut slots)?;
            match self.store.update_meeting_slots(meeting_id, snap.version, slots).await {
                Ok(()) => return Ok(out),
                Err(StoreError::Conflict(reason)) => {
                    log::debug!("Slot edit attempt {} on {} conflicted: {}", attempt, meeting_id, reason);
                    backoff(attempt).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ReservationError::Conflict(format!("meeting {meeting_id} kept changing")))
    }

    fn notify_claimed(&self, caller: &Caller, role: &str, meeting_date: &str) {
        let msg = messages::booking_confirmed(&caller.display_name, role, meeting_date);
        notify::dispatch(&self.sink, &caller.email, &msg);

        if let Some(admin) = &self.config.admin_email {
            let report = messages::booking_report(&caller.display_name, role, meeting_date);
            notify::dispatch(&self.sink, admin, &report);
        }
    }

    fn notify_released(
        &self,
        displaced: &Occupant,
        email: &str,
        role: &str,
        meeting_date: &str,
        self_initiated: bool,
    ) {
        let name = displaced.display_name().unwrap_or("Member");
        let msg = messages::booking_cancelled(name, role, meeting_date, !self_initiated);
        notify::dispatch(&self.sink, email, &msg);

        if self_initiated {
            if let Some(admin) = &self.config.admin_email {
                notify::dispatch(&self.sink, admin, &msg);
            }
        }
    }
}
