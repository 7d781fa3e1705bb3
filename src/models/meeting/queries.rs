use chrono::NaiveDate;
use serde::Serialize;

use crate::store::{MeetingStore, SortOrder, StoreError};

use super::types::*;

/// One slot a member currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub meeting_id: String,
    pub meeting_date: String,
    pub slot_index: usize,
    pub role: String,
}

/// Meetings dated on or after `today`, soonest first.
///
/// Unpublished meetings are only returned when `include_unpublished` is set
/// (administrators).
pub async fn find_upcoming<S: MeetingStore>(
    store: &S,
    today: NaiveDate,
    include_unpublished: bool,
) -> Result<Vec<Meeting>, StoreError> {
    let meetings = store.query_meetings_from(today, SortOrder::Ascending).await?;
    Ok(meetings
        .into_iter()
        .filter(|m| include_unpublished || m.published)
        .collect())
}

/// Find a meeting by id, hiding unpublished meetings from members.
pub async fn find_visible<S: MeetingStore>(
    store: &S,
    id: &str,
    include_unpublished: bool,
) -> Result<Option<Meeting>, StoreError> {
    Ok(store
        .get_meeting(id)
        .await?
        .map(|snap| snap.value)
        .filter(|m| include_unpublished || m.published))
}

/// Slots held by `member_id` in meetings from `today` on.
pub async fn find_bookings_for<S: MeetingStore>(
    store: &S,
    member_id: &str,
    today: NaiveDate,
) -> Result<Vec<Booking>, StoreError> {
    let meetings = store.query_meetings_from(today, SortOrder::Ascending).await?;
    let mut bookings = Vec::new();
    for meeting in &meetings {
        for (idx, slot) in meeting.slots.iter().enumerate() {
            if slot.occupant.member_id() == Some(member_id) {
                bookings.push(Booking {
                    meeting_id: meeting.id.clone(),
                    meeting_date: meeting.display_date(),
                    slot_index: idx,
                    role: slot.role.clone(),
                });
            }
        }
    }
    Ok(bookings)
}
