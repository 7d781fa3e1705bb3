use std::fmt;

use crate::store::StoreError;

/// Coarse classification used by callers to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    InvalidState,
    InvalidInput,
    UpstreamUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    MeetingNotFound(String),
    SlotIndexOutOfRange { meeting_id: String, index: usize, len: usize },
    MeetingNotPublished(String),
    SlotAlreadyTaken { meeting_id: String, index: usize },
    /// The slot at the addressed index no longer carries the expected role.
    SlotChanged { meeting_id: String, index: usize, expected: String, found: String },
    SlotNotOccupied { meeting_id: String, index: usize },
    Unauthorized(String),
    /// Optimistic retries exhausted.
    Conflict(String),
    InvalidInput(String),
    Upstream(String),
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::MeetingNotFound(_) | ReservationError::SlotIndexOutOfRange { .. } => {
                ErrorKind::NotFound
            }
            ReservationError::SlotAlreadyTaken { .. }
            | ReservationError::SlotChanged { .. }
            | ReservationError::Conflict(_) => ErrorKind::Conflict,
            ReservationError::Unauthorized(_) => ErrorKind::Unauthorized,
            ReservationError::MeetingNotPublished(_) | ReservationError::SlotNotOccupied { .. } => {
                ErrorKind::InvalidState
            }
            ReservationError::InvalidInput(_) => ErrorKind::InvalidInput,
            ReservationError::Upstream(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// Short message suitable for showing to the member.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReservationError::MeetingNotFound(_) => "This meeting does not exist.",
            ReservationError::SlotIndexOutOfRange { .. } => "This role does not exist.",
            ReservationError::MeetingNotPublished(_) => "This meeting is not open for booking yet.",
            ReservationError::SlotAlreadyTaken { .. }
            | ReservationError::SlotChanged { .. }
            | ReservationError::Conflict(_) => "This slot is no longer available. Please refresh.",
            ReservationError::SlotNotOccupied { .. } => "This role is not booked.",
            ReservationError::Unauthorized(_) => "You may not cancel this role.",
            ReservationError::InvalidInput(_) => "The request was not valid.",
            ReservationError::Upstream(_) => "The service is temporarily unavailable. Please try again.",
        }
    }
}

impl fmt::Display for ReservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationError::MeetingNotFound(id) => write!(f, "Meeting {id} not found"),
            ReservationError::SlotIndexOutOfRange { meeting_id, index, len } => {
                write!(f, "Slot {index} out of range for meeting {meeting_id} ({len} slots)")
            }
            ReservationError::MeetingNotPublished(id) => write!(f, "Meeting {id} is not published"),
            ReservationError::SlotAlreadyTaken { meeting_id, index } => {
                write!(f, "Slot {index} of meeting {meeting_id} is already taken")
            }
            ReservationError::SlotChanged { meeting_id, index, expected, found } => write!(
                f,
                "Slot {index} of meeting {meeting_id} is '{found}', expected '{expected}'"
            ),
            ReservationError::SlotNotOccupied { meeting_id, index } => {
                write!(f, "Slot {index} of meeting {meeting_id} is not occupied")
            }
            ReservationError::Unauthorized(e) => write!(f, "Unauthorized: {e}"),
            ReservationError::Conflict(e) => write!(f, "Conflict: {e}"),
            ReservationError::InvalidInput(e) => write!(f, "Invalid input: {e}"),
            ReservationError::Upstream(e) => write!(f, "Upstream unavailable: {e}"),
        }
    }
}

impl std::error::Error for ReservationError {}

impl From<StoreError> for ReservationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(e) => ReservationError::Conflict(e),
            StoreError::Unavailable(e) => ReservationError::Upstream(e),
        }
    }
}
