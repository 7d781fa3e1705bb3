use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Longest role name accepted from administrators and cadence templates.
pub const MAX_ROLE_LEN: usize = 100;

/// Longest occupant name an administrator may enter by hand.
pub const MAX_NAME_LEN: usize = 100;

/// Who currently holds a slot.
///
/// A slot is either free, held by a verified member, or filled in by hand by an
/// administrator. Only `Member` occupants take part in role-history bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occupant {
    #[default]
    Unclaimed,
    Member {
        member_id: String,
        display_name: String,
    },
    Manual {
        display_name: String,
    },
}

impl Occupant {
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Occupant::Unclaimed)
    }

    /// The member id when the occupant is backed by an identity.
    pub fn member_id(&self) -> Option<&str> {
        match self {
            Occupant::Member { member_id, .. } => Some(member_id),
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Occupant::Unclaimed => None,
            Occupant::Member { display_name, .. } | Occupant::Manual { display_name } => {
                Some(display_name)
            }
        }
    }
}

/// A single named role within a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub role: String,
    #[serde(default)]
    pub occupant: Occupant,
}

impl Slot {
    pub fn empty(role: impl Into<String>) -> Self {
        Slot {
            role: role.into(),
            occupant: Occupant::Unclaimed,
        }
    }
}

/// A scheduled club meeting and its ordered slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub scheduled_at: NaiveDateTime,
    pub published: bool,
    pub slots: Vec<Slot>,
}

impl Meeting {
    pub fn date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    /// Long form used in notices, e.g. "Saturday, 14 March 2026".
    pub fn display_date(&self) -> String {
        self.scheduled_at.format("%A, %-d %B %Y").to_string()
    }

    pub fn open_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.occupant.is_claimed()).count()
    }
}

/// Meeting identifiers are the ISO calendar date, so regenerating a date
/// always addresses the same document.
pub fn meeting_id_for(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Trim and check a role name. Returns the cleaned name or a reason.
pub fn normalize_role(raw: &str) -> Result<String, String> {
    let role = raw.trim();
    if role.is_empty() {
        return Err("Role name must not be empty".to_string());
    }
    if role.chars().count() > MAX_ROLE_LEN {
        return Err(format!("Role name must be at most {MAX_ROLE_LEN} characters"));
    }
    Ok(role.to_string())
}

/// Trim and check a hand-entered occupant name. Empty is allowed and means
/// "clear the slot".
pub fn normalize_display_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Name must be at most {MAX_NAME_LEN} characters"));
    }
    if name.chars().any(char::is_control) {
        return Err("Name must not contain control characters".to_string());
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn meeting_id_is_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(meeting_id_for(date), "2026-03-14");
    }

    #[test]
    fn display_date_is_long_form() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let meeting = Meeting {
            id: "2026-03-14".into(),
            scheduled_at: at,
            published: true,
            slots: vec![Slot::empty("Timer")],
        };
        assert_eq!(meeting.display_date(), "Saturday, 14 March 2026");
        assert_eq!(meeting.open_slot_count(), 1);
    }

    #[test]
    fn occupant_serializes_as_tagged_variant() {
        let occ = Occupant::Manual { display_name: "Guest".into() };
        let json = serde_json::to_value(&occ).unwrap();
        assert_eq!(json["kind"], "manual");
        assert_eq!(json["display_name"], "Guest");
        assert_eq!(occ.member_id(), None);
    }

    #[test]
    fn role_names_are_trimmed_and_bounded() {
        assert_eq!(normalize_role("  Timer ").unwrap(), "Timer");
        assert!(normalize_role("   ").is_err());
        assert!(normalize_role(&"x".repeat(MAX_ROLE_LEN + 1)).is_err());
    }

    #[test]
    fn display_names_are_trimmed_and_bounded() {
        assert_eq!(normalize_display_name(" Guest Gary ").unwrap(), "Guest Gary");
        assert_eq!(normalize_display_name("   ").unwrap(), "");
        assert!(normalize_display_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(normalize_display_name("Gary\nBcc: x").is_err());
    }
}
