use serde::{Deserialize, Serialize};

/// A member's profile plus the multiset of roles they have held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub role_history: Vec<String>,
}

/// How often a member has held one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: usize,
}

impl MemberRecord {
    pub fn new(member_id: &str, display_name: &str, email: &str) -> Self {
        MemberRecord {
            member_id: member_id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            role_history: Vec::new(),
        }
    }

    pub fn record_role(&mut self, role: &str) {
        self.role_history.push(role.to_string());
    }

    /// Remove one instance of `role`. Returns false if the member never held it.
    pub fn forget_role(&mut self, role: &str) -> bool {
        match self.role_history.iter().position(|r| r == role) {
            Some(pos) => {
                self.role_history.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn total_completed(&self) -> usize {
        self.role_history.len()
    }

    /// Counts per role, most frequent first; ties keep first-seen order.
    pub fn role_counts(&self) -> Vec<RoleCount> {
        let mut counts: Vec<RoleCount> = Vec::new();
        for role in &self.role_history {
            match counts.iter_mut().find(|c| &c.role == role) {
                Some(c) => c.count += 1,
                None => counts.push(RoleCount {
                    role: role.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// The template role this member has held least often.
    ///
    /// Ties resolve to the earliest role in the template, so a new member is
    /// pointed at the first role of the agenda.
    pub fn suggest_next_role<'a>(&self, template: &'a [String]) -> Option<&'a str> {
        template
            .iter()
            .enumerate()
            .min_by_key(|(idx, role)| {
                let held = self.role_history.iter().filter(|r| r == role).count();
                (held, *idx)
            })
            .map(|(_, role)| role.as_str())
    }
}
