use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog subevents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubeventId(pub u32);

impl fmt::Display for SubeventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Independently priced and capacitated sub-track of the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subevent {
    pub id: SubeventId,
    pub name: String,
    /// `None` means unlimited.
    #[serde(default)]
    pub capacity: Option<u32>,
    pub fee: u32,
    /// Registered participants.
    #[serde(default)]
    pub occupancy: u32,
    /// Symmetric: a participant may not hold both subevents.
    #[serde(default)]
    pub incompatible: BTreeSet<SubeventId>,
    /// Directed: holding this subevent implies holding every target.
    #[serde(default)]
    pub required: BTreeSet<SubeventId>,
}

impl Subevent {
    pub fn has_limited_capacity(&self) -> bool {
        self.capacity.is_some()
    }

    pub fn unoccupied(&self) -> Option<u32> {
        self.capacity.map(|capacity| capacity.saturating_sub(self.occupancy))
    }

    pub fn is_full(&self) -> bool {
        self.unoccupied() == Some(0)
    }

    /// Replace the editable fields, keeping identity and occupancy.
    pub fn apply(&mut self, draft: SubeventDraft) {
        self.name = draft.name.trim().to_string();
        self.capacity = draft.capacity;
        self.fee = draft.fee;
        self.incompatible = draft.incompatible;
        self.required = draft.required;
    }

    pub(crate) fn option(&self, with_capacity: bool) -> SubeventOption {
        let label = match (with_capacity, self.capacity) {
            (true, Some(capacity)) => format!("{} ({}/{})", self.name, self.occupancy, capacity),
            _ => self.name.clone(),
        };

        SubeventOption { id: self.id, label }
    }
}

/// Administrative form payload; relation sets replace the stored ones wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubeventDraft {
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    pub fee: u32,
    #[serde(default)]
    pub incompatible: BTreeSet<SubeventId>,
    #[serde(default)]
    pub required: BTreeSet<SubeventId>,
}

/// Entry offered by relation multi-selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubeventOption {
    pub id: SubeventId,
    pub label: String,
}
