//! Relation consistency for the subevent catalog.
//!
//! A catalog is consistent when no subevent transitively requires a subevent it is incompatible
//! with. Edits are checked against an in-memory snapshot, so nothing is staged in storage while
//! the check runs.

mod graph;
mod validator;

pub use graph::{RelationGraph, RelationNode};
pub use validator::{ConstraintCheckError, SubeventConstraintValidator};

use serde::{Deserialize, Serialize};

/// Subevent whose required closure reaches one of its incompatible subevents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub subevent: RelationNode,
    pub subevent_name: String,
    pub conflicting: RelationNode,
    pub conflicting_name: String,
    /// `false` when the requirement is only reached through other subevents.
    pub direct: bool,
}

impl ConstraintViolation {
    pub fn summary(&self) -> String {
        let reach = if self.direct {
            "requires"
        } else {
            "transitively requires"
        };
        format!(
            "'{}' {} '{}' but is incompatible with it",
            self.subevent_name, reach, self.conflicting_name
        )
    }
}
