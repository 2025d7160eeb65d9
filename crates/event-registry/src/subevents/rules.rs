use super::constraints::ConstraintViolation;
use super::domain::{Subevent, SubeventDraft, SubeventId, SubeventOption};

/// Reasons the administrative form rejects a draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubeventRuleViolation {
    #[error("subevent name must not be empty")]
    EmptyName,
    #[error("a subevent named '{0}' already exists")]
    DuplicateName(String),
    #[error("capacity {capacity} is lower than the {occupancy} registered participant(s)")]
    CapacityBelowOccupancy { capacity: u32, occupancy: u32 },
    #[error("subevent {0} cannot be related to itself")]
    SelfRelation(SubeventId),
    #[error("{}", .0.summary())]
    RelationCollision(ConstraintViolation),
}

/// Field-level checks from the subevent form. Relation consistency is checked separately
/// because it needs the whole catalog graph.
pub(crate) fn check_draft(
    subject: Option<&Subevent>,
    draft: &SubeventDraft,
    catalog: &[Subevent],
) -> Result<(), SubeventRuleViolation> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(SubeventRuleViolation::EmptyName);
    }

    let subject_id = subject.map(|subevent| subevent.id);
    if catalog
        .iter()
        .filter(|other| Some(other.id) != subject_id)
        .any(|other| other.name == name)
    {
        return Err(SubeventRuleViolation::DuplicateName(name.to_string()));
    }

    if let (Some(capacity), Some(subevent)) = (draft.capacity, subject) {
        if capacity < subevent.occupancy {
            return Err(SubeventRuleViolation::CapacityBelowOccupancy {
                capacity,
                occupancy: subevent.occupancy,
            });
        }
    }

    if let Some(id) = subject_id {
        if draft.incompatible.contains(&id) || draft.required.contains(&id) {
            return Err(SubeventRuleViolation::SelfRelation(id));
        }
    }

    Ok(())
}

/// Options for the relation multi-selects, ordered by name and never offering the subject.
pub(crate) fn relation_options(
    catalog: &[Subevent],
    subject: Option<&SubeventId>,
    with_capacity: bool,
) -> Vec<SubeventOption> {
    let mut candidates: Vec<&Subevent> = catalog
        .iter()
        .filter(|subevent| Some(&subevent.id) != subject)
        .collect();
    candidates.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
    candidates
        .into_iter()
        .map(|subevent| subevent.option(with_capacity))
        .collect()
}
