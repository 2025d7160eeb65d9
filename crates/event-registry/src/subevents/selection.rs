use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::constraints::{RelationGraph, RelationNode};
use super::domain::{Subevent, SubeventId};
use super::repository::RepositoryError;

/// Two selected subevents that cannot be held together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConflict {
    pub first: SubeventId,
    pub second: SubeventId,
}

/// A selected subevent whose requirement was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequirement {
    pub subevent: SubeventId,
    pub required: SubeventId,
}

/// Outcome of checking a participant's subevent choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionReport {
    pub conflicts: Vec<SelectionConflict>,
    pub missing: Vec<MissingRequirement>,
    pub full: Vec<SubeventId>,
    pub total_fee: u64,
}

impl SelectionReport {
    pub fn is_acceptable(&self) -> bool {
        self.conflicts.is_empty() && self.missing.is_empty() && self.full.is_empty()
    }
}

pub(crate) fn evaluate(
    catalog: &[Subevent],
    selected: &BTreeSet<SubeventId>,
) -> Result<SelectionReport, RepositoryError> {
    let by_id: BTreeMap<SubeventId, &Subevent> = catalog
        .iter()
        .map(|subevent| (subevent.id, subevent))
        .collect();

    let chosen = selected
        .iter()
        .map(|id| by_id.get(id).copied().ok_or(RepositoryError::NotFound(*id)))
        .collect::<Result<Vec<_>, _>>()?;

    let graph = RelationGraph::snapshot(catalog);
    let mut conflicts = BTreeSet::new();
    let mut report = SelectionReport::default();

    for subevent in &chosen {
        for other in subevent.incompatible.intersection(selected) {
            if *other == subevent.id {
                continue;
            }
            let pair = if subevent.id < *other {
                (subevent.id, *other)
            } else {
                (*other, subevent.id)
            };
            conflicts.insert(pair);
        }

        // The graph drops unknown ids; direct requirements are merged back in.
        let mut required: BTreeSet<SubeventId> = subevent.required.clone();
        required.extend(
            graph
                .required_closure(RelationNode::Stored(subevent.id))
                .into_iter()
                .filter_map(|node| match node {
                    RelationNode::Stored(id) => Some(id),
                    RelationNode::Pending => None,
                }),
        );
        for required in required.difference(selected) {
            if *required != subevent.id {
                report.missing.push(MissingRequirement {
                    subevent: subevent.id,
                    required: *required,
                });
            }
        }

        if subevent.is_full() {
            report.full.push(subevent.id);
        }

        report.total_fee += u64::from(subevent.fee);
    }

    report.conflicts = conflicts
        .into_iter()
        .map(|(first, second)| SelectionConflict { first, second })
        .collect();

    Ok(report)
}
