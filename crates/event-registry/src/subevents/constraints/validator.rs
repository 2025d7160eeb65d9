use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::super::domain::SubeventId;
use super::super::repository::{RepositoryError, SubeventRepository};
use super::graph::{RelationGraph, RelationNode};
use super::ConstraintViolation;

/// Decides whether a proposed relation edit keeps the whole catalog consistent.
pub struct SubeventConstraintValidator<R> {
    repository: Arc<R>,
}

impl<R> SubeventConstraintValidator<R>
where
    R: SubeventRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// `subject` is `None` when the edit creates a new subevent.
    pub fn is_consistent(
        &self,
        subject: Option<&SubeventId>,
        incompatible: &BTreeSet<SubeventId>,
        required: &BTreeSet<SubeventId>,
    ) -> Result<bool, ConstraintCheckError> {
        Ok(self
            .find_violation(subject, incompatible, required)?
            .is_none())
    }

    pub fn find_violation(
        &self,
        subject: Option<&SubeventId>,
        incompatible: &BTreeSet<SubeventId>,
        required: &BTreeSet<SubeventId>,
    ) -> Result<Option<ConstraintViolation>, ConstraintCheckError> {
        let node = match subject {
            Some(id) => {
                self.repository
                    .fetch(id)?
                    .ok_or(RepositoryError::NotFound(*id))?;
                RelationNode::Stored(*id)
            }
            None => RelationNode::Pending,
        };

        self.repository.fetch_many(incompatible)?;
        self.repository.fetch_many(required)?;

        let catalog = self.repository.all()?;
        let violation = RelationGraph::snapshot(&catalog)
            .with_override(node, incompatible, required)
            .first_violation();

        debug!(
            subject = %node,
            subevents = catalog.len(),
            consistent = violation.is_none(),
            "checked subevent relations"
        );

        Ok(violation)
    }
}

/// Failures that prevent the check from reaching a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintCheckError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
