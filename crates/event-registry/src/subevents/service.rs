use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::constraints::{ConstraintCheckError, ConstraintViolation, SubeventConstraintValidator};
use super::domain::{Subevent, SubeventDraft, SubeventId, SubeventOption};
use super::repository::{RepositoryError, SubeventRepository};
use super::rules::{self, SubeventRuleViolation};
use super::selection::{self, SelectionReport};

/// Service composing the form rules, constraint validator, and repository.
pub struct SubeventService<R> {
    repository: Arc<R>,
    validator: SubeventConstraintValidator<R>,
}

/// Result of a dry-run relation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCheck {
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ConstraintViolation>,
}

impl<R> SubeventService<R>
where
    R: SubeventRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        let validator = SubeventConstraintValidator::new(repository.clone());
        Self {
            repository,
            validator,
        }
    }

    pub fn validator(&self) -> &SubeventConstraintValidator<R> {
        &self.validator
    }

    /// Every subevent, ordered by name.
    pub fn list(&self) -> Result<Vec<Subevent>, SubeventServiceError> {
        let mut subevents = self.repository.all()?;
        subevents.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
        Ok(subevents)
    }

    pub fn get(&self, id: &SubeventId) -> Result<Subevent, SubeventServiceError> {
        let subevent = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound(*id))?;
        Ok(subevent)
    }

    pub fn options(
        &self,
        subject: Option<&SubeventId>,
        with_capacity: bool,
    ) -> Result<Vec<SubeventOption>, SubeventServiceError> {
        let catalog = self.repository.all()?;
        Ok(rules::relation_options(&catalog, subject, with_capacity))
    }

    pub fn check_relations(
        &self,
        subject: Option<&SubeventId>,
        incompatible: &BTreeSet<SubeventId>,
        required: &BTreeSet<SubeventId>,
    ) -> Result<RelationCheck, SubeventServiceError> {
        let violation = self
            .validator
            .find_violation(subject, incompatible, required)?;
        Ok(RelationCheck {
            consistent: violation.is_none(),
            violation,
        })
    }

    pub fn create(&self, draft: SubeventDraft) -> Result<Subevent, SubeventServiceError> {
        let catalog = self.repository.all()?;
        rules::check_draft(None, &draft, &catalog)?;
        self.ensure_consistent(None, &draft)?;

        let mut draft = draft;
        draft.name = draft.name.trim().to_string();
        let stored = self.repository.insert(draft)?;
        info!(subevent = %stored.id, name = %stored.name, "subevent created");
        Ok(stored)
    }

    pub fn update(
        &self,
        id: &SubeventId,
        draft: SubeventDraft,
    ) -> Result<Subevent, SubeventServiceError> {
        let mut subevent = self.get(id)?;
        let catalog = self.repository.all()?;
        rules::check_draft(Some(&subevent), &draft, &catalog)?;
        self.ensure_consistent(Some(id), &draft)?;

        subevent.apply(draft);
        self.repository.update(subevent.clone())?;
        info!(subevent = %subevent.id, name = %subevent.name, "subevent updated");
        Ok(subevent)
    }

    pub fn check_selection(
        &self,
        selected: &BTreeSet<SubeventId>,
    ) -> Result<SelectionReport, SubeventServiceError> {
        let catalog = self.repository.all()?;
        let report = selection::evaluate(&catalog, selected)?;
        Ok(report)
    }

    fn ensure_consistent(
        &self,
        subject: Option<&SubeventId>,
        draft: &SubeventDraft,
    ) -> Result<(), SubeventServiceError> {
        match self
            .validator
            .find_violation(subject, &draft.incompatible, &draft.required)?
        {
            None => Ok(()),
            Some(violation) => {
                warn!(
                    subevent = %violation.subevent,
                    conflicting = %violation.conflicting,
                    "rejected subevent relations: {}",
                    violation.summary()
                );
                Err(SubeventRuleViolation::RelationCollision(violation).into())
            }
        }
    }
}

/// Error raised by the subevent service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubeventServiceError {
    #[error(transparent)]
    Rule(#[from] SubeventRuleViolation),
    #[error(transparent)]
    Constraint(#[from] ConstraintCheckError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
