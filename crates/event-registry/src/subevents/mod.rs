//! Subevent catalog: domain, storage seam, relation constraints, form rules, and
//! participant selection checks, exposed through [`SubeventService`] and its router.

pub mod constraints;
pub mod domain;
pub mod repository;
pub mod router;
pub(crate) mod rules;
pub mod selection;
pub mod service;

#[cfg(test)]
mod tests;

pub use constraints::{
    ConstraintCheckError, ConstraintViolation, RelationGraph, RelationNode,
    SubeventConstraintValidator,
};
pub use domain::{Subevent, SubeventDraft, SubeventId, SubeventOption};
pub use repository::{RepositoryError, SubeventRepository};
pub use router::{subevent_router, RelationCheckRequest, SelectionRequest};
pub use rules::SubeventRuleViolation;
pub use selection::{MissingRequirement, SelectionConflict, SelectionReport};
pub use service::{RelationCheck, SubeventService, SubeventServiceError};
