use std::collections::BTreeSet;

use super::domain::{Subevent, SubeventDraft, SubeventId};

/// Storage abstraction so the constraint validator and service can run without a database.
pub trait SubeventRepository: Send + Sync {
    fn all(&self) -> Result<Vec<Subevent>, RepositoryError>;
    fn fetch(&self, id: &SubeventId) -> Result<Option<Subevent>, RepositoryError>;
    /// Persist a new subevent, assigning its identifier.
    fn insert(&self, draft: SubeventDraft) -> Result<Subevent, RepositoryError>;
    fn update(&self, subevent: Subevent) -> Result<(), RepositoryError>;

    /// Resolve every identifier, failing on the first unknown one.
    fn fetch_many(&self, ids: &BTreeSet<SubeventId>) -> Result<Vec<Subevent>, RepositoryError> {
        ids.iter()
            .map(|id| self.fetch(id)?.ok_or(RepositoryError::NotFound(*id)))
            .collect()
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("subevent {0} not found")]
    NotFound(SubeventId),
    #[error("subevent already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
