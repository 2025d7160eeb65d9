use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::subevents::domain::{Subevent, SubeventDraft, SubeventId};
use crate::subevents::repository::{RepositoryError, SubeventRepository};
use crate::subevents::{subevent_router, SubeventConstraintValidator, SubeventService};

pub(super) fn ids(raw: &[u32]) -> BTreeSet<SubeventId> {
    raw.iter().copied().map(SubeventId).collect()
}

pub(super) fn subevent(id: u32, name: &str) -> Subevent {
    Subevent {
        id: SubeventId(id),
        name: name.to_string(),
        capacity: None,
        fee: 0,
        occupancy: 0,
        incompatible: BTreeSet::new(),
        required: BTreeSet::new(),
    }
}

pub(super) fn with_relations(
    mut subevent: Subevent,
    incompatible: &[u32],
    required: &[u32],
) -> Subevent {
    subevent.incompatible = ids(incompatible);
    subevent.required = ids(required);
    subevent
}

pub(super) fn draft(name: &str, incompatible: &[u32], required: &[u32]) -> SubeventDraft {
    SubeventDraft {
        name: name.to_string(),
        capacity: None,
        fee: 150,
        incompatible: ids(incompatible),
        required: ids(required),
    }
}

/// Morning (1) and Afternoon (2), unrelated.
pub(super) fn day_catalog() -> Vec<Subevent> {
    vec![subevent(1, "Morning"), subevent(2, "Afternoon")]
}

pub(super) fn validator_for(
    catalog: Vec<Subevent>,
) -> (SubeventConstraintValidator<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::seeded(catalog));
    (SubeventConstraintValidator::new(repository.clone()), repository)
}

pub(super) fn service_for(
    catalog: Vec<Subevent>,
) -> (SubeventService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::seeded(catalog));
    (SubeventService::new(repository.clone()), repository)
}

pub(super) fn router_for(catalog: Vec<Subevent>) -> (axum::Router, Arc<MemoryRepository>) {
    let (service, repository) = service_for(catalog);
    (subevent_router(Arc::new(service)), repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<BTreeMap<SubeventId, Subevent>>>,
}

impl MemoryRepository {
    pub(super) fn seeded(catalog: Vec<Subevent>) -> Self {
        let records = catalog
            .into_iter()
            .map(|subevent| (subevent.id, subevent))
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub(super) fn snapshot(&self) -> Vec<Subevent> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl SubeventRepository for MemoryRepository {
    fn all(&self) -> Result<Vec<Subevent>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn fetch(&self, id: &SubeventId) -> Result<Option<Subevent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert(&self, draft: SubeventDraft) -> Result<Subevent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let id = match guard.keys().next_back() {
            Some(last) => last.0.checked_add(1).map(SubeventId).ok_or_else(|| {
                RepositoryError::Unavailable("identifier space exhausted".to_string())
            })?,
            None => SubeventId(1),
        };
        let subevent = Subevent {
            id,
            name: draft.name,
            capacity: draft.capacity,
            fee: draft.fee,
            occupancy: 0,
            incompatible: draft.incompatible,
            required: draft.required,
        };
        guard.insert(id, subevent.clone());
        Ok(subevent)
    }

    fn update(&self, subevent: Subevent) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&subevent.id) {
            return Err(RepositoryError::NotFound(subevent.id));
        }
        guard.insert(subevent.id, subevent);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl SubeventRepository for UnavailableRepository {
    fn all(&self) -> Result<Vec<Subevent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubeventId) -> Result<Option<Subevent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _draft: SubeventDraft) -> Result<Subevent, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _subevent: Subevent) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
