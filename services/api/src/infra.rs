use event_registry::error::AppError;
use event_registry::subevents::{
    RepositoryError, Subevent, SubeventDraft, SubeventId, SubeventRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubeventRepository {
    records: Arc<Mutex<BTreeMap<SubeventId, Subevent>>>,
}

impl InMemorySubeventRepository {
    /// Duplicate identifiers or names in the seed are rejected.
    pub(crate) fn seeded(catalog: Vec<Subevent>) -> Result<Self, RepositoryError> {
        let mut records = BTreeMap::new();
        let mut names = BTreeSet::new();
        for subevent in catalog {
            if !names.insert(subevent.name.clone()) || records.contains_key(&subevent.id) {
                return Err(RepositoryError::Conflict);
            }
            records.insert(subevent.id, subevent);
        }
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
        })
    }
}

impl SubeventRepository for InMemorySubeventRepository {
    fn all(&self) -> Result<Vec<Subevent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn fetch(&self, id: &SubeventId) -> Result<Option<Subevent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert(&self, draft: SubeventDraft) -> Result<Subevent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.values().any(|existing| existing.name == draft.name) {
            return Err(RepositoryError::Conflict);
        }
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
        if guard.contains_key(&subevent.id) {
            guard.insert(subevent.id, subevent);
            Ok(())
        } else {
            Err(RepositoryError::NotFound(subevent.id))
        }
    }
}

/// Read a JSON array of subevents.
pub(crate) fn load_catalog(path: &Path) -> Result<Vec<Subevent>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let catalog = serde_json::from_str(&raw)?;
    Ok(catalog)
}

pub(crate) fn seeded_repository(
    catalog: Vec<Subevent>,
) -> Result<InMemorySubeventRepository, AppError> {
    InMemorySubeventRepository::seeded(catalog)
        .map_err(|err| AppError::Subevent(err.into()))
}

/// Comma separated identifiers, e.g. `1,4,7`.
pub(crate) fn parse_ids(raw: &str) -> Result<BTreeSet<SubeventId>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map(SubeventId)
                .map_err(|err| format!("'{part}' is not a subevent id ({err})"))
        })
        .collect()
}
