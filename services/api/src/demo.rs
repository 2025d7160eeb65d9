use crate::infra::{load_catalog, parse_ids, seeded_repository};
use clap::Args;
use event_registry::error::AppError;
use event_registry::subevents::{
    Subevent, SubeventConstraintValidator, SubeventDraft, SubeventId, SubeventRepository,
    SubeventService, SubeventServiceError,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// JSON file with the current subevent catalog
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Subevent being edited; omit when checking a new subevent
    #[arg(long)]
    pub(crate) subject: Option<u32>,
    /// Proposed incompatible subevents (comma separated ids)
    #[arg(long, value_parser = parse_ids)]
    pub(crate) incompatible: Option<BTreeSet<SubeventId>>,
    /// Proposed required subevents (comma separated ids)
    #[arg(long, value_parser = parse_ids)]
    pub(crate) required: Option<BTreeSet<SubeventId>>,
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let CheckArgs {
        catalog,
        subject,
        incompatible,
        required,
    } = args;

    let repository = Arc::new(seeded_repository(load_catalog(&catalog)?)?);
    let validator = SubeventConstraintValidator::new(repository.clone());
    let subject = subject.map(SubeventId);
    let incompatible = incompatible.unwrap_or_default();
    let required = required.unwrap_or_default();

    let violation = validator
        .find_violation(subject.as_ref(), &incompatible, &required)
        .map_err(|err| AppError::Subevent(err.into()))?;

    let size = repository
        .all()
        .map_err(|err| AppError::Subevent(err.into()))?
        .len();
    println!("Catalog: {} ({size} subevents)", catalog.display());
    match violation {
        None => println!("Result: consistent"),
        Some(violation) => println!("Result: inconsistent - {}", violation.summary()),
    }
    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    println!("Subevent relation scenarios");
    println!("===========================");

    for scenario in scenarios() {
        let outcome = scenario.run()?;
        println!(
            "- {:<48} {}",
            scenario.title,
            if outcome { "consistent" } else { "rejected" }
        );
    }

    Ok(())
}

struct Scenario {
    title: &'static str,
    catalog: Vec<Subevent>,
    subject: Option<SubeventId>,
    incompatible: BTreeSet<SubeventId>,
    required: BTreeSet<SubeventId>,
}

impl Scenario {
    /// `true` when the service accepts the edit.
    fn run(&self) -> Result<bool, AppError> {
        let repository = Arc::new(seeded_repository(self.catalog.clone())?);
        let service = SubeventService::new(repository);

        let draft = match self.subject {
            Some(id) => {
                let current = service.get(&id)?;
                SubeventDraft {
                    name: current.name,
                    capacity: current.capacity,
                    fee: current.fee,
                    incompatible: self.incompatible.clone(),
                    required: self.required.clone(),
                }
            }
            None => SubeventDraft {
                name: "Evening".to_string(),
                capacity: None,
                fee: 0,
                incompatible: self.incompatible.clone(),
                required: self.required.clone(),
            },
        };

        let result = match self.subject {
            Some(id) => service.update(&id, draft).map(|_| ()),
            None => service.create(draft).map(|_| ()),
        };

        match result {
            Ok(()) => Ok(true),
            Err(SubeventServiceError::Rule(_)) => Ok(false),
            Err(other) => Err(other.into()),
        }
    }
}

fn subevent(id: u32, name: &str, incompatible: &[u32], required: &[u32]) -> Subevent {
    Subevent {
        id: SubeventId(id),
        name: name.to_string(),
        capacity: None,
        fee: 0,
        occupancy: 0,
        incompatible: incompatible.iter().copied().map(SubeventId).collect(),
        required: required.iter().copied().map(SubeventId).collect(),
    }
}

fn set(raw: &[u32]) -> BTreeSet<SubeventId> {
    raw.iter().copied().map(SubeventId).collect()
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            title: "Morning requires Afternoon",
            catalog: vec![
                subevent(1, "Morning", &[], &[]),
                subevent(2, "Afternoon", &[], &[]),
            ],
            subject: Some(SubeventId(1)),
            incompatible: set(&[]),
            required: set(&[2]),
        },
        Scenario {
            title: "Morning requires an incompatible Afternoon",
            catalog: vec![
                subevent(1, "Morning", &[2], &[]),
                subevent(2, "Afternoon", &[], &[]),
            ],
            subject: Some(SubeventId(1)),
            incompatible: set(&[2]),
            required: set(&[2]),
        },
        Scenario {
            title: "Unrelated edit over an A->B->C chain excluding A",
            catalog: vec![
                subevent(1, "A", &[], &[2]),
                subevent(2, "B", &[], &[3]),
                subevent(3, "C", &[1], &[]),
                subevent(4, "D", &[], &[]),
            ],
            subject: Some(SubeventId(4)),
            incompatible: set(&[]),
            required: set(&[]),
        },
        Scenario {
            title: "New subevent requiring and excluding X",
            catalog: vec![subevent(1, "X", &[], &[])],
            subject: None,
            incompatible: set(&[1]),
            required: set(&[1]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenarios_produce_expected_outcomes() {
        let outcomes: Vec<bool> = scenarios()
            .iter()
            .map(|scenario| scenario.run().expect("scenario runs"))
            .collect();
        assert_eq!(outcomes, vec![true, false, false, false]);
    }
}
