use std::collections::BTreeSet;

use super::common::*;
use crate::subevents::constraints::{
    ConstraintCheckError, RelationGraph, RelationNode, SubeventConstraintValidator,
};
use crate::subevents::domain::{Subevent, SubeventId};
use crate::subevents::repository::RepositoryError;
use std::sync::Arc;

#[test]
fn requiring_an_unrelated_subevent_is_consistent() {
    let (validator, _) = validator_for(day_catalog());

    let consistent = validator
        .is_consistent(Some(&SubeventId(1)), &ids(&[]), &ids(&[2]))
        .expect("check runs");

    assert!(consistent);
}

#[test]
fn requiring_an_incompatible_subevent_is_rejected() {
    let catalog = vec![
        with_relations(subevent(1, "Morning"), &[2], &[]),
        subevent(2, "Afternoon"),
    ];
    let (validator, _) = validator_for(catalog);

    // Incompatibility stays as stored; only the required set changes.
    let violation = validator
        .find_violation(Some(&SubeventId(1)), &ids(&[2]), &ids(&[2]))
        .expect("check runs")
        .expect("violation reported");

    assert_eq!(violation.subevent, RelationNode::Stored(SubeventId(1)));
    assert_eq!(violation.conflicting, RelationNode::Stored(SubeventId(2)));
    assert!(violation.direct);
    assert_eq!(
        violation.summary(),
        "'Morning' requires 'Afternoon' but is incompatible with it"
    );
}

#[test]
fn existing_transitive_collision_fails_any_edit() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[], &[2]),
        with_relations(subevent(2, "B"), &[], &[3]),
        with_relations(subevent(3, "C"), &[1], &[]),
        subevent(4, "D"),
    ];
    let (validator, _) = validator_for(catalog);

    let violation = validator
        .find_violation(Some(&SubeventId(4)), &ids(&[]), &ids(&[]))
        .expect("check runs")
        .expect("pre-existing collision detected");

    assert_eq!(violation.subevent, RelationNode::Stored(SubeventId(1)));
    assert_eq!(violation.conflicting, RelationNode::Stored(SubeventId(3)));
    assert!(!violation.direct);
    assert!(violation.summary().contains("transitively requires"));
}

#[test]
fn new_subevent_cannot_require_and_exclude_the_same_subevent() {
    let catalog = vec![subevent(7, "X")];
    let (validator, repository) = validator_for(catalog.clone());

    let violation = validator
        .find_violation(None, &ids(&[7]), &ids(&[7]))
        .expect("check runs")
        .expect("violation reported");

    assert_eq!(violation.subevent, RelationNode::Pending);
    assert_eq!(violation.subevent_name, "new subevent");
    assert_eq!(repository.snapshot(), catalog, "no placeholder persists");
}

#[test]
fn incompatibility_is_symmetric_at_check_time() {
    // Only A lists the incompatibility; B's record is silent.
    let catalog = vec![
        with_relations(subevent(1, "A"), &[2], &[]),
        subevent(2, "B"),
    ];
    let (validator, _) = validator_for(catalog);

    let consistent = validator
        .is_consistent(Some(&SubeventId(2)), &ids(&[]), &ids(&[1]))
        .expect("check runs");

    assert!(!consistent);
}

#[test]
fn requirement_is_not_symmetric() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[], &[2]),
        subevent(2, "B"),
        subevent(3, "C"),
    ];
    let (validator, _) = validator_for(catalog);

    // B is incompatible with C; A requires B, but B requires nothing.
    let consistent = validator
        .is_consistent(Some(&SubeventId(2)), &ids(&[3]), &ids(&[]))
        .expect("check runs");

    assert!(consistent);
}

#[test]
fn requirement_cycles_terminate() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[], &[2]),
        with_relations(subevent(2, "B"), &[], &[3]),
        with_relations(subevent(3, "C"), &[], &[1]),
    ];
    let (validator, _) = validator_for(catalog.clone());

    assert!(validator
        .is_consistent(Some(&SubeventId(1)), &ids(&[]), &ids(&[2]))
        .expect("check runs"));

    let graph = RelationGraph::snapshot(&catalog);
    let closure = graph.required_closure(RelationNode::Stored(SubeventId(1)));
    assert_eq!(
        closure,
        [2, 3]
            .into_iter()
            .map(|id| RelationNode::Stored(SubeventId(id)))
            .collect::<BTreeSet<_>>()
    );
}

#[test]
fn cycle_through_incompatible_subevent_is_rejected() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[], &[2]),
        with_relations(subevent(2, "B"), &[], &[1]),
        subevent(3, "C"),
    ];
    let (validator, _) = validator_for(catalog);

    // C requires A, which pulls in B; C is incompatible with B.
    let consistent = validator
        .is_consistent(Some(&SubeventId(3)), &ids(&[2]), &ids(&[1]))
        .expect("check runs");

    assert!(!consistent);
}

#[test]
fn self_relations_are_ignored() {
    let catalog = vec![with_relations(subevent(1, "Solo"), &[1], &[1])];
    let (validator, _) = validator_for(catalog);

    assert!(validator
        .is_consistent(Some(&SubeventId(1)), &ids(&[1]), &ids(&[1]))
        .expect("check runs"));
}

#[test]
fn dangling_stored_edges_carry_no_constraint() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[99], &[99]),
        subevent(2, "B"),
    ];
    let (validator, _) = validator_for(catalog);

    assert!(validator
        .is_consistent(Some(&SubeventId(2)), &ids(&[]), &ids(&[1]))
        .expect("check runs"));
}

#[test]
fn unknown_proposed_ids_propagate_as_not_found() {
    let (validator, _) = validator_for(day_catalog());

    match validator.is_consistent(Some(&SubeventId(1)), &ids(&[]), &ids(&[42])) {
        Err(ConstraintCheckError::Repository(RepositoryError::NotFound(id))) => {
            assert_eq!(id, SubeventId(42))
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn unknown_subject_propagates_as_not_found() {
    let (validator, _) = validator_for(day_catalog());

    match validator.is_consistent(Some(&SubeventId(5)), &ids(&[]), &ids(&[])) {
        Err(ConstraintCheckError::Repository(RepositoryError::NotFound(id))) => {
            assert_eq!(id, SubeventId(5))
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn repository_outage_propagates() {
    let validator = SubeventConstraintValidator::new(Arc::new(UnavailableRepository));

    match validator.is_consistent(None, &ids(&[]), &ids(&[])) {
        Err(ConstraintCheckError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[test]
fn repeated_checks_are_idempotent_and_leave_storage_untouched() {
    let catalog = vec![
        with_relations(subevent(1, "Morning"), &[2], &[]),
        subevent(2, "Afternoon"),
    ];
    let (validator, repository) = validator_for(catalog.clone());

    for subject in [None, Some(SubeventId(1)), Some(SubeventId(2))] {
        let first = validator
            .is_consistent(subject.as_ref(), &ids(&[]), &ids(&[1, 2]))
            .expect("check runs");
        let second = validator
            .is_consistent(subject.as_ref(), &ids(&[]), &ids(&[1, 2]))
            .expect("check runs");
        assert_eq!(first, second);
        assert_eq!(repository.snapshot(), catalog);
    }
}

#[test]
fn reported_violation_does_not_depend_on_catalog_order() {
    let catalog = vec![
        with_relations(subevent(1, "A"), &[3], &[2]),
        with_relations(subevent(2, "B"), &[], &[3]),
        with_relations(subevent(3, "C"), &[4], &[4]),
        subevent(4, "D"),
    ];
    let mut reversed = catalog.clone();
    reversed.reverse();

    let forward = RelationGraph::snapshot(&catalog).first_violation();
    let backward = RelationGraph::snapshot(&reversed).first_violation();

    assert!(forward.is_some());
    assert_eq!(forward, backward);
}

/// Reachability by repeated relaxation, used as an oracle for the validator.
fn reference_consistent(required: &[(u32, u32)], incompatible: &[(u32, u32)], size: u32) -> bool {
    let n = size as usize;
    let mut reach = vec![vec![false; n]; n];
    for (from, to) in required {
        reach[(*from - 1) as usize][(*to - 1) as usize] = true;
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if reach[i][k] && reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }
    incompatible.iter().all(|(a, b)| {
        let (a, b) = ((*a - 1) as usize, (*b - 1) as usize);
        !reach[a][b] && !reach[b][a]
    })
}

#[test]
fn agrees_with_reachability_oracle_on_every_three_node_catalog() {
    let directed: Vec<(u32, u32)> = vec![(1, 2), (1, 3), (2, 1), (2, 3), (3, 1), (3, 2)];
    let pairs: Vec<(u32, u32)> = vec![(1, 2), (1, 3), (2, 3)];

    for required_mask in 0u32..(1 << directed.len()) {
        for incompatible_mask in 0u32..(1 << pairs.len()) {
            let required: Vec<(u32, u32)> = directed
                .iter()
                .enumerate()
                .filter(|(bit, _)| required_mask & (1 << bit) != 0)
                .map(|(_, edge)| *edge)
                .collect();
            let incompatible: Vec<(u32, u32)> = pairs
                .iter()
                .enumerate()
                .filter(|(bit, _)| incompatible_mask & (1 << bit) != 0)
                .map(|(_, pair)| *pair)
                .collect();

            // Incompatibility recorded on the lower id only.
            let catalog: Vec<Subevent> = (1..=3)
                .map(|id| {
                    let mut node = subevent(id, &format!("S{id}"));
                    node.required = required
                        .iter()
                        .filter(|(from, _)| *from == id)
                        .map(|(_, to)| SubeventId(*to))
                        .collect();
                    node.incompatible = incompatible
                        .iter()
                        .filter(|(a, _)| *a == id)
                        .map(|(_, b)| SubeventId(*b))
                        .collect();
                    node
                })
                .collect();

            let expected = reference_consistent(&required, &incompatible, 3);
            let actual = RelationGraph::snapshot(&catalog).first_violation().is_none();
            assert_eq!(
                actual, expected,
                "required={required:?} incompatible={incompatible:?}"
            );
        }
    }
}
