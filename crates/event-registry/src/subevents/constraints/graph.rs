use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::domain::{Subevent, SubeventId};
use super::ConstraintViolation;

/// Vertex of the relation snapshot. `Pending` stands in for a subevent that is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationNode {
    Stored(SubeventId),
    Pending,
}

impl fmt::Display for RelationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationNode::Stored(id) => write!(f, "{id}"),
            RelationNode::Pending => write!(f, "new subevent"),
        }
    }
}

/// Transient copy of the catalog relations used to evaluate an edit before it is saved.
///
/// Edges that point at the node itself or at identifiers missing from the snapshot are dropped
/// on construction, so every stored edge connects two known nodes.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    names: BTreeMap<RelationNode, String>,
    incompatible: BTreeMap<RelationNode, BTreeSet<RelationNode>>,
    required: BTreeMap<RelationNode, BTreeSet<RelationNode>>,
}

impl RelationGraph {
    pub fn snapshot(subevents: &[Subevent]) -> Self {
        let known: BTreeSet<SubeventId> = subevents.iter().map(|subevent| subevent.id).collect();
        let mut graph = Self::default();

        for subevent in subevents {
            let node = RelationNode::Stored(subevent.id);
            graph.names.insert(node, subevent.name.clone());
            graph
                .incompatible
                .insert(node, edges(node, &subevent.incompatible, &known));
            graph
                .required
                .insert(node, edges(node, &subevent.required, &known));
        }

        graph
    }

    /// Replace the relations of `subject` with the proposed ones, adding the node if needed.
    pub fn with_override(
        mut self,
        subject: RelationNode,
        incompatible: &BTreeSet<SubeventId>,
        required: &BTreeSet<SubeventId>,
    ) -> Self {
        let known: BTreeSet<SubeventId> = self
            .names
            .keys()
            .filter_map(|node| match node {
                RelationNode::Stored(id) => Some(*id),
                RelationNode::Pending => None,
            })
            .collect();

        self.names
            .entry(subject)
            .or_insert_with(|| subject.to_string());
        self.incompatible
            .insert(subject, edges(subject, incompatible, &known));
        self.required
            .insert(subject, edges(subject, required, &known));
        self
    }

    pub fn nodes(&self) -> impl Iterator<Item = RelationNode> + '_ {
        self.names.keys().copied()
    }

    pub fn name(&self, node: RelationNode) -> &str {
        self.names.get(&node).map(String::as_str).unwrap_or("unknown")
    }

    /// Every node reachable from `start` through "requires" edges, excluding `start`.
    pub fn required_closure(&self, start: RelationNode) -> BTreeSet<RelationNode> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<RelationNode> = self.required_of(start).iter().copied().collect();

        while let Some(node) = stack.pop() {
            if node == start || !visited.insert(node) {
                continue;
            }
            stack.extend(
                self.required_of(node)
                    .iter()
                    .filter(|next| !visited.contains(*next))
                    .copied(),
            );
        }

        visited
    }

    /// Incompatibility with both directions folded in.
    pub fn symmetric_incompatibility(&self) -> BTreeMap<RelationNode, BTreeSet<RelationNode>> {
        let mut symmetric: BTreeMap<RelationNode, BTreeSet<RelationNode>> = BTreeMap::new();
        for (node, others) in &self.incompatible {
            for other in others {
                symmetric.entry(*node).or_default().insert(*other);
                symmetric.entry(*other).or_default().insert(*node);
            }
        }
        symmetric
    }

    /// First node, in identifier order, whose required closure reaches an incompatible node.
    pub fn first_violation(&self) -> Option<ConstraintViolation> {
        let incompatible = self.symmetric_incompatibility();

        for node in self.nodes() {
            let Some(excluded) = incompatible.get(&node) else {
                continue;
            };

            let closure = self.required_closure(node);
            if let Some(conflicting) = closure.iter().find(|other| excluded.contains(*other)) {
                return Some(ConstraintViolation {
                    subevent: node,
                    subevent_name: self.name(node).to_string(),
                    conflicting: *conflicting,
                    conflicting_name: self.name(*conflicting).to_string(),
                    direct: self.required_of(node).contains(conflicting),
                });
            }
        }

        None
    }

    fn required_of(&self, node: RelationNode) -> &BTreeSet<RelationNode> {
        static EMPTY: BTreeSet<RelationNode> = BTreeSet::new();
        self.required.get(&node).unwrap_or(&EMPTY)
    }
}

fn edges(
    from: RelationNode,
    targets: &BTreeSet<SubeventId>,
    known: &BTreeSet<SubeventId>,
) -> BTreeSet<RelationNode> {
    targets
        .iter()
        .filter(|target| known.contains(*target))
        .map(|target| RelationNode::Stored(*target))
        .filter(|target| *target != from)
        .collect()
}
