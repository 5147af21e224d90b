//! The q-fold grouping engine: partitions relation primitives into named,
//! legend-togglable groups.
//!
//! Grouping is keyed structurally (not by rendered label text), so two
//! entities that happen to render identically can never collide in the
//! legend bookkeeping.

use fnv::FnvHashSet;
use qviz_core::{Ces, ElementSet, NodeLabels, Relation, Substrate};
use serde::{Deserialize, Serialize};

/// Structural identity of one legend group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LegendKey {
    /// All relations touching one substrate element through a mechanism.
    Node(usize),
    /// All relations involving one distinction mechanism.
    Mechanism(ElementSet),
    /// All relations with a relatum over one purview.
    CompoundPurview(ElementSet),
    /// All relations whose own derived purview is one purview.
    RelationPurview(ElementSet),
    /// All relations involving one mechanism together with its cause purview.
    MechanismCausePurview(ElementSet, ElementSet),
    /// Catch-all group per relation order.
    AllTwoRelations,
    AllThreeRelations,
}

impl LegendKey {
    /// Legend display name; identical keys always render identical names,
    /// which is what groups primitives in the interactive legend.
    pub fn display_name(&self, labels: &NodeLabels) -> String {
        match self {
            LegendKey::Node(index) => format!("Node {} q-fold", labels.label(*index)),
            LegendKey::Mechanism(mechanism) => {
                format!("Mechanism {} q-fold", labels.make_label(mechanism.iter()))
            }
            LegendKey::CompoundPurview(purview) => {
                format!("Compound Purview {} q-fold", labels.make_label(purview.iter()))
            }
            LegendKey::RelationPurview(purview) => {
                format!("Relation Purview {} q-fold", labels.make_label(purview.iter()))
            }
            LegendKey::MechanismCausePurview(mechanism, purview) => format!(
                "Mechanism {} Cause Purview {} q-fold",
                labels.make_label(mechanism.iter()),
                labels.make_label(purview.iter())
            ),
            LegendKey::AllTwoRelations => "All 2-Relations".to_string(),
            LegendKey::AllThreeRelations => "All 3-Relations".to_string(),
        }
    }
}

/// Per-rendering-call legend bookkeeping: the first primitive emitted under
/// a key shows its legend entry, every later one under the same key is
/// rendered with the entry suppressed. Discarded after the call.
#[derive(Debug, Default)]
pub struct GroupingContext {
    seen: FnvHashSet<LegendKey>,
}

impl GroupingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per key within this context.
    pub fn claim_legend(&mut self, key: &LegendKey) -> bool {
        if self.seen.contains(key) {
            false
        } else {
            self.seen.insert(key.clone());
            true
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Which q-fold families get layered primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QfoldToggles {
    pub node: bool,
    pub mechanism: bool,
    pub compound_purview: bool,
    pub relation_purview: bool,
    pub mechanism_cause_purview: bool,
}

impl Default for QfoldToggles {
    fn default() -> Self {
        Self {
            node: false,
            mechanism: true,
            compound_purview: true,
            relation_purview: true,
            mechanism_cause_purview: true,
        }
    }
}

/// Compute one relation's membership across the five q-fold families, in
/// emission order. Duplicate keys (e.g. two relata over the same purview)
/// are kept; the legend dedup happens in [`GroupingContext`], not here.
/// The per-order catch-all group is the assembler's job.
pub fn qfold_keys(
    relation: &Relation,
    ces: &Ces,
    substrate: &Substrate,
    toggles: &QfoldToggles,
) -> Vec<LegendKey> {
    let mut keys = Vec::new();

    if toggles.node {
        let members = relation.mechanism_elements();
        for index in substrate.node_indices() {
            if members.contains(index) {
                keys.push(LegendKey::Node(index));
            }
        }
    }

    if toggles.mechanism {
        for distinction in ces.iter() {
            if relation.mechanisms().any(|m| m == distinction.mechanism()) {
                keys.push(LegendKey::Mechanism(distinction.mechanism().clone()));
            }
        }
    }

    if toggles.compound_purview {
        for purview in relation.purviews() {
            keys.push(LegendKey::CompoundPurview(purview.clone()));
        }
    }

    if toggles.relation_purview {
        keys.push(LegendKey::RelationPurview(relation.purview().clone()));
    }

    if toggles.mechanism_cause_purview {
        for distinction in ces.iter() {
            let cause_purview = &distinction.cause().purview;
            if relation.purviews().any(|p| p == cause_purview)
                && relation.mechanisms().any(|m| m == distinction.mechanism())
            {
                keys.push(LegendKey::MechanismCausePurview(
                    distinction.mechanism().clone(),
                    cause_purview.clone(),
                ));
            }
        }
    }

    keys
}
