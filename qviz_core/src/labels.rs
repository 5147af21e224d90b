//! Human-readable labels and hover texts for mechanisms, purviews, and
//! relations.
//!
//! Hover texts are `<br>`-separated HTML fragments, the format the
//! interactive scene document displays verbatim.

use crate::ontology::{Distinction, Mice, NodeLabels, Relation, Substrate};

/// φ rounded to 4 decimal places for display.
pub fn phi_round(phi: f64) -> f64 {
    (phi * 10_000.0).round() / 10_000.0
}

/// Joined label string of the MICE's mechanism elements.
pub fn label_mechanism(mice: &Mice, labels: &NodeLabels) -> String {
    labels.make_label(mice.mechanism.iter())
}

/// Current substrate state bits of a distinction's mechanism, e.g. "01".
pub fn label_mechanism_state(substrate: &Substrate, distinction: &Distinction) -> String {
    distinction
        .mechanism()
        .iter()
        .map(|n| substrate.state_of(n).to_string())
        .collect()
}

/// Joined label string of the MICE's purview elements.
pub fn label_purview(mice: &Mice, labels: &NodeLabels) -> String {
    labels.make_label(mice.purview.iter())
}

/// Maximal-state bits over the purview (first-wins on ties), aligned with
/// the purview's canonical element order.
pub fn purview_state(mice: &Mice) -> Vec<u8> {
    mice.maximal_state().to_vec()
}

/// Maximal-state bits as a compact string, e.g. "10".
pub fn label_purview_state(mice: &Mice) -> String {
    purview_state(mice)
        .iter()
        .map(|bit| bit.to_string())
        .collect()
}

/// Hover text for a distinction's mechanism marker.
pub fn hovertext_mechanism(distinction: &Distinction, labels: &NodeLabels) -> String {
    let cause = distinction.cause();
    let effect = distinction.effect();
    format!(
        "Distinction: {}<br>Cause: {}<br>Cause φ = {}<br>Cause state: {:?}<br>Effect: {}<br>Effect φ = {}<br>Effect state: {:?}",
        label_mechanism(cause, labels),
        label_purview(cause, labels),
        phi_round(cause.phi),
        purview_state(cause),
        label_purview(effect, labels),
        phi_round(effect.phi),
        purview_state(effect),
    )
}

/// Hover text for a single cause or effect purview marker.
pub fn hovertext_purview(mice: &Mice, labels: &NodeLabels) -> String {
    format!(
        "Distinction: {}<br>Direction: {}<br>Purview: {}<br>φ = {}<br>State: {:?}",
        label_mechanism(mice, labels),
        mice.direction.name(),
        label_purview(mice, labels),
        phi_round(mice.phi),
        purview_state(mice),
    )
}

/// Hover text for a relation primitive: a header with the relation order,
/// one block per relatum, then the relation's own purview and φ.
pub fn hovertext_relation(relation: &Relation, labels: &NodeLabels) -> String {
    let relata_info: String = relation
        .relata()
        .iter()
        .enumerate()
        .map(|(n, mice)| {
            format!(
                "<br>Distinction {}: {}<br>Direction: {}<br>Purview: {}<br>φ = {}<br>State: {:?}<br>",
                n + 1,
                label_mechanism(mice, labels),
                mice.direction.name(),
                label_purview(mice, labels),
                phi_round(mice.phi),
                purview_state(mice),
            )
        })
        .collect();

    format!(
        "<br>={}-Relation=<br>{}<br>Relation purview: {}<br>Relation φ = {}<br>",
        relation.order(),
        relata_info,
        labels.make_label(relation.purview().iter()),
        phi_round(relation.phi()),
    )
}
