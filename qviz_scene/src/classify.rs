//! Overlap classification of 2-relations for edge coloring.

use qviz_core::Relation;
use qviz_error::QvizError;
use serde::{Deserialize, Serialize};

/// Neutral edge color when color-coding is disabled.
pub const NEUTRAL_EDGE_COLOR: &str = "teal";

/// How the two relata purviews of a 2-relation overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TwoRelationKind {
    /// Mutual full overlap: both purviews equal the relation purview.
    Isotext,
    /// Inclusion: distinct purviews, one contained in the other.
    SubSupertext,
    /// Connection: equal purviews differing from the relation purview, or a
    /// partial overlap without containment.
    Paratext,
}

impl TwoRelationKind {
    pub fn color(&self) -> &'static str {
        match self {
            TwoRelationKind::Isotext => "fuchsia",
            TwoRelationKind::SubSupertext => "indigo",
            TwoRelationKind::Paratext => "cyan",
        }
    }
}

/// Classify a 2-relation by comparing its two relata purviews and its own
/// derived purview.
///
/// The three categories are exhaustive for well-formed relations; falling
/// through means the input data is malformed, and that is surfaced as an
/// error rather than guessed away.
pub fn classify_two_relation(relation: &Relation) -> Result<TwoRelationKind, QvizError> {
    if relation.order() != 2 {
        return Err(QvizError::inconsistent_relation(format!(
            "overlap classification needs exactly 2 relata, got {}",
            relation.order()
        )));
    }
    let p0 = &relation.relata()[0].purview;
    let p1 = &relation.relata()[1].purview;
    let pr = relation.purview();

    if p0 == p1 && p1 == pr {
        Ok(TwoRelationKind::Isotext)
    } else if p0 != p1 && (p0.is_subset_of(p1) || p1.is_subset_of(p0)) {
        Ok(TwoRelationKind::SubSupertext)
    } else if (p0 == p1 && p1 != pr) || (p0.overlaps(p1) && !p0.is_subset_of(p1)) {
        Ok(TwoRelationKind::Paratext)
    } else {
        Err(QvizError::inconsistent_relation(
            "unexpected relation shape; relata purviews neither equal, nested, nor overlapping",
        ))
    }
}

/// Display color for a 2-relation edge. With color-coding disabled, every
/// edge is the neutral color.
pub fn edge_color(relation: &Relation, colorcode_2_relations: bool) -> Result<&'static str, QvizError> {
    if !colorcode_2_relations {
        return Ok(NEUTRAL_EDGE_COLOR);
    }
    classify_two_relation(relation).map(|kind| kind.color())
}
