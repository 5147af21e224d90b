//! The purview × relation membership matrix.
//!
//! Rows follow the flat order of the separated CES (cause `2i`, effect
//! `2i+1`); columns follow the filtered relation order. Everything
//! downstream (coordinates, labels, hover texts, geometry) indexes into the
//! same row order, so this module is the anchor of the alignment invariant.

use ndarray::Array2;
use qviz_core::{Relation, SeparatedCes};
use qviz_error::QvizError;
use tracing::debug;

/// Build the N×M binary feature matrix: cell `(p, r)` is 1 iff separated
/// CES entry `p` is one of relation `r`'s relata (value equality).
///
/// A relatum with no equal entry in the separated CES means the relation
/// set and the CES do not belong together; that is fatal, never skipped.
pub fn feature_matrix(
    separated: &SeparatedCes,
    relations: &[Relation],
) -> Result<Array2<f32>, QvizError> {
    let n = separated.len();
    let m = relations.len();
    let mut features = Array2::<f32>::zeros((n, m));

    for (j, relation) in relations.iter().enumerate() {
        for relatum in relation.relata() {
            let i = separated.position_of(relatum).ok_or_else(|| {
                QvizError::missing_relatum(format!(
                    "{} [{}]",
                    relatum
                        .purview
                        .indices()
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(","),
                    relatum.direction.name(),
                ))
            })?;
            features[[i, j]] = 1.0;
        }
    }

    debug!(rows = n, columns = m, "built feature matrix");
    Ok(features)
}

/// Collapse cause/effect row pairs by summation into one feature vector per
/// distinction: row `i` of the result is row `2i` plus row `2i+1`.
pub fn distinction_features(features: &Array2<f32>) -> Array2<f32> {
    let pairs = features.nrows() / 2;
    let mut collapsed = Array2::<f32>::zeros((pairs, features.ncols()));
    for i in 0..pairs {
        for j in 0..features.ncols() {
            collapsed[[i, j]] = features[[2 * i, j]] + features[[2 * i + 1, j]];
        }
    }
    collapsed
}

/// Row indices of the 1s in column `j`: the vertex set of relation `j`.
pub fn relation_vertex_indices(features: &Array2<f32>, j: usize) -> Vec<usize> {
    features
        .column(j)
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(i, _)| i)
        .collect()
}
