//! Edge and triangle geometry extracted from the feature matrix, plus the
//! contiguous purview chunker.

use ndarray::Array2;
use qviz_core::Relation;

use crate::features::relation_vertex_indices;

/// One edge per order-2 relation whose feature column holds exactly two 1s.
/// Each result pairs the relation's index in `relations` with the two flat
/// vertex indices, so edges can never drift out of step with the relations
/// that produced them. Columns with any other sum yield nothing.
pub fn two_relation_edges(
    features: &Array2<f32>,
    relations: &[Relation],
) -> Vec<(usize, [usize; 2])> {
    relations
        .iter()
        .enumerate()
        .filter(|(_, r)| r.order() == 2)
        .filter_map(|(j, _)| {
            let vertices = relation_vertex_indices(features, j);
            match vertices.as_slice() {
                &[a, b] => Some((j, [a, b])),
                _ => None,
            }
        })
        .collect()
}

/// One triangle per order-3 relation whose feature column holds exactly
/// three 1s; the analogue of [`two_relation_edges`].
pub fn three_relation_triangles(
    features: &Array2<f32>,
    relations: &[Relation],
) -> Vec<(usize, [usize; 3])> {
    relations
        .iter()
        .enumerate()
        .filter(|(_, r)| r.order() == 3)
        .filter_map(|(j, _)| {
            let vertices = relation_vertex_indices(features, j);
            match vertices.as_slice() {
                &[a, b, c] => Some((j, [a, b, c])),
                _ => None,
            }
        })
        .collect()
}

/// Partition an ordered slice of same-order relations into maximal
/// contiguous runs sharing the same first mechanism and derived purview.
///
/// A run extends only while consecutive relations carry the same key and
/// the new relation differs from its immediate predecessor; this is a
/// single streaming pass, so non-adjacent relations with equal keys land in
/// separate groups. Returns the grouped relations and the matching index
/// groups.
pub fn purview_chunker(relations: &[Relation]) -> (Vec<Vec<&Relation>>, Vec<Vec<usize>>) {
    let mut groups: Vec<Vec<&Relation>> = Vec::new();
    let mut index_groups: Vec<Vec<usize>> = Vec::new();

    for (i, relation) in relations.iter().enumerate() {
        let extends = groups.last().and_then(|g| g.last()).is_some_and(|prev| {
            relation.first_mechanism() == prev.first_mechanism()
                && relation.purview() == prev.purview()
                && relation != *prev
        });
        if extends {
            if let (Some(group), Some(indices)) = (groups.last_mut(), index_groups.last_mut()) {
                group.push(relation);
                indices.push(i);
            }
        } else {
            groups.push(vec![relation]);
            index_groups.push(vec![i]);
        }
    }

    (groups, index_groups)
}
