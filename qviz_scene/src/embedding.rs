//! The embedding-service boundary and cause/effect coordinate expansion.
//!
//! The dimensionality reduction itself is an external collaborator behind
//! [`CoordsEmbedder`]; this module collapses the feature matrix to one row
//! per distinction, invokes the service, and expands the result into
//! separate cause/effect vertex positions.

use ndarray::{Array2, ArrayView2};
use qviz_core::SeparatedCes;
use qviz_error::QvizError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::distinction_features;

/// Distance metric the embedding service is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Euclidean,
}

/// Initialization strategy for the embedding. Spectral/graph initialization
/// degenerates when the requested dimensionality reaches the point count,
/// so the adapter switches to `Random` in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitStrategy {
    Spectral,
    Random,
}

/// Configuration handed to the external embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Target dimensionality, 2 or 3.
    pub n_components: usize,
    pub metric: Metric,
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub init: InitStrategy,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            n_components: 3,
            metric: Metric::Euclidean,
            n_neighbors: 30,
            min_dist: 0.5,
            init: InitStrategy::Spectral,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), QvizError> {
        if !(2..=3).contains(&self.n_components) {
            return Err(QvizError::config("n_components must be 2 or 3"));
        }
        if self.n_neighbors == 0 {
            return Err(QvizError::config("n_neighbors must be greater than 0"));
        }
        if self.min_dist < 0.0 {
            return Err(QvizError::config("min_dist must be non-negative"));
        }
        Ok(())
    }
}

/// The external dimensionality-reduction collaborator: maps a feature
/// matrix to one coordinate vector per row.
pub trait CoordsEmbedder {
    fn embed(
        &self,
        data: ArrayView2<'_, f32>,
        config: &EmbeddingConfig,
    ) -> Result<Array2<f64>, QvizError>;
}

/// Collapse, embed, and expand: produce one 3D coordinate row per separated
/// CES entry, aligned index-for-index with its flat order.
///
/// Each distinction's embedded point is duplicated into a cause row and an
/// effect row; `cause_effect_offset` is added to the effect row only. With
/// `order_on_z_axis` the embedding is 2D, both rows of a distinction take
/// `z = |mechanism|`, and the offset applies to x/y only; otherwise the
/// embedding's third coordinate drives z and the offset applies to all
/// three axes.
pub fn embed_separated_ces(
    separated: &SeparatedCes,
    features: &Array2<f32>,
    embedder: &dyn CoordsEmbedder,
    config: &EmbeddingConfig,
    order_on_z_axis: bool,
    cause_effect_offset: [f64; 3],
) -> Result<Array2<f64>, QvizError> {
    let pairs = separated.pair_count();
    if pairs == 0 {
        return Ok(Array2::zeros((0, 3)));
    }

    let n_components = if order_on_z_axis { 2 } else { 3 };
    let base = distinction_coords(separated, features, embedder, config, n_components)?;

    let mut coords = Array2::<f64>::zeros((pairs * 2, 3));
    for (i, pair) in separated.pairs().iter().enumerate() {
        let x = base[[i, 0]];
        let y = base[[i, 1]];
        let z = if order_on_z_axis {
            pair.cause.mechanism.len() as f64
        } else {
            base[[i, 2]]
        };

        coords[[2 * i, 0]] = x;
        coords[[2 * i, 1]] = y;
        coords[[2 * i, 2]] = z;

        coords[[2 * i + 1, 0]] = x + cause_effect_offset[0];
        coords[[2 * i + 1, 1]] = y + cause_effect_offset[1];
        coords[[2 * i + 1, 2]] = if order_on_z_axis {
            z
        } else {
            z + cause_effect_offset[2]
        };
    }
    Ok(coords)
}

/// One embedded point per distinction.
fn distinction_coords(
    separated: &SeparatedCes,
    features: &Array2<f32>,
    embedder: &dyn CoordsEmbedder,
    config: &EmbeddingConfig,
    n_components: usize,
) -> Result<Array2<f64>, QvizError> {
    let pairs = separated.pair_count();

    // With no relations there are no features to embed; place distinctions
    // deterministically on the diagonal instead of calling the service.
    if features.ncols() == 0 {
        debug!(pairs, "no relation features, using diagonal placement");
        let mut coords = Array2::<f64>::zeros((pairs, n_components));
        for i in 0..pairs {
            coords[[i, 0]] = i as f64 * 0.5;
            coords[[i, 1]] = i as f64 * 0.5;
        }
        return Ok(coords);
    }

    let collapsed = distinction_features(features);
    let mut effective = config.clone();
    effective.n_components = n_components;
    if n_components >= pairs {
        effective.init = InitStrategy::Random;
    }
    effective.validate()?;

    let coords = embedder.embed(collapsed.view(), &effective)?;
    if coords.nrows() != pairs || coords.ncols() != n_components {
        return Err(QvizError::embedding(format!(
            "service returned {}x{} coordinates, expected {}x{}",
            coords.nrows(),
            coords.ncols(),
            pairs,
            n_components
        )));
    }
    debug!(pairs, n_components, "embedded distinction features");
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qviz_core::{Ces, Direction, Distinction, ElementSet, Mice};
    use smallvec::smallvec;
    use std::cell::RefCell;

    fn mice(direction: Direction, mechanism: &[usize], purview: &[usize]) -> Mice {
        Mice::new(
            direction,
            ElementSet::new(mechanism.iter().copied()),
            ElementSet::new(purview.iter().copied()),
            0.25,
            vec![smallvec![1; purview.len()]],
        )
    }

    fn ces() -> Ces {
        let d0 = Distinction::new(
            mice(Direction::Cause, &[0], &[0, 1]),
            mice(Direction::Effect, &[0], &[1]),
            0.25,
        )
        .unwrap();
        let d1 = Distinction::new(
            mice(Direction::Cause, &[1, 2], &[0]),
            mice(Direction::Effect, &[1, 2], &[1, 2]),
            0.5,
        )
        .unwrap();
        Ces::new(vec![d0, d1])
    }

    /// Embeds every row at (row_index, 2 * row_index[, 0]), recording the
    /// config it was called with.
    struct GridEmbedder {
        seen: RefCell<Vec<EmbeddingConfig>>,
    }

    impl GridEmbedder {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl CoordsEmbedder for GridEmbedder {
        fn embed(
            &self,
            data: ArrayView2<'_, f32>,
            config: &EmbeddingConfig,
        ) -> Result<Array2<f64>, QvizError> {
            self.seen.borrow_mut().push(config.clone());
            let mut out = Array2::zeros((data.nrows(), config.n_components));
            for i in 0..data.nrows() {
                out[[i, 0]] = i as f64;
                out[[i, 1]] = 2.0 * i as f64;
            }
            Ok(out)
        }
    }

    fn one_relation_features(ces: &Ces) -> Array2<f32> {
        let separated = ces.separate();
        let relation = qviz_core::Relation::new(
            [
                ces.get(0).unwrap().cause().clone(),
                ces.get(1).unwrap().cause().clone(),
            ],
            ElementSet::new([0]),
            0.1,
        )
        .unwrap();
        crate::features::feature_matrix(&separated, &[relation]).unwrap()
    }

    #[test]
    fn test_expansion_offsets_effect_rows_only() {
        let ces = ces();
        let separated = ces.separate();
        let features = one_relation_features(&ces);
        let embedder = GridEmbedder::new();
        let offset = [0.3, 0.0, 0.0];

        let coords =
            embed_separated_ces(&separated, &features, &embedder, &Default::default(), true, offset)
                .unwrap();

        assert_eq!(coords.nrows(), 2 * ces.len());
        for i in 0..ces.len() {
            assert_eq!(coords[[2 * i + 1, 0]] - coords[[2 * i, 0]], offset[0]);
            assert_eq!(coords[[2 * i + 1, 1]] - coords[[2 * i, 1]], offset[1]);
            assert_eq!(coords[[2 * i + 1, 2]], coords[[2 * i, 2]]);
        }
    }

    #[test]
    fn test_mechanism_order_drives_z() {
        let ces = ces();
        let separated = ces.separate();
        let features = one_relation_features(&ces);
        let embedder = GridEmbedder::new();

        let coords = embed_separated_ces(
            &separated,
            &features,
            &embedder,
            &Default::default(),
            true,
            [0.3, 0.0, 0.0],
        )
        .unwrap();

        for (i, distinction) in ces.iter().enumerate() {
            let expected = distinction.mechanism().len() as f64;
            assert_eq!(coords[[2 * i, 2]], expected);
            assert_eq!(coords[[2 * i + 1, 2]], expected);
        }
    }

    #[test]
    fn test_three_dimensional_offset_applies_to_all_axes() {
        let ces = ces();
        let separated = ces.separate();
        let features = one_relation_features(&ces);
        let embedder = GridEmbedder::new();
        let offset = [0.3, 0.2, 0.1];

        let coords = embed_separated_ces(
            &separated,
            &features,
            &embedder,
            &Default::default(),
            false,
            offset,
        )
        .unwrap();

        for i in 0..ces.len() {
            for axis in 0..3 {
                assert!(
                    (coords[[2 * i + 1, axis]] - coords[[2 * i, axis]] - offset[axis]).abs()
                        < 1e-12
                );
            }
        }
    }

    #[test]
    fn test_random_init_forced_when_points_too_few() {
        let ces = ces();
        let separated = ces.separate();
        let features = one_relation_features(&ces);
        let embedder = GridEmbedder::new();

        // 2 distinctions, 3 components requested: 3 >= 2 forces Random.
        embed_separated_ces(
            &separated,
            &features,
            &embedder,
            &Default::default(),
            false,
            [0.0; 3],
        )
        .unwrap();
        assert_eq!(embedder.seen.borrow()[0].init, InitStrategy::Random);

        // 2D embedding of 3+ points keeps the configured init.
        let big = Ces::new(
            (0..4)
                .map(|i| {
                    Distinction::new(
                        mice(Direction::Cause, &[i], &[i]),
                        mice(Direction::Effect, &[i], &[i]),
                        0.1,
                    )
                    .unwrap()
                })
                .collect(),
        );
        let separated = big.separate();
        let relation = qviz_core::Relation::new(
            [
                big.get(0).unwrap().cause().clone(),
                big.get(1).unwrap().cause().clone(),
            ],
            ElementSet::new([0]),
            0.1,
        )
        .unwrap();
        let features = crate::features::feature_matrix(&separated, &[relation]).unwrap();
        embed_separated_ces(
            &separated,
            &features,
            &embedder,
            &Default::default(),
            true,
            [0.0; 3],
        )
        .unwrap();
        assert_eq!(embedder.seen.borrow()[1].init, InitStrategy::Spectral);
    }

    #[test]
    fn test_empty_relations_use_diagonal_placement() {
        let ces = ces();
        let separated = ces.separate();
        let features = Array2::<f32>::zeros((separated.len(), 0));
        let embedder = GridEmbedder::new();

        let coords = embed_separated_ces(
            &separated,
            &features,
            &embedder,
            &Default::default(),
            true,
            [0.3, 0.0, 0.0],
        )
        .unwrap();

        // The service is never called, and distinction i sits at i * 0.5.
        assert!(embedder.seen.borrow().is_empty());
        assert_eq!(coords[[2, 0]], 0.5);
        assert_eq!(coords[[2, 1]], 0.5);
    }

    #[test]
    fn test_shape_mismatch_from_service_is_an_error() {
        struct BadEmbedder;
        impl CoordsEmbedder for BadEmbedder {
            fn embed(
                &self,
                _data: ArrayView2<'_, f32>,
                _config: &EmbeddingConfig,
            ) -> Result<Array2<f64>, QvizError> {
                Ok(Array2::zeros((1, 1)))
            }
        }

        let ces = ces();
        let separated = ces.separate();
        let features = one_relation_features(&ces);
        let err = embed_separated_ces(
            &separated,
            &features,
            &BadEmbedder,
            &Default::default(),
            true,
            [0.0; 3],
        )
        .unwrap_err();
        assert_eq!(err.code(), "EMBEDDING_ERROR");
    }
}
