//! # Qviz Scene
//!
//! `qviz_scene` turns a cause-effect structure and its relations into a
//! layered 3D scene: it derives the purview/relation feature matrix, embeds
//! distinctions into 2D/3D coordinates through an external embedding
//! service, sizes and colors every primitive, partitions relation
//! primitives into legend-togglable q-fold groups, and assembles the final
//! scene handed to the export collaborator.
//!
//! - **`features`**: purview × relation membership matrix.
//! - **`embedding`**: embedding-service boundary and cause/effect
//!   coordinate expansion.
//! - **`sizes`**: φ-driven size normalization.
//! - **`classify`**: 2-relation overlap classification for edge colors.
//! - **`geometry`**: edge/triangle extraction and the purview chunker.
//! - **`qfold`**: the relation grouping engine and legend bookkeeping.
//! - **`trace`**: the scene primitive and layout types.
//! - **`digraph`**: the 2D causal-graph inset boundary.
//! - **`assemble`**: the orchestrating scene assembler.

pub mod assemble;
pub mod classify;
pub mod digraph;
pub mod embedding;
pub mod features;
pub mod geometry;
pub mod qfold;
pub mod sizes;
pub mod trace;

pub use assemble::{SceneAssembler, SceneConfig, SceneExporter};
pub use classify::{edge_color, TwoRelationKind};
pub use embedding::{embed_separated_ces, CoordsEmbedder, EmbeddingConfig, InitStrategy, Metric};
pub use features::feature_matrix;
pub use qfold::{GroupingContext, LegendKey, QfoldToggles};
pub use sizes::normalize_sizes;
pub use trace::{Scene, Trace, Visibility};
