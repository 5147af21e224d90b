//! # Qviz Core
//!
//! `qviz_core` defines the read-only causal-model ontology consumed by the
//! scene engine: substrate elements, purviews, maximally irreducible causes
//! and effects (MICE), distinctions, relations, and the separated
//! cause/effect view of a CES. It contains no layout logic; everything here
//! is either an immutable input or a pure derivation of one.
//!
//! - **`ontology`**: the core data structures (`Substrate`, `Mice`,
//!   `Distinction`, `Ces`, `SeparatedCes`, `Relation`).
//! - **`labels`**: human-readable labels and hover texts derived from the
//!   ontology for display purposes.

pub mod labels;
pub mod ontology;

pub use ontology::{
    CauseEffectPair, Ces, Direction, Distinction, ElementSet, Mice, NodeLabels, Relation,
    SeparatedCes, Substrate,
};
