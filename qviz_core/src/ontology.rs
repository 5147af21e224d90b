//! Core data structures of the cause-effect ontology.
//!
//! Everything in this module is immutable once constructed. A rendering
//! call derives fresh values from these inputs and discards them afterward;
//! no state survives between calls.

use ndarray::Array2;
use qviz_error::QvizError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A binary state vector over a purview, aligned index-for-index with the
/// purview's canonical element order.
pub type StateVec = SmallVec<[u8; 8]>;

/// Direction of a MICE within its distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Cause,
    Effect,
}

impl Direction {
    /// Display name used in hover texts.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Cause => "CAUSE",
            Direction::Effect => "EFFECT",
        }
    }
}

/// A canonical (sorted, deduplicated) set of substrate element indices.
///
/// Used for both mechanisms and purviews; equality is value equality over
/// the canonical ordering, so two sets built from differently ordered
/// indices compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementSet(SmallVec<[usize; 8]>);

impl ElementSet {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut v: SmallVec<[usize; 8]> = indices.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn is_subset_of(&self, other: &ElementSet) -> bool {
        self.0.iter().all(|n| other.contains(*n))
    }

    pub fn overlaps(&self, other: &ElementSet) -> bool {
        self.0.iter().any(|n| other.contains(*n))
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for ElementSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Element-index to label-string mapping for a substrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLabels {
    labels: Vec<String>,
}

impl NodeLabels {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn from_strs(labels: &[&str]) -> Self {
        Self::new(labels.iter().map(|s| s.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a single element; indices beyond the label table fall back
    /// to the numeric index so display never fails.
    pub fn label(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Joined label string for a sequence of element indices.
    pub fn make_label(&self, indices: impl IntoIterator<Item = usize>) -> String {
        indices.into_iter().map(|i| self.label(i)).collect()
    }
}

/// The subsystem view the renderer needs: element labels, the current
/// binary state, and the connectivity matrix used for the digraph inset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substrate {
    labels: NodeLabels,
    state: Vec<u8>,
    connectivity: Array2<u8>,
}

impl Substrate {
    pub fn new(
        labels: NodeLabels,
        state: Vec<u8>,
        connectivity: Array2<u8>,
    ) -> Result<Self, QvizError> {
        let n = labels.len();
        if state.len() != n {
            return Err(QvizError::config(format!(
                "state length {} does not match substrate size {}",
                state.len(),
                n
            )));
        }
        if connectivity.nrows() != n || connectivity.ncols() != n {
            return Err(QvizError::config(format!(
                "connectivity matrix is {}x{}, expected {}x{}",
                connectivity.nrows(),
                connectivity.ncols(),
                n,
                n
            )));
        }
        Ok(Self {
            labels,
            state,
            connectivity,
        })
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn node_indices(&self) -> std::ops::Range<usize> {
        0..self.size()
    }

    pub fn labels(&self) -> &NodeLabels {
        &self.labels
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    /// State bit of one element. Out-of-range indices read as 0.
    pub fn state_of(&self, index: usize) -> u8 {
        self.state.get(index).copied().unwrap_or(0)
    }

    pub fn connectivity(&self) -> &Array2<u8> {
        &self.connectivity
    }
}

/// A maximally irreducible cause or effect.
///
/// `maximal_states` holds one or more candidate maximal states, each aligned
/// with the purview's canonical order. Ties are resolved first-wins by
/// [`Mice::maximal_state`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mice {
    pub direction: Direction,
    pub mechanism: ElementSet,
    pub purview: ElementSet,
    pub phi: f64,
    pub maximal_states: Vec<StateVec>,
}

impl Mice {
    pub fn new(
        direction: Direction,
        mechanism: ElementSet,
        purview: ElementSet,
        phi: f64,
        maximal_states: Vec<StateVec>,
    ) -> Self {
        Self {
            direction,
            mechanism,
            purview,
            phi,
            maximal_states,
        }
    }

    /// The maximal state used for display. When several states tie, the
    /// first one wins; callers that need the full tie set can read
    /// `maximal_states` directly.
    pub fn maximal_state(&self) -> &[u8] {
        self.maximal_states
            .first()
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }
}

/// A mechanism together with its maximally irreducible cause and effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distinction {
    mechanism: ElementSet,
    cause: Mice,
    effect: Mice,
    phi: f64,
}

impl Distinction {
    pub fn new(cause: Mice, effect: Mice, phi: f64) -> Result<Self, QvizError> {
        if cause.direction != Direction::Cause {
            return Err(QvizError::config("cause MICE must have direction CAUSE"));
        }
        if effect.direction != Direction::Effect {
            return Err(QvizError::config("effect MICE must have direction EFFECT"));
        }
        if cause.mechanism != effect.mechanism {
            return Err(QvizError::config(
                "cause and effect MICE must share one mechanism",
            ));
        }
        Ok(Self {
            mechanism: cause.mechanism.clone(),
            cause,
            effect,
            phi,
        })
    }

    pub fn mechanism(&self) -> &ElementSet {
        &self.mechanism
    }

    pub fn cause(&self) -> &Mice {
        &self.cause
    }

    pub fn effect(&self) -> &Mice {
        &self.effect
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn mice(&self, direction: Direction) -> &Mice {
        match direction {
            Direction::Cause => &self.cause,
            Direction::Effect => &self.effect,
        }
    }
}

/// A cause-effect structure: an ordered sequence of distinctions.
///
/// The order carries no semantics but must be stable, since every derived
/// array downstream is aligned to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ces {
    distinctions: Vec<Distinction>,
}

impl Ces {
    pub fn new(distinctions: Vec<Distinction>) -> Self {
        Self { distinctions }
    }

    pub fn len(&self) -> usize {
        self.distinctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinctions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Distinction> {
        self.distinctions.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Distinction> {
        self.distinctions.get(index)
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = &ElementSet> + '_ {
        self.distinctions.iter().map(|d| d.mechanism())
    }

    pub fn separate(&self) -> SeparatedCes {
        SeparatedCes::from_ces(self)
    }
}

/// One distinction's cause and effect entries held together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseEffectPair {
    pub cause: Mice,
    pub effect: Mice,
}

/// The separated view of a CES: per distinction, its cause MICE and effect
/// MICE as an explicit pair.
///
/// Flat indexing exists only at the boundary where embedding and geometry
/// need plain arrays: flat index `2i` is distinction `i`'s cause and `2i+1`
/// its effect. Keeping the pairing typed (rather than an interleaved list)
/// means the even/odd convention cannot silently drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeparatedCes {
    pairs: Vec<CauseEffectPair>,
}

impl SeparatedCes {
    pub fn from_ces(ces: &Ces) -> Self {
        let pairs = ces
            .iter()
            .map(|d| CauseEffectPair {
                cause: d.cause().clone(),
                effect: d.effect().clone(),
            })
            .collect();
        Self { pairs }
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of flat entries: two per distinction.
    pub fn len(&self) -> usize {
        self.pairs.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[CauseEffectPair] {
        &self.pairs
    }

    /// Flat-index access: even indices are causes, odd indices effects.
    pub fn entry(&self, flat: usize) -> Option<&Mice> {
        let pair = self.pairs.get(flat / 2)?;
        Some(if flat % 2 == 0 {
            &pair.cause
        } else {
            &pair.effect
        })
    }

    /// Iterate entries in flat order (cause, effect, cause, effect, ...).
    pub fn iter(&self) -> impl Iterator<Item = &Mice> + '_ {
        self.pairs
            .iter()
            .flat_map(|p| [&p.cause, &p.effect].into_iter())
    }

    /// One direction's entries, in distinction order.
    pub fn flatten_for(&self, direction: Direction) -> impl Iterator<Item = &Mice> + '_ {
        self.pairs.iter().map(move |p| match direction {
            Direction::Cause => &p.cause,
            Direction::Effect => &p.effect,
        })
    }

    /// First flat index holding an entry value-equal to `mice`.
    pub fn position_of(&self, mice: &Mice) -> Option<usize> {
        self.iter().position(|m| m == mice)
    }
}

/// A higher-order overlap between two or more distinctions' cause/effect
/// purviews. Relata are value clones standing for references to MICEs that
/// must also appear in the CES being rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    relata: SmallVec<[Mice; 3]>,
    purview: ElementSet,
    phi: f64,
}

impl Relation {
    pub fn new(
        relata: impl IntoIterator<Item = Mice>,
        purview: ElementSet,
        phi: f64,
    ) -> Result<Self, QvizError> {
        let relata: SmallVec<[Mice; 3]> = relata.into_iter().collect();
        if relata.len() < 2 {
            return Err(QvizError::inconsistent_relation(format!(
                "a relation needs at least 2 relata, got {}",
                relata.len()
            )));
        }
        Ok(Self {
            relata,
            purview,
            phi,
        })
    }

    /// Number of relata.
    pub fn order(&self) -> usize {
        self.relata.len()
    }

    pub fn relata(&self) -> &[Mice] {
        &self.relata
    }

    /// The relation's own derived purview (not necessarily equal to any
    /// relatum's purview).
    pub fn purview(&self) -> &ElementSet {
        &self.purview
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn purviews(&self) -> impl Iterator<Item = &ElementSet> + '_ {
        self.relata.iter().map(|m| &m.purview)
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = &ElementSet> + '_ {
        self.relata.iter().map(|m| &m.mechanism)
    }

    pub fn first_mechanism(&self) -> &ElementSet {
        &self.relata[0].mechanism
    }

    /// Union of all element indices referenced by the relation's mechanisms.
    pub fn mechanism_elements(&self) -> ElementSet {
        ElementSet::new(self.mechanisms().flat_map(|m| m.iter()))
    }
}
