//! The 2D causal-graph inset boundary: a directed element graph with
//! per-node display attributes, raster-rendered by an external layout
//! collaborator.

use petgraph::graph::DiGraph;
use qviz_core::Substrate;
use qviz_error::QvizError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Display attributes of one element node in the digraph: elements in
/// state 1 render filled black with white text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub label: String,
    pub style: String,
    pub fill_color: String,
    pub font_color: String,
}

/// Node attributes for one substrate element under its current state bit.
pub fn node_style(substrate: &Substrate, index: usize) -> NodeStyle {
    let on = substrate.state_of(index) == 1;
    NodeStyle {
        label: substrate.labels().label(index),
        style: if on { "filled" } else { "" }.to_string(),
        fill_color: if on { "black" } else { "" }.to_string(),
        font_color: if on { "white" } else { "black" }.to_string(),
    }
}

/// Build the directed element graph from the substrate's connectivity
/// matrix: one node per element, one edge per non-zero cell.
pub fn causal_digraph(substrate: &Substrate) -> DiGraph<NodeStyle, ()> {
    let mut graph = DiGraph::new();
    let nodes: Vec<_> = substrate
        .node_indices()
        .map(|i| graph.add_node(node_style(substrate, i)))
        .collect();

    let cm = substrate.connectivity();
    for i in substrate.node_indices() {
        for j in substrate.node_indices() {
            if cm[[i, j]] != 0 {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }
    graph
}

/// The external 2D graph-layout/render collaborator: lays the graph out
/// with the named algorithm and writes a raster image at `path`.
pub trait DigraphRenderer {
    fn render(
        &self,
        graph: &DiGraph<NodeStyle, ()>,
        layout: &str,
        path: &Path,
    ) -> Result<(), QvizError>;
}
