//! The scene assembler: orchestrates the whole layout-and-grouping
//! pipeline and hands the assembled scene to the export collaborator.
//!
//! One call derives everything fresh from its inputs; legend bookkeeping
//! and all intermediate arrays are discarded when the call returns.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use qviz_core::{labels, Ces, Relation, Substrate};
use qviz_error::QvizError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classify::edge_color;
use crate::digraph::{causal_digraph, DigraphRenderer};
use crate::embedding::{embed_separated_ces, CoordsEmbedder, EmbeddingConfig};
use crate::features::feature_matrix;
use crate::geometry::{three_relation_triangles, two_relation_edges};
use crate::qfold::{qfold_keys, GroupingContext, LegendKey, QfoldToggles};
use crate::sizes::normalize_sizes;
use crate::trace::{
    Annotation, Axis, Camera, HoverLabel, InsetImage, LegendStyle, Line, Marker, Mesh3d,
    Scatter3d, Scene, SceneLayout, TextFont, Trace, TraceMode, Visibility,
};

/// The external 3D scene export collaborator: persists the assembled scene
/// as a self-contained interactive document at `path`.
pub trait SceneExporter {
    fn export(&self, scene: &Scene, path: &Path) -> Result<(), QvizError>;
}

/// Every visual and behavioral knob of the assembler. All output
/// destinations are explicit; nothing is written unless a path is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Relations above this order are dropped before any processing.
    pub max_relation_order: usize,
    /// Offset separating each effect vertex from its cause vertex.
    pub cause_effect_offset: [f64; 3],
    /// Extra z lift applied to mechanism markers and labels.
    pub mechanism_z_offset: f64,
    pub vertex_size_range: (f64, f64),
    pub edge_size_range: (f64, f64),
    pub surface_size_range: (f64, f64),
    /// (height, width) of the plot in pixels.
    pub plot_dimensions: (u32, u32),
    pub mechanism_label_size: f64,
    pub state_label_size: f64,
    pub purview_label_size: f64,
    pub show_mechanism_labels: Visibility,
    pub show_purview_labels: Visibility,
    pub show_mechanism_vertices: Visibility,
    pub show_purview_vertices: Visibility,
    pub show_edges: Visibility,
    pub show_mesh: Visibility,
    pub qfolds: QfoldToggles,
    pub show_grid: bool,
    pub network_name: String,
    pub plot_title_size: f64,
    pub camera_eye: [f64; 3],
    pub hover_mode: String,
    pub digraph_layout: String,
    /// Paper-relative position of the causal-model inset.
    pub digraph_coords: (f64, f64),
    pub digraph_size: (f64, f64),
    /// Where the digraph collaborator writes its raster image; `None`
    /// disables the inset.
    pub digraph_path: Option<PathBuf>,
    /// Where the exporter persists the interactive document; `None`
    /// disables export.
    pub export_path: Option<PathBuf>,
    /// Drive z by mechanism order (2D embedding) instead of a third
    /// embedded coordinate.
    pub order_on_z_axis: bool,
    pub colorcode_2_relations: bool,
    pub state_label_z_offset: f64,
    /// Left margin applied when the inset is present.
    pub left_margin: f64,
    pub legend_title_size: f64,
    pub legend_font_size: f64,
    pub autosize: bool,
    pub embedding: EmbeddingConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_relation_order: 3,
            cause_effect_offset: [0.3, 0.0, 0.0],
            mechanism_z_offset: 0.1,
            vertex_size_range: (10.0, 40.0),
            edge_size_range: (0.5, 4.0),
            surface_size_range: (0.005, 0.1),
            plot_dimensions: (768, 1366),
            mechanism_label_size: 15.0,
            state_label_size: 10.0,
            purview_label_size: 12.0,
            show_mechanism_labels: Visibility::Shown,
            show_purview_labels: Visibility::LegendOnly,
            show_mechanism_vertices: Visibility::Shown,
            show_purview_vertices: Visibility::Shown,
            show_edges: Visibility::LegendOnly,
            show_mesh: Visibility::LegendOnly,
            qfolds: QfoldToggles::default(),
            show_grid: false,
            network_name: String::new(),
            plot_title_size: 20.0,
            camera_eye: [0.5, 0.5, 0.5],
            hover_mode: "x".to_string(),
            digraph_layout: "dot".to_string(),
            digraph_coords: (0.0, 1.0),
            digraph_size: (0.2, 0.3),
            digraph_path: None,
            export_path: None,
            order_on_z_axis: true,
            colorcode_2_relations: true,
            state_label_z_offset: 0.1,
            left_margin: 100.0,
            legend_title_size: 12.0,
            legend_font_size: 10.0,
            autosize: false,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), QvizError> {
        if self.max_relation_order < 2 {
            return Err(QvizError::config("max_relation_order must be at least 2"));
        }
        for (name, range) in [
            ("vertex_size_range", self.vertex_size_range),
            ("edge_size_range", self.edge_size_range),
            ("surface_size_range", self.surface_size_range),
        ] {
            if range.0 <= 0.0 || range.1 < range.0 {
                return Err(QvizError::config(format!(
                    "{name} must be a positive (min, max) pair"
                )));
            }
        }
        if self.plot_dimensions.0 == 0 || self.plot_dimensions.1 == 0 {
            return Err(QvizError::config("plot_dimensions must be non-zero"));
        }
        self.embedding.validate()
    }
}

/// Assembles a Q-structure scene from a substrate, its CES, and the
/// relation set, delegating embedding, digraph rendering, and export to
/// the configured collaborators.
pub struct SceneAssembler<'a> {
    embedder: &'a dyn CoordsEmbedder,
    digraph_renderer: Option<&'a dyn DigraphRenderer>,
    exporter: Option<&'a dyn SceneExporter>,
    config: SceneConfig,
}

impl<'a> SceneAssembler<'a> {
    pub fn new(embedder: &'a dyn CoordsEmbedder, config: SceneConfig) -> Result<Self, QvizError> {
        config.validate()?;
        Ok(Self {
            embedder,
            digraph_renderer: None,
            exporter: None,
            config,
        })
    }

    pub fn with_digraph_renderer(mut self, renderer: &'a dyn DigraphRenderer) -> Self {
        self.digraph_renderer = Some(renderer);
        self
    }

    pub fn with_exporter(mut self, exporter: &'a dyn SceneExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Run the full pipeline for one CES/relation set.
    pub fn assemble(
        &self,
        substrate: &Substrate,
        ces: &Ces,
        relations: &[Relation],
    ) -> Result<Scene, QvizError> {
        let cfg = &self.config;
        let relations: Vec<Relation> = relations
            .iter()
            .filter(|r| r.order() <= cfg.max_relation_order)
            .cloned()
            .collect();
        debug!(
            kept = relations.len(),
            max_order = cfg.max_relation_order,
            "filtered relations"
        );

        if ces.is_empty() {
            info!("empty CES, producing placeholder scene");
            return Ok(Scene {
                traces: Vec::new(),
                layout: self.base_layout([[-1.0, 1.0]; 3]),
            });
        }

        let separated = ces.separate();
        let features = feature_matrix(&separated, &relations)?;
        let coords = embed_separated_ces(
            &separated,
            &features,
            self.embedder,
            &cfg.embedding,
            cfg.order_on_z_axis,
            cfg.cause_effect_offset,
        )?;

        let node_labels = substrate.labels();
        let x: Vec<f64> = coords.column(0).to_vec();
        let y: Vec<f64> = coords.column(1).to_vec();
        let z: Vec<f64> = coords.column(2).to_vec();
        let causes_x = stride(&x, 0);
        let causes_y = stride(&y, 0);
        let causes_z = stride(&z, 0);
        let effects_x = stride(&x, 1);
        let effects_y = stride(&y, 1);
        let effects_z = stride(&z, 1);

        // Labels and hover texts, aligned with the flat coordinate order.
        let mechanism_labels: Vec<String> = ces
            .iter()
            .map(|d| labels::label_mechanism(d.cause(), node_labels))
            .collect();
        let mechanism_state_labels: Vec<String> = ces
            .iter()
            .map(|d| labels::label_mechanism_state(substrate, d))
            .collect();
        let purview_labels: Vec<String> = separated
            .iter()
            .map(|m| labels::label_purview(m, node_labels))
            .collect();
        let purview_state_labels: Vec<String> =
            separated.iter().map(labels::label_purview_state).collect();
        let mechanism_hovertext: Vec<String> = ces
            .iter()
            .map(|d| labels::hovertext_mechanism(d, node_labels))
            .collect();
        let purview_hovertext: Vec<String> = separated
            .iter()
            .map(|m| labels::hovertext_purview(m, node_labels))
            .collect();
        let causes_hovertext = stride(&purview_hovertext, 0);
        let effects_hovertext = stride(&purview_hovertext, 1);

        // Marker sizes from φ; a mechanism takes the smaller of its pair.
        let purview_phis: Vec<f64> = separated.iter().map(|m| m.phi).collect();
        let purview_sizes = normalize_sizes(
            cfg.vertex_size_range.0,
            cfg.vertex_size_range.1,
            &purview_phis,
        );
        let cause_purview_sizes = stride(&purview_sizes, 0);
        let effect_purview_sizes = stride(&purview_sizes, 1);
        let mechanism_sizes: Vec<f64> = purview_sizes
            .chunks(2)
            .map(|pair| pair.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();

        // Mechanism markers sit between the cause/effect pair.
        let xm: Vec<f64> = causes_x
            .iter()
            .map(|c| c + cfg.cause_effect_offset[0] / 2.0)
            .collect();
        let label_lift = cfg.vertex_size_range.1 / 1_000.0;

        let mut traces: Vec<Trace> = Vec::new();

        traces.push(Trace::Scatter(Scatter3d {
            visible: cfg.show_mechanism_labels,
            name: "Mechanism Labels".to_string(),
            legend_group: None,
            show_legend: true,
            x: xm.clone(),
            y: causes_y.clone(),
            z: causes_z
                .iter()
                .map(|n| n + label_lift + cfg.mechanism_z_offset)
                .collect(),
            mode: TraceMode::Text,
            text: mechanism_labels.clone(),
            text_font: Some(TextFont {
                size: cfg.mechanism_label_size,
                color: "black".to_string(),
            }),
            marker: None,
            line: None,
            hover_text: mechanism_hovertext.clone(),
            hover_label: Some(HoverLabel {
                bgcolor: "black".to_string(),
                font_color: Some("white".to_string()),
            }),
        }));

        traces.push(Trace::Scatter(Scatter3d {
            visible: cfg.show_mechanism_labels,
            name: "Mechanism State Labels".to_string(),
            legend_group: None,
            show_legend: false,
            x: xm.clone(),
            y: causes_y.clone(),
            z: causes_z
                .iter()
                .map(|n| {
                    n + label_lift + cfg.mechanism_z_offset + cfg.state_label_z_offset + 0.01
                })
                .collect(),
            mode: TraceMode::Text,
            text: mechanism_state_labels,
            text_font: Some(TextFont {
                size: cfg.state_label_size,
                color: "black".to_string(),
            }),
            marker: None,
            line: None,
            hover_text: mechanism_hovertext.clone(),
            hover_label: Some(HoverLabel {
                bgcolor: "black".to_string(),
                font_color: Some("white".to_string()),
            }),
        }));

        traces.push(Trace::Scatter(Scatter3d {
            visible: cfg.show_mechanism_vertices,
            name: "Mechanisms".to_string(),
            legend_group: None,
            show_legend: true,
            x: xm,
            y: causes_y.clone(),
            z: causes_z.iter().map(|n| n + cfg.mechanism_z_offset).collect(),
            mode: TraceMode::Markers,
            text: mechanism_labels,
            text_font: None,
            marker: Some(Marker {
                sizes: mechanism_sizes,
                color: "black".to_string(),
            }),
            line: None,
            hover_text: mechanism_hovertext,
            hover_label: Some(HoverLabel {
                bgcolor: "black".to_string(),
                font_color: Some("white".to_string()),
            }),
        }));

        for (direction, px, py, pz, plabels, hover, color) in [
            (
                "Cause",
                &causes_x,
                &causes_y,
                &causes_z,
                stride(&purview_labels, 0),
                &causes_hovertext,
                "red",
            ),
            (
                "Effect",
                &effects_x,
                &effects_y,
                &effects_z,
                stride(&purview_labels, 1),
                &effects_hovertext,
                "green",
            ),
        ] {
            traces.push(Trace::Scatter(Scatter3d {
                visible: cfg.show_purview_labels,
                name: format!("{direction} Purview Labels"),
                legend_group: None,
                show_legend: true,
                x: px.clone(),
                y: py.clone(),
                z: pz.iter().map(|n| n + label_lift).collect(),
                mode: TraceMode::Text,
                text: plabels,
                text_font: Some(TextFont {
                    size: cfg.purview_label_size,
                    color: color.to_string(),
                }),
                marker: None,
                line: None,
                hover_text: hover.clone(),
                hover_label: Some(HoverLabel {
                    bgcolor: color.to_string(),
                    font_color: None,
                }),
            }));
        }

        for (direction, px, py, pz, states, hover, color) in [
            (
                "Cause",
                &causes_x,
                &causes_y,
                &causes_z,
                stride(&purview_state_labels, 0),
                &causes_hovertext,
                "red",
            ),
            (
                "Effect",
                &effects_x,
                &effects_y,
                &effects_z,
                stride(&purview_state_labels, 1),
                &effects_hovertext,
                "green",
            ),
        ] {
            traces.push(Trace::Scatter(Scatter3d {
                visible: cfg.show_purview_labels,
                name: format!("{direction} Purview State Labels"),
                legend_group: None,
                show_legend: true,
                x: px.clone(),
                y: py.clone(),
                z: pz
                    .iter()
                    .map(|n| n + label_lift + cfg.state_label_z_offset)
                    .collect(),
                mode: TraceMode::Text,
                text: states,
                text_font: Some(TextFont {
                    size: cfg.state_label_size,
                    color: color.to_string(),
                }),
                marker: None,
                line: None,
                hover_text: hover.clone(),
                hover_label: Some(HoverLabel {
                    bgcolor: color.to_string(),
                    font_color: None,
                }),
            }));
        }

        for (direction, px, py, pz, sizes, plabels, hover, color) in [
            (
                "Cause",
                &causes_x,
                &causes_y,
                &causes_z,
                cause_purview_sizes,
                stride(&purview_labels, 0),
                &causes_hovertext,
                "red",
            ),
            (
                "Effect",
                &effects_x,
                &effects_y,
                &effects_z,
                effect_purview_sizes,
                stride(&purview_labels, 1),
                &effects_hovertext,
                "green",
            ),
        ] {
            traces.push(Trace::Scatter(Scatter3d {
                visible: cfg.show_purview_vertices,
                name: format!("{direction} Purviews"),
                legend_group: None,
                show_legend: true,
                x: px.clone(),
                y: py.clone(),
                z: pz.clone(),
                mode: TraceMode::Markers,
                text: plabels,
                text_font: None,
                marker: Some(Marker {
                    sizes,
                    color: color.to_string(),
                }),
                line: None,
                hover_text: hover.clone(),
                hover_label: Some(HoverLabel {
                    bgcolor: color.to_string(),
                    font_color: None,
                }),
            }));
        }

        let mut grouping = GroupingContext::new();

        if cfg.show_edges.is_enabled() {
            let edges = two_relation_edges(&features, &relations);
            if !edges.is_empty() {
                let two_indices: Vec<usize> = relations
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.order() == 2)
                    .map(|(j, _)| j)
                    .collect();
                let two_relations: Vec<Relation> =
                    two_indices.iter().map(|&j| relations[j].clone()).collect();
                let two_phis: Vec<f64> = two_relations.iter().map(|r| r.phi()).collect();
                let widths =
                    normalize_sizes(cfg.edge_size_range.0, cfg.edge_size_range.1, &two_phis);
                let mut width_by_relation = vec![0.0; relations.len()];
                for (k, &j) in two_indices.iter().enumerate() {
                    width_by_relation[j] = widths[k];
                }

                debug!(edges = edges.len(), "extracted 2-relation edges");

                for (j, [a, b]) in edges {
                    let relation = &relations[j];
                    let color = edge_color(relation, cfg.colorcode_2_relations)?;
                    let hover = labels::hovertext_relation(relation, node_labels);
                    let seg_x = vec![x[a], x[b]];
                    let seg_y = vec![y[a], y[b]];
                    let seg_z = vec![z[a], z[b]];

                    let mut keys = qfold_keys(relation, ces, substrate, &cfg.qfolds);
                    keys.push(LegendKey::AllTwoRelations);
                    for key in keys {
                        let show_legend = grouping.claim_legend(&key);
                        let name = key.display_name(node_labels);
                        traces.push(Trace::Scatter(Scatter3d {
                            visible: cfg.show_edges,
                            name: name.clone(),
                            legend_group: Some(name),
                            show_legend,
                            x: seg_x.clone(),
                            y: seg_y.clone(),
                            z: seg_z.clone(),
                            mode: TraceMode::Lines,
                            text: Vec::new(),
                            text_font: None,
                            marker: None,
                            line: Some(Line {
                                width: width_by_relation[j],
                                color: color.to_string(),
                            }),
                            hover_text: vec![hover.clone()],
                            hover_label: None,
                        }));
                    }
                }
            }
        }

        if cfg.show_mesh.is_enabled() {
            let triangles = three_relation_triangles(&features, &relations);
            if !triangles.is_empty() {
                let three_indices: Vec<usize> = relations
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.order() == 3)
                    .map(|(j, _)| j)
                    .collect();
                let three_phis: Vec<f64> =
                    three_indices.iter().map(|&j| relations[j].phi()).collect();
                let opacities = normalize_sizes(
                    cfg.surface_size_range.0,
                    cfg.surface_size_range.1,
                    &three_phis,
                );
                let mut opacity_by_relation = vec![0.0; relations.len()];
                for (k, &j) in three_indices.iter().enumerate() {
                    opacity_by_relation[j] = opacities[k];
                }
                let intensity = linspace(x.len());
                debug!(triangles = triangles.len(), "extracted 3-relation triangles");

                for (j, [a, b, c]) in triangles {
                    let relation = &relations[j];
                    let hover = labels::hovertext_relation(relation, node_labels);

                    let mut keys = qfold_keys(relation, ces, substrate, &cfg.qfolds);
                    keys.push(LegendKey::AllThreeRelations);
                    for key in keys {
                        let show_legend = grouping.claim_legend(&key);
                        let name = key.display_name(node_labels);
                        traces.push(Trace::Mesh(Mesh3d {
                            visible: cfg.show_mesh,
                            name: name.clone(),
                            legend_group: Some(name),
                            show_legend,
                            x: x.clone(),
                            y: y.clone(),
                            z: z.clone(),
                            i: vec![a],
                            j: vec![b],
                            k: vec![c],
                            intensity: intensity.clone(),
                            opacity: opacity_by_relation[j],
                            colorscale: "viridis".to_string(),
                            show_scale: false,
                            hover_text: vec![hover.clone()],
                        }));
                    }
                }
            }
        }

        let mut layout =
            self.base_layout([data_range(&x), data_range(&y), data_range(&z)]);

        if let (Some(renderer), Some(path)) = (self.digraph_renderer, cfg.digraph_path.as_ref()) {
            let graph = causal_digraph(substrate);
            renderer.render(&graph, &cfg.digraph_layout, path)?;
            let bytes = std::fs::read(path)?;
            layout.images.push(InsetImage {
                name: "Causal model".to_string(),
                source: format!("data:image/png;base64,{}", BASE64.encode(bytes)),
                x: cfg.digraph_coords.0,
                y: cfg.digraph_coords.1,
                size_x: cfg.digraph_size.0,
                size_y: cfg.digraph_size.1,
                x_anchor: "left".to_string(),
                y_anchor: "top".to_string(),
            });
            layout.annotations.push(Annotation {
                name: "Causal model".to_string(),
                text: "Causal model".to_string(),
                font_size: cfg.plot_title_size,
                x: cfg.digraph_coords.0,
                y: cfg.digraph_coords.1 + 0.05,
                x_anchor: "left".to_string(),
                y_anchor: "bottom".to_string(),
                show_arrow: false,
            });
            layout.left_margin = Some(cfg.left_margin);
        }

        let scene = Scene { traces, layout };

        if let (Some(exporter), Some(path)) = (self.exporter, cfg.export_path.as_ref()) {
            exporter.export(&scene, path)?;
            info!(path = %path.display(), "exported interactive scene");
        }

        Ok(scene)
    }

    fn base_layout(&self, ranges: [[f64; 2]; 3]) -> SceneLayout {
        let cfg = &self.config;
        SceneLayout {
            show_legend: true,
            x_axis: Axis::fixed_range(ranges[0], cfg.show_grid),
            y_axis: Axis::fixed_range(ranges[1], cfg.show_grid),
            z_axis: Axis::fixed_range(ranges[2], cfg.show_grid),
            camera: Camera {
                eye: cfg.camera_eye,
            },
            hover_mode: cfg.hover_mode.clone(),
            title: format!("{} Q-Structure", cfg.network_name),
            title_size: cfg.plot_title_size,
            legend: LegendStyle {
                title: "Trace legend (click trace to show/hide):".to_string(),
                title_size: cfg.legend_title_size,
                font_size: cfg.legend_font_size,
            },
            autosize: cfg.autosize,
            height: cfg.plot_dimensions.0,
            width: cfg.plot_dimensions.1,
            left_margin: None,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// Every second element starting at `offset`: the flat-array view of one
/// direction (0 = causes, 1 = effects).
fn stride<T: Clone>(values: &[T], offset: usize) -> Vec<T> {
    values.iter().skip(offset).step_by(2).cloned().collect()
}

/// Data extent padded by one unit on each side.
fn data_range(values: &[f64]) -> [f64; 2] {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    [min - 1.0, max + 1.0]
}

/// `n` evenly spaced values over `[0, 1]`, endpoint included.
fn linspace(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![0.0; n];
    }
    (0..n).map(|t| t as f64 / (n - 1) as f64).collect()
}
