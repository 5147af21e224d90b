//! Scene primitive and layout types consumed by the export collaborator.
//!
//! These are plain data; the interactive rendering and file format live
//! behind the exporter boundary.

use serde::{Deserialize, Serialize};

/// Initial visibility of a trace in the interactive scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Shown,
    Hidden,
    /// Rendered into the document but toggled off until the legend entry is
    /// clicked.
    LegendOnly,
}

impl Visibility {
    /// Whether primitives under this visibility are built at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Visibility::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    Text,
    Markers,
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFont {
    pub size: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverLabel {
    pub bgcolor: String,
    pub font_color: Option<String>,
}

/// Marker styling; one size per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub sizes: Vec<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub width: f64,
    pub color: String,
}

/// A 3D scatter trace: text labels, markers, or a line segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scatter3d {
    pub visible: Visibility,
    pub name: String,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub mode: TraceMode,
    pub text: Vec<String>,
    pub text_font: Option<TextFont>,
    pub marker: Option<Marker>,
    pub line: Option<Line>,
    pub hover_text: Vec<String>,
    pub hover_label: Option<HoverLabel>,
}

/// A 3D mesh trace holding the full vertex arrays and one triangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh3d {
    pub visible: Visibility,
    pub name: String,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub i: Vec<usize>,
    pub j: Vec<usize>,
    pub k: Vec<usize>,
    /// Per-vertex intensity interpolated across the surface.
    pub intensity: Vec<f64>,
    pub opacity: f64,
    pub colorscale: String,
    pub show_scale: bool,
    pub hover_text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trace {
    Scatter(Scatter3d),
    Mesh(Mesh3d),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Scatter(t) => &t.name,
            Trace::Mesh(t) => &t.name,
        }
    }

    pub fn legend_group(&self) -> Option<&str> {
        match self {
            Trace::Scatter(t) => t.legend_group.as_deref(),
            Trace::Mesh(t) => t.legend_group.as_deref(),
        }
    }

    pub fn shows_legend(&self) -> bool {
        match self {
            Trace::Scatter(t) => t.show_legend,
            Trace::Mesh(t) => t.show_legend,
        }
    }
}

/// One scene axis; ranges are fixed from the data extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub show_background: bool,
    pub show_line: bool,
    pub zero_line: bool,
    pub show_grid: bool,
    pub grid_color: String,
    pub show_tick_labels: bool,
    pub show_spikes: bool,
    pub auto_range: bool,
    pub range: [f64; 2],
    pub background_color: String,
    pub title: String,
}

impl Axis {
    /// The fixed axis style used throughout: quiet chrome, data-driven
    /// range.
    pub fn fixed_range(range: [f64; 2], show_grid: bool) -> Self {
        Self {
            show_background: false,
            show_line: false,
            zero_line: false,
            show_grid,
            grid_color: "lightgray".to_string(),
            show_tick_labels: false,
            show_spikes: true,
            auto_range: false,
            range,
            background_color: "white".to_string(),
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendStyle {
    pub title: String,
    pub title_size: f64,
    pub font_size: f64,
}

/// A raster image embedded at a paper-relative position (the causal-model
/// inset). `source` is a self-contained data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetImage {
    pub name: String,
    pub source: String,
    pub x: f64,
    pub y: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub x_anchor: String,
    pub y_anchor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub text: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub x_anchor: String,
    pub y_anchor: String,
    pub show_arrow: bool,
}

/// Scene-wide layout: axes, camera, legend, title, dimensions, and the
/// optional inset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    pub show_legend: bool,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub z_axis: Axis,
    pub camera: Camera,
    pub hover_mode: String,
    pub title: String,
    pub title_size: f64,
    pub legend: LegendStyle,
    pub autosize: bool,
    pub height: u32,
    pub width: u32,
    pub left_margin: Option<f64>,
    pub images: Vec<InsetImage>,
    pub annotations: Vec<Annotation>,
}

/// The fully assembled layered scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub traces: Vec<Trace>,
    pub layout: SceneLayout,
}

impl Scene {
    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn scatter_traces(&self) -> impl Iterator<Item = &Scatter3d> + '_ {
        self.traces.iter().filter_map(|t| match t {
            Trace::Scatter(s) => Some(s),
            Trace::Mesh(_) => None,
        })
    }

    pub fn mesh_traces(&self) -> impl Iterator<Item = &Mesh3d> + '_ {
        self.traces.iter().filter_map(|t| match t {
            Trace::Mesh(m) => Some(m),
            Trace::Scatter(_) => None,
        })
    }

    /// Traces belonging to one legend group.
    pub fn legend_group(&self, name: &str) -> impl Iterator<Item = &Trace> + '_ {
        let name = name.to_string();
        self.traces
            .iter()
            .filter(move |t| t.legend_group() == Some(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_enabled() {
        assert!(Visibility::Shown.is_enabled());
        assert!(Visibility::LegendOnly.is_enabled());
        assert!(!Visibility::Hidden.is_enabled());
    }

    #[test]
    fn test_axis_fixed_range() {
        let axis = Axis::fixed_range([-1.0, 4.0], false);
        assert_eq!(axis.range, [-1.0, 4.0]);
        assert!(!axis.auto_range);
        assert!(!axis.show_tick_labels);
        assert!(axis.show_spikes);
    }

    #[test]
    fn test_scene_serializes() {
        let scene = Scene {
            traces: vec![Trace::Scatter(Scatter3d {
                visible: Visibility::Shown,
                name: "Mechanisms".to_string(),
                legend_group: None,
                show_legend: true,
                x: vec![0.0],
                y: vec![0.0],
                z: vec![1.0],
                mode: TraceMode::Markers,
                text: vec!["A".to_string()],
                text_font: None,
                marker: Some(Marker {
                    sizes: vec![25.0],
                    color: "black".to_string(),
                }),
                line: None,
                hover_text: vec!["Distinction: A".to_string()],
                hover_label: None,
            })],
            layout: SceneLayout {
                show_legend: true,
                x_axis: Axis::fixed_range([-1.0, 1.0], false),
                y_axis: Axis::fixed_range([-1.0, 1.0], false),
                z_axis: Axis::fixed_range([0.0, 2.0], false),
                camera: Camera {
                    eye: [0.5, 0.5, 0.5],
                },
                hover_mode: "x".to_string(),
                title: " Q-Structure".to_string(),
                title_size: 20.0,
                legend: LegendStyle {
                    title: "Trace legend (click trace to show/hide):".to_string(),
                    title_size: 12.0,
                    font_size: 10.0,
                },
                autosize: false,
                height: 768,
                width: 1366,
                left_margin: None,
                images: Vec::new(),
                annotations: Vec::new(),
            },
        };
        let json = serde_json::to_string(&scene).unwrap();
        assert!(json.contains("\"Mechanisms\""));
    }
}
