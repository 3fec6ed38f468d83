//! Scene composition: the ordered layer list becomes an ordered node tree.
//!
//! Node order is paint order, so the first layer ends up at the bottom.

use std::fmt;
use std::sync::Arc;

use crate::binder::Binding;
use crate::config::{ChoroplethConfig, Margin};
use crate::interaction::PointerEvent;
use crate::projection::{GeoProjection, ProjectedShape};
use crate::style::{Color, Theme};

use super::legend::{LegendLayout, layout_box_legend};

/// Context handed to custom layers; currently empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomLayerContext {}

pub type CustomLayerFn = Arc<dyn Fn(&CustomLayerContext) -> SceneNode + Send + Sync>;

#[derive(Clone)]
pub enum Layer {
    Graticule,
    Features,
    Legends,
    Custom(CustomLayerFn),
}

impl Layer {
    /// Built-in layer by name; `None` for anything unrecognized.
    pub fn from_name(name: &str) -> Option<Layer> {
        match name.trim().to_ascii_lowercase().as_str() {
            "graticule" => Some(Layer::Graticule),
            "features" => Some(Layer::Features),
            "legends" => Some(Layer::Legends),
            _ => None,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&CustomLayerContext) -> SceneNode + Send + Sync + 'static,
    {
        Layer::Custom(Arc::new(f))
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Graticule => f.write_str("Graticule"),
            Layer::Features => f.write_str("Features"),
            Layer::Legends => f.write_str("Legends"),
            Layer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One colored map region ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNode {
    /// Index into `Binding::features`.
    pub feature_index: usize,
    pub shape: ProjectedShape,
    pub path: String,
    pub fill: Color,
    pub border_width: f64,
    pub border_color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Group {
        id: String,
        children: Vec<SceneNode>,
    },
    Feature(FeatureNode),
    Legend(LegendLayout),
    Polyline {
        points: Vec<(f64, f64)>,
        color: Color,
        width: f64,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Color,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        color: Color,
        font_px: f64,
    },
}

impl SceneNode {
    pub fn group(id: &str, children: Vec<SceneNode>) -> Self {
        SceneNode::Group {
            id: id.to_string(),
            children,
        }
    }

    fn topmost_feature_at(&self, x: f64, y: f64) -> Option<usize> {
        match self {
            SceneNode::Feature(node) if node.shape.contains(x, y) => Some(node.feature_index),
            SceneNode::Group { children, .. } => children
                .iter()
                .rev()
                .find_map(|child| child.topmost_feature_at(x, y)),
            _ => None,
        }
    }

    fn collect_features<'a>(&'a self, out: &mut Vec<&'a FeatureNode>) {
        match self {
            SceneNode::Feature(node) => out.push(node),
            SceneNode::Group { children, .. } => {
                for child in children {
                    child.collect_features(out);
                }
            }
            _ => {}
        }
    }
}

/// Composed visual tree plus canvas geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Outer size, margins included.
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    pub theme: Theme,
    /// Children are in map-area coordinates; renderers offset them by the margin.
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    /// Index of the topmost feature under the pointer (outer coordinates).
    pub fn feature_at(&self, event: &PointerEvent) -> Option<usize> {
        let x = event.x - self.margin.left as f64;
        let y = event.y - self.margin.top as f64;
        self.nodes
            .iter()
            .rev()
            .find_map(|node| node.topmost_feature_at(x, y))
    }

    pub fn feature_nodes(&self) -> Vec<&FeatureNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.collect_features(&mut out);
        }
        out
    }
}

/// Resolves layers against one binding pass.
pub struct SceneComposer<'a> {
    config: &'a ChoroplethConfig,
    projection: &'a GeoProjection,
}

impl<'a> SceneComposer<'a> {
    pub fn new(config: &'a ChoroplethConfig, projection: &'a GeoProjection) -> Self {
        Self { config, projection }
    }

    /// Build the scene. `shapes[i]` is the projection of `binding.features[i]`.
    pub fn compose(&self, layers: &[Layer], binding: &Binding, shapes: &[ProjectedShape]) -> Scene {
        let nodes = layers
            .iter()
            .filter_map(|layer| self.resolve(layer, binding, shapes))
            .collect();
        Scene {
            width: self.config.width,
            height: self.config.height,
            margin: self.config.margin,
            theme: self.config.theme.clone(),
            nodes,
        }
    }

    fn resolve(&self, layer: &Layer, binding: &Binding, shapes: &[ProjectedShape]) -> Option<SceneNode> {
        let cfg = self.config;
        match layer {
            Layer::Graticule => {
                if !cfg.enable_graticule {
                    return None;
                }
                let lines = self
                    .projection
                    .graticule(cfg.graticule_step)
                    .into_iter()
                    .map(|points| SceneNode::Polyline {
                        points,
                        color: cfg.graticule_line_color,
                        width: cfg.graticule_line_width,
                    })
                    .collect();
                Some(SceneNode::group("graticule", lines))
            }
            Layer::Features => {
                let children = binding
                    .features
                    .iter()
                    .zip(shapes)
                    .map(|(feature, shape)| {
                        SceneNode::Feature(FeatureNode {
                            feature_index: feature.index,
                            path: shape.to_path_string(),
                            shape: shape.clone(),
                            fill: binding.color_of(feature),
                            border_width: cfg.border_width,
                            border_color: cfg.border_color,
                        })
                    })
                    .collect();
                Some(SceneNode::group("features", children))
            }
            Layer::Legends => {
                let (w, h) = (cfg.inner_width() as f64, cfg.inner_height() as f64);
                let children = cfg
                    .legends
                    .iter()
                    .map(|legend| {
                        SceneNode::Legend(layout_box_legend(legend, &binding.legend, w, h, &cfg.theme))
                    })
                    .collect();
                Some(SceneNode::group("legends", children))
            }
            Layer::Custom(render) => Some(render(&CustomLayerContext::default())),
        }
    }
}
