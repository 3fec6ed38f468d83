//! Top-level entry point: one synchronous pass of bind → project → compose.

use std::path::Path;

use log::debug;

use crate::binder::{BoundFeature, Binding, LabelAccessor, ValueAccessor};
use crate::config::{ChoroplethConfig, ChoroplethOptions};
use crate::error::ChoroplethError;
use crate::format::ValueFormat;
use crate::interaction::{
    ClickHandler, InteractionRouter, PointerEvent, TooltipContent, TooltipRenderer, TooltipService,
};
use crate::matcher::MatchRule;
use crate::models::{DataRecord, Feature};
use crate::projection::{GeoProjection, ProjectedShape, Projector};
use crate::viz::{self, Layer, Scene, SceneComposer};

/// A configured choropleth plus the caller hooks that cannot live in a
/// serializable options file (predicates, accessors, callbacks, custom layers).
#[derive(Clone)]
pub struct Choropleth {
    config: ChoroplethConfig,
    on_click: Option<ClickHandler>,
    tooltip: Option<TooltipRenderer>,
}

/// Output of one pass. Rebuilt from scratch on every [`Choropleth::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMap {
    pub binding: Binding,
    pub scene: Scene,
}

impl RenderedMap {
    /// Bound feature under the pointer, topmost first.
    pub fn feature_at(&self, event: &PointerEvent) -> Option<&BoundFeature> {
        self.scene
            .feature_at(event)
            .and_then(|i| self.binding.features.get(i))
    }

    pub fn save<P: AsRef<Path>>(&self, out_path: P, font_path: Option<&Path>) -> anyhow::Result<()> {
        viz::render_to_file(&self.scene, out_path, font_path)
    }
}

impl Choropleth {
    pub fn new(config: ChoroplethConfig) -> Self {
        Self {
            config,
            on_click: None,
            tooltip: None,
        }
    }

    pub fn from_options(options: &ChoroplethOptions) -> Result<Self, ChoroplethError> {
        Ok(Self::new(options.resolve()?))
    }

    pub fn config(&self) -> &ChoroplethConfig {
        &self.config
    }

    pub fn with_match(mut self, rule: MatchRule) -> Self {
        self.config.binder.match_rule = rule;
        self
    }

    pub fn with_match_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Feature, &DataRecord) -> bool + Send + Sync + 'static,
    {
        self.with_match(MatchRule::predicate(f))
    }

    pub fn with_value(mut self, accessor: ValueAccessor) -> Self {
        self.config.binder.value = accessor;
        self
    }

    pub fn with_label(mut self, accessor: LabelAccessor) -> Self {
        self.config.binder.label = accessor;
        self
    }

    pub fn with_value_format(mut self, format: ValueFormat) -> Self {
        self.config.binder.format = format;
        self
    }

    /// Replace the layer list; use [`Layer::custom`] for caller-drawn layers.
    pub fn with_layers(mut self, layers: Vec<Layer>) -> Self {
        self.config.layers = layers;
        self
    }

    pub fn with_on_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundFeature, &PointerEvent) + Send + Sync + 'static,
    {
        self.on_click = Some(std::sync::Arc::new(f));
        self
    }

    /// Override the tooltip content built for a hovered feature.
    pub fn with_tooltip<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundFeature) -> TooltipContent + Send + Sync + 'static,
    {
        self.tooltip = Some(std::sync::Arc::new(f));
        self
    }

    /// Bind, project and compose. Configuration errors surface before any
    /// projection; the first projection failure aborts the pass.
    pub fn render(&self, features: &[Feature], records: &[DataRecord]) -> Result<RenderedMap, ChoroplethError> {
        let cfg = &self.config;
        let binding = cfg.binder.bind(features, records)?;

        let projection = GeoProjection::new(
            &cfg.projection,
            cfg.inner_width() as f64,
            cfg.inner_height() as f64,
        );
        let shapes = binding
            .features
            .iter()
            .map(|bf| projection.project(&bf.feature))
            .collect::<Result<Vec<ProjectedShape>, _>>()?;

        let scene = SceneComposer::new(cfg, &projection).compose(&cfg.layers, &binding, &shapes);
        debug!(
            "composed {} layer node(s) for {} feature(s)",
            scene.nodes.len(),
            binding.features.len()
        );
        Ok(RenderedMap { binding, scene })
    }

    /// Event router wired to this map's interactivity flag and hooks.
    pub fn router<'a>(&'a self, tooltip: &'a dyn TooltipService) -> InteractionRouter<'a> {
        InteractionRouter::new(self.config.is_interactive)
            .with_tooltip(tooltip)
            .with_click(self.on_click.as_ref())
            .with_renderer(self.tooltip.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;
    use serde_json::json;

    fn square(id: i64, x: f64) -> Feature {
        Feature::new(
            id,
            Geometry::Polygon(vec![vec![
                [x, 0.0],
                [x + 10.0, 0.0],
                [x + 10.0, 10.0],
                [x, 10.0],
                [x, 0.0],
            ]]),
        )
    }

    #[test]
    fn render_keeps_feature_order_in_scene() {
        let map = Choropleth::from_options(&ChoroplethOptions::default()).unwrap();
        let features = vec![square(2, 20.0), square(1, 0.0)];
        let records = vec![DataRecord::new().with("id", 1).with("value", 5)];
        let out = map.render(&features, &records).unwrap();
        let nodes = out.scene.feature_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].feature_index, 0);
        assert_eq!(nodes[0].fill, out.binding.unknown_color);
        assert_eq!(out.binding.features[1].value, Some(5.0));
    }

    #[test]
    fn projection_failure_is_propagated() {
        let map = Choropleth::from_options(&ChoroplethOptions::default()).unwrap();
        let bad = Feature::new("X", Geometry::Polygon(vec![vec![[f64::NAN, 0.0]]]));
        let err = map.render(&[bad], &[]).unwrap_err();
        assert!(matches!(err, ChoroplethError::Projection { ref feature, .. } if feature == "X"));
    }

    #[test]
    fn predicate_match_overrides_key() {
        let map = Choropleth::from_options(&ChoroplethOptions::default())
            .unwrap()
            .with_match_fn(|f, r| f.lookup("id") == r.lookup("code"));
        let records = vec![DataRecord::new().with("code", json!(1)).with("value", 3)];
        let out = map.render(&[square(1, 0.0)], &records).unwrap();
        assert_eq!(out.binding.features[0].value, Some(3.0));
    }
}
