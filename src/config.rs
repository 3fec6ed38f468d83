//! Choropleth options: every field optional, merged, then resolved once.
//!
//! [`ChoroplethOptions`] is what callers write (in code or in a JSON file).
//! [`ChoroplethOptions::merge`] layers overrides on top of a base, and
//! [`ChoroplethOptions::resolve`] fills in defaults and validates the result
//! into a [`ChoroplethConfig`]. Invalid configuration is reported here, before
//! anything is bound or rendered.

use crate::binder::{Binder, DEFAULT_UNKNOWN_COLOR, LabelAccessor, ValueAccessor};
use crate::error::ChoroplethError;
use crate::format::ValueFormat;
use crate::matcher::MatchRule;
use crate::projection::ProjectionOptions;
use crate::scale::{ColorConfig, ColorScheme, DomainSpec, ScaleMode};
use crate::style::{Color, Theme};
use crate::viz::scene::Layer;
use crate::viz::types::LegendConfig;
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 500;
pub const DEFAULT_LAYERS: [&str; 3] = ["graticule", "features", "legends"];
/// Smallest graticule spacing accepted, in degrees.
pub const MIN_GRATICULE_STEP: f64 = 0.1;

/// Space between the outer canvas edge and the map area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoroplethOptions {
    /// Key path compared on features and records.
    #[serde(rename = "match")]
    pub match_key: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
    pub value_format: Option<String>,
    pub colors: Option<ColorScheme>,
    pub scale_mode: Option<ScaleMode>,
    pub domain: Option<DomainSpec>,
    pub unknown_color: Option<Color>,
    pub border_width: Option<f64>,
    pub border_color: Option<Color>,
    pub enable_graticule: Option<bool>,
    pub graticule_step: Option<f64>,
    pub graticule_line_width: Option<f64>,
    pub graticule_line_color: Option<Color>,
    pub projection: Option<ProjectionOptions>,
    pub layers: Option<Vec<String>>,
    pub legends: Option<Vec<LegendConfig>>,
    pub legend_steps: Option<usize>,
    pub is_interactive: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub margin: Option<Margin>,
    pub locale: Option<String>,
    pub theme: Option<Theme>,
    /// TTF/OTF font registered for bitmap output.
    pub font_path: Option<String>,
}

macro_rules! merge_fields {
    ($base:ident, $over:ident, { $($field:ident),* $(,)? }) => {
        ChoroplethOptions {
            $($field: $over.$field.or($base.$field),)*
        }
    };
}

impl ChoroplethOptions {
    /// Field-wise merge: every option set in `overrides` wins.
    pub fn merge(self, overrides: ChoroplethOptions) -> ChoroplethOptions {
        let base = self;
        let over = overrides;
        merge_fields!(base, over, {
            match_key, label, value, value_format, colors, scale_mode, domain, unknown_color,
            border_width, border_color, enable_graticule, graticule_step, graticule_line_width,
            graticule_line_color, projection, layers, legends, legend_steps, is_interactive,
            width, height, margin, locale, theme, font_path,
        })
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parse choropleth options")
    }

    /// Load options from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read options file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Apply defaults and validate.
    pub fn resolve(&self) -> Result<ChoroplethConfig, ChoroplethError> {
        let domain = self.domain.unwrap_or_default();
        domain.validate()?;

        let colors = ColorConfig {
            scheme: self.colors.clone().unwrap_or_default(),
            mode: self.scale_mode.unwrap_or_default(),
        };
        colors.scheme.resolve()?;

        let format = match &self.value_format {
            Some(spec) => ValueFormat::parse(spec)?,
            None => ValueFormat::Plain,
        };

        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        let margin = self.margin.unwrap_or_default();
        let fits = |a: u32, b: u32, outer: u32| a.checked_add(b).is_some_and(|sum| sum < outer);
        if !fits(margin.left, margin.right, width) || !fits(margin.top, margin.bottom, height) {
            return Err(ChoroplethError::InvalidDimensions(format!(
                "margins leave no room inside {width}x{height}"
            )));
        }

        let border_width = self.border_width.unwrap_or(0.0);
        if !border_width.is_finite() || border_width < 0.0 {
            return Err(ChoroplethError::InvalidDimensions(format!(
                "border width must be a non-negative number, got {border_width}"
            )));
        }

        let graticule_step = self.graticule_step.unwrap_or(10.0);
        if !graticule_step.is_finite() || graticule_step < MIN_GRATICULE_STEP {
            return Err(ChoroplethError::InvalidDimensions(format!(
                "graticule step must be at least {MIN_GRATICULE_STEP} degrees, got {graticule_step}"
            )));
        }

        let projection = self.projection.unwrap_or_default();
        if !projection.scale.is_finite() || projection.scale <= 0.0 {
            return Err(ChoroplethError::InvalidDimensions(format!(
                "projection scale must be positive, got {}",
                projection.scale
            )));
        }

        let layer_names: Vec<String> = match &self.layers {
            Some(names) => names.clone(),
            None => DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect(),
        };
        let layers = layer_names
            .iter()
            .filter_map(|name| {
                let layer = Layer::from_name(name);
                if layer.is_none() {
                    warn!("ignoring unknown layer `{name}`");
                }
                layer
            })
            .collect();

        let binder = Binder {
            match_rule: MatchRule::Key(self.match_key.clone().unwrap_or_else(|| "id".into())),
            value: ValueAccessor::Field(self.value.clone().unwrap_or_else(|| "value".into())),
            label: LabelAccessor::Field(self.label.clone().unwrap_or_else(|| "id".into())),
            format,
            colors,
            domain,
            unknown_color: self.unknown_color.unwrap_or(DEFAULT_UNKNOWN_COLOR),
            locale: self.locale.clone().unwrap_or_else(|| "en".into()),
            legend_steps: self.legend_steps.unwrap_or(5),
        };

        Ok(ChoroplethConfig {
            binder,
            border_width,
            border_color: self.border_color.unwrap_or(Color::rgb(0, 0, 0)),
            enable_graticule: self.enable_graticule.unwrap_or(false),
            graticule_step,
            graticule_line_width: self.graticule_line_width.unwrap_or(0.5),
            graticule_line_color: self
                .graticule_line_color
                .unwrap_or(Color::rgb(0x99, 0x99, 0x99)),
            projection,
            layers,
            legends: self.legends.clone().unwrap_or_default(),
            is_interactive: self.is_interactive.unwrap_or(true),
            width,
            height,
            margin,
            theme: self.theme.clone().unwrap_or_default(),
            font_path: self.font_path.clone(),
        })
    }
}

/// Fully resolved configuration of one choropleth.
#[derive(Debug, Clone)]
pub struct ChoroplethConfig {
    pub binder: Binder,
    pub border_width: f64,
    pub border_color: Color,
    pub enable_graticule: bool,
    pub graticule_step: f64,
    pub graticule_line_width: f64,
    pub graticule_line_color: Color,
    pub projection: ProjectionOptions,
    pub layers: Vec<Layer>,
    pub legends: Vec<LegendConfig>,
    pub is_interactive: bool,
    /// Outer canvas width, margins included.
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    pub theme: Theme,
    pub font_path: Option<String>,
}

impl ChoroplethConfig {
    pub fn inner_width(&self) -> u32 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> u32 {
        self.height - self.margin.top - self.margin.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_and_unset_fields_fall_through() {
        let base = ChoroplethOptions {
            match_key: Some("iso".into()),
            width: Some(1000),
            enable_graticule: Some(true),
            ..Default::default()
        };
        let over = ChoroplethOptions {
            width: Some(640),
            enable_graticule: Some(false),
            ..Default::default()
        };
        let merged = base.merge(over);
        assert_eq!(merged.match_key.as_deref(), Some("iso"));
        assert_eq!(merged.width, Some(640));
        assert_eq!(merged.enable_graticule, Some(false));
    }

    #[test]
    fn defaults_resolve() {
        let cfg = ChoroplethOptions::default().resolve().unwrap();
        assert_eq!(cfg.width, DEFAULT_WIDTH);
        assert_eq!(cfg.layers.len(), 3);
        assert!(cfg.is_interactive);
        assert!(!cfg.enable_graticule);
        assert_eq!(cfg.binder.unknown_color, DEFAULT_UNKNOWN_COLOR);
    }

    #[test]
    fn unknown_layers_are_skipped() {
        let opts = ChoroplethOptions {
            layers: Some(vec!["features".into(), "mesh".into()]),
            ..Default::default()
        };
        assert_eq!(opts.resolve().unwrap().layers.len(), 1);
    }

    #[test]
    fn margins_must_fit() {
        let opts = ChoroplethOptions {
            width: Some(100),
            margin: Some(Margin {
                left: 60,
                right: 40,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            opts.resolve(),
            Err(ChoroplethError::InvalidDimensions(_))
        ));

        let overflowing = ChoroplethOptions {
            margin: Some(Margin {
                left: u32::MAX,
                right: 1,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            overflowing.resolve(),
            Err(ChoroplethError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn graticule_step_is_bounded() {
        for step in [1e-7, 0.0, -5.0, f64::NAN, f64::INFINITY] {
            let opts = ChoroplethOptions {
                graticule_step: Some(step),
                ..Default::default()
            };
            assert!(
                matches!(opts.resolve(), Err(ChoroplethError::InvalidDimensions(_))),
                "step {step} accepted"
            );
        }
        let opts = ChoroplethOptions {
            graticule_step: Some(15.0),
            ..Default::default()
        };
        assert_eq!(opts.resolve().unwrap().graticule_step, 15.0);
    }

    #[test]
    fn json_keys_match_option_names() {
        let opts = ChoroplethOptions::from_json_str(
            r##"{
                "match": "properties.iso_a3",
                "colors": ["#000000", "#ffffff"],
                "domain": [0, 10],
                "unknown_color": "#eee",
                "projection": {"type": "equirectangular", "scale": 120}
            }"##,
        )
        .unwrap();
        let cfg = opts.resolve().unwrap();
        assert!(matches!(cfg.binder.match_rule, MatchRule::Key(ref k) if k == "properties.iso_a3"));
        assert_eq!(cfg.binder.domain, DomainSpec::Explicit { min: 0.0, max: 10.0 });
        assert_eq!(cfg.binder.unknown_color, Color::rgb(0xee, 0xee, 0xee));
        assert_eq!(cfg.projection.scale, 120.0);
        assert_eq!(cfg.projection.translation, [0.5, 0.5]);
    }
}
