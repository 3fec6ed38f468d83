//! Public types and constants for the visualization module.

use serde::{Deserialize, Serialize};

use crate::style::Color;

/// Where a legend box is attached inside the map area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendAnchor {
    Top,
    TopRight,
    Right,
    #[default]
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
    Center,
}

/// Flow of legend items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendDirection {
    Row,
    #[default]
    Column,
}

/// Swatch shape drawn in front of each legend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolShape {
    #[default]
    Square,
    Circle,
}

/// Options of one box legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub anchor: LegendAnchor,
    pub direction: LegendDirection,
    pub translate_x: f64,
    pub translate_y: f64,
    pub item_width: f64,
    pub item_height: f64,
    pub items_spacing: f64,
    pub symbol_size: f64,
    pub symbol_spacing: f64,
    pub symbol_shape: SymbolShape,
    /// Label color; falls back to the theme text color.
    pub item_text_color: Option<Color>,
    pub padding: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            anchor: LegendAnchor::BottomRight,
            direction: LegendDirection::Column,
            translate_x: 0.0,
            translate_y: 0.0,
            item_width: 110.0,
            item_height: 18.0,
            items_spacing: 2.0,
            symbol_size: 14.0,
            symbol_spacing: 8.0,
            symbol_shape: SymbolShape::Square,
            item_text_color: None,
            padding: 0.0,
        }
    }
}
