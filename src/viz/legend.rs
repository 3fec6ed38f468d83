//! Box legend layout and drawing.
//!
//! Layout is computed in map-area coordinates from the legend entries and the
//! container size, independent of any backend. Drawing translates the layout
//! by the canvas margin.

use anyhow::{Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use super::text::truncate_to_width;
use super::types::{LegendAnchor, LegendConfig, LegendDirection, SymbolShape};
use super::util::to_rgb;
use crate::scale::LegendEntry;
use crate::style::{Color, Theme};

/// Position of one swatch + label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItemLayout {
    /// Swatch top-left corner.
    pub symbol_x: f64,
    pub symbol_y: f64,
    pub symbol_size: f64,
    pub symbol_shape: SymbolShape,
    pub color: Color,
    /// Label anchor: left edge, vertical middle.
    pub label_x: f64,
    pub label_y: f64,
    pub label: String,
}

/// A laid-out legend box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text_color: Color,
    pub font_px: f64,
    pub items: Vec<LegendItemLayout>,
}

/// Top-left corner of a `w`×`h` box attached at `anchor` in a container.
fn position_from_anchor(anchor: LegendAnchor, cw: f64, ch: f64, w: f64, h: f64) -> (f64, f64) {
    match anchor {
        LegendAnchor::Top => ((cw - w) / 2.0, 0.0),
        LegendAnchor::TopRight => (cw - w, 0.0),
        LegendAnchor::Right => (cw - w, (ch - h) / 2.0),
        LegendAnchor::BottomRight => (cw - w, ch - h),
        LegendAnchor::Bottom => ((cw - w) / 2.0, ch - h),
        LegendAnchor::BottomLeft => (0.0, ch - h),
        LegendAnchor::Left => (0.0, (ch - h) / 2.0),
        LegendAnchor::TopLeft => (0.0, 0.0),
        LegendAnchor::Center => ((cw - w) / 2.0, (ch - h) / 2.0),
    }
}

/// Lay out `entries` as a box legend inside a `container_w`×`container_h` area.
pub fn layout_box_legend(
    config: &LegendConfig,
    entries: &[LegendEntry],
    container_w: f64,
    container_h: f64,
    theme: &Theme,
) -> LegendLayout {
    let n = entries.len().max(1) as f64;
    let (content_w, content_h) = match config.direction {
        LegendDirection::Column => (
            config.item_width,
            config.item_height * n + config.items_spacing * (n - 1.0),
        ),
        LegendDirection::Row => (
            config.item_width * n + config.items_spacing * (n - 1.0),
            config.item_height,
        ),
    };
    let width = content_w + config.padding * 2.0;
    let height = content_h + config.padding * 2.0;
    let (ax, ay) = position_from_anchor(config.anchor, container_w, container_h, width, height);
    let x = ax + config.translate_x;
    let y = ay + config.translate_y;

    let font_px = theme.font_size as f64;
    let label_room = (config.item_width - config.symbol_size - config.symbol_spacing).max(0.0);

    let items = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let step = i as f64;
            let (ix, iy) = match config.direction {
                LegendDirection::Column => (
                    x + config.padding,
                    y + config.padding + step * (config.item_height + config.items_spacing),
                ),
                LegendDirection::Row => (
                    x + config.padding + step * (config.item_width + config.items_spacing),
                    y + config.padding,
                ),
            };
            LegendItemLayout {
                symbol_x: ix,
                symbol_y: iy + (config.item_height - config.symbol_size) / 2.0,
                symbol_size: config.symbol_size,
                symbol_shape: config.symbol_shape,
                color: entry.color,
                label_x: ix + config.symbol_size + config.symbol_spacing,
                label_y: iy + config.item_height / 2.0,
                label: truncate_to_width(&entry.label, font_px, label_room),
            }
        })
        .collect();

    LegendLayout {
        x,
        y,
        width,
        height,
        text_color: config.item_text_color.unwrap_or(theme.text_color),
        font_px,
        items,
    }
}

/// Draw a laid-out legend, shifted by `(dx, dy)` (the canvas margin).
/// Labels are skipped when `with_labels` is false (no usable font).
pub fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    layout: &LegendLayout,
    dx: f64,
    dy: f64,
    theme: &Theme,
    with_labels: bool,
) -> Result<()> {
    let text_rgb = to_rgb(layout.text_color);
    let label_style = TextStyle::from((theme.font_family.as_str(), layout.font_px))
        .color(&text_rgb)
        .pos(Pos::new(HPos::Left, VPos::Center));

    for item in &layout.items {
        let x0 = (item.symbol_x + dx).round() as i32;
        let y0 = (item.symbol_y + dy).round() as i32;
        let size = item.symbol_size.round() as i32;
        let fill = to_rgb(item.color).filled();
        match item.symbol_shape {
            SymbolShape::Square => area
                .draw(&Rectangle::new([(x0, y0), (x0 + size, y0 + size)], fill))
                .map_err(|e| anyhow!("{:?}", e))?,
            SymbolShape::Circle => area
                .draw(&Circle::new((x0 + size / 2, y0 + size / 2), size / 2, fill))
                .map_err(|e| anyhow!("{:?}", e))?,
        }
        if !with_labels || item.label.is_empty() {
            continue;
        }
        area.draw(&Text::new(
            item.label.as_str(),
            (
                (item.label_x + dx).round() as i32,
                (item.label_y + dy).round() as i32,
            ),
            label_style.clone(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}
