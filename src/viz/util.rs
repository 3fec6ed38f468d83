//! Helpers bridging crate types and plotters.

use plotters::prelude::*;
use plotters::style::Color as _;

use crate::style::Color;

#[inline]
pub fn to_rgb(c: Color) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Stroke style for borders and graticule lines; widths below half a pixel are skipped.
pub fn stroke_style(c: Color, width: f64) -> Option<ShapeStyle> {
    if width < 0.5 {
        return None;
    }
    Some(to_rgb(c).stroke_width(width.round().max(1.0) as u32))
}

/// Round scene coordinates to backend pixels, shifted by the canvas margin.
pub fn to_pixels(points: &[(f64, f64)], dx: f64, dy: f64) -> Vec<(i32, i32)> {
    points
        .iter()
        .map(|(x, y)| ((x + dx).round() as i32, (y + dy).round() as i32))
        .collect()
}
