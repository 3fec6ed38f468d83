//! Visualization: compose a choropleth scene and render it to **SVG** or **PNG**.
//!
//! - [`scene`] turns the layer list of a binding pass into an ordered node tree
//! - [`legend`] lays out and draws box legends
//! - [`render_to_file`] picks the backend from the output extension
//!   (`.svg` → SVG, anything else → bitmap through `plotters-bitmap`)
//!
//! Bitmap text goes through the `ab_glyph` path, which does not discover OS
//! fonts. A font is registered once per process from the configured
//! `font_path` or a known system location; without one, bitmap output omits
//! labels. SVG output writes `<text>` elements and needs no font.

pub mod legend;
pub mod scene;
pub mod text;
pub mod types;
pub mod util;

pub use legend::{LegendItemLayout, LegendLayout};
pub use scene::{CustomLayerContext, FeatureNode, Layer, Scene, SceneComposer, SceneNode};
pub use types::{LegendAnchor, LegendConfig, LegendDirection, SymbolShape};

use anyhow::{Result, anyhow};
use log::{debug, warn};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::OnceLock;

use crate::style::Theme;
use legend::draw_legend;
use util::{stroke_style, to_pixels, to_rgb};

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register a font for `family` with the `ab_glyph` text path.
///
/// Runs once per process; later calls return the first outcome regardless of
/// their arguments. Returns whether a font is available.
pub fn ensure_fonts_registered(family: &str, font_path: Option<&Path>) -> bool {
    *FONT_REGISTERED.get_or_init(|| {
        let candidates = font_path
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(|p| Path::new(p).to_path_buf()));
        for candidate in candidates {
            let Ok(bytes) = std::fs::read(&candidate) else {
                continue;
            };
            // ab_glyph keeps a 'static reference to the font data.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match plotters::style::register_font(family, FontStyle::Normal, bytes) {
                Ok(()) => {
                    debug!("registered font {} as '{family}'", candidate.display());
                    return true;
                }
                Err(_) => warn!("{} is not a usable font", candidate.display()),
            }
        }
        false
    })
}

/// Render `scene` to `out_path`; `.svg` selects the SVG backend, everything else a bitmap.
pub fn render_to_file<P: AsRef<Path>>(scene: &Scene, out_path: P, font_path: Option<&Path>) -> Result<()> {
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let dims = (scene.width, scene.height);
    if dims.0 == 0 || dims.1 == 0 {
        return Err(anyhow!("cannot render an empty {}x{} canvas", dims.0, dims.1));
    }

    let is_svg = out_path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path_string.as_str(), dims).into_drawing_area();
        draw_scene(&root, scene, true)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    } else {
        let with_text = ensure_fonts_registered(&scene.theme.font_family, font_path);
        if !with_text {
            warn!("no font available for bitmap output; labels are omitted");
        }
        let root = BitMapBackend::new(path_string.as_str(), dims).into_drawing_area();
        draw_scene(&root, scene, with_text)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    debug!("rendered {}x{} scene to {}", dims.0, dims.1, out_path.display());
    Ok(())
}

/// Render `scene` into an in-memory SVG document.
pub fn render_svg_string(scene: &Scene) -> Result<String> {
    if scene.width == 0 || scene.height == 0 {
        return Err(anyhow!("cannot render an empty {}x{} canvas", scene.width, scene.height));
    }
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene, true)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(buf)
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene, with_text: bool) -> Result<()> {
    root.fill(&to_rgb(scene.theme.background))
        .map_err(|e| anyhow!("{:?}", e))?;
    let dx = scene.margin.left as f64;
    let dy = scene.margin.top as f64;
    for node in &scene.nodes {
        draw_node(root, node, dx, dy, &scene.theme, with_text)?;
    }
    Ok(())
}

fn draw_node<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    node: &SceneNode,
    dx: f64,
    dy: f64,
    theme: &Theme,
    with_text: bool,
) -> Result<()> {
    match node {
        SceneNode::Group { children, .. } => {
            for child in children {
                draw_node(area, child, dx, dy, theme, with_text)?;
            }
        }
        SceneNode::Feature(feature) => {
            let fill = to_rgb(feature.fill).filled();
            let stroke = stroke_style(feature.border_color, feature.border_width);
            for ring in &feature.shape.rings {
                let mut pts = to_pixels(ring, dx, dy);
                if pts.len() < 3 {
                    continue;
                }
                area.draw(&Polygon::new(pts.clone(), fill))
                    .map_err(|e| anyhow!("{:?}", e))?;
                if let Some(style) = stroke {
                    let first = pts[0];
                    pts.push(first);
                    area.draw(&PathElement::new(pts, style))
                        .map_err(|e| anyhow!("{:?}", e))?;
                }
            }
        }
        SceneNode::Polyline { points, color, width } => {
            if let Some(style) = stroke_style(*color, *width) {
                area.draw(&PathElement::new(to_pixels(points, dx, dy), style))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
        SceneNode::Polygon { points, fill } => {
            if points.len() >= 3 {
                area.draw(&Polygon::new(to_pixels(points, dx, dy), to_rgb(*fill).filled()))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
        SceneNode::Text {
            text,
            x,
            y,
            color,
            font_px,
        } => {
            if with_text && !text.is_empty() {
                let rgb = to_rgb(*color);
                let style = TextStyle::from((theme.font_family.as_str(), *font_px)).color(&rgb);
                area.draw(&Text::new(
                    text.as_str(),
                    ((x + dx).round() as i32, (y + dy).round() as i32),
                    style,
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
        SceneNode::Legend(layout) => draw_legend(area, layout, dx, dy, theme, with_text)?,
    }
    Ok(())
}
