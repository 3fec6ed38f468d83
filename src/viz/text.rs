//! Text measurement and truncation for legend labels.
//!
//! Plotters has no text measuring on the SVG path, so widths are estimated
//! from the character count.

const AVG_GLYPH_WIDTH: f64 = 0.60;
const ELLIPSIS: char = '…';

/// Heuristic pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: f64) -> f64 {
    (text.chars().count() as f64 * font_px * AVG_GLYPH_WIDTH).ceil()
}

/// Shorten `text` to fit `max_px`, ending with a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: f64, max_px: f64) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        out.push(ELLIPSIS);
        let fits = estimate_text_width_px(&out, font_px) <= max_px;
        out.pop();
        if !fits {
            out.pop();
            break;
        }
    }
    if out.is_empty() {
        return String::new();
    }
    out.push(ELLIPSIS);
    out
}
