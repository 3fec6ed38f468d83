//! Named color schemes.
//!
//! Sequential and diverging schemes are the 9-class ColorBrewer palettes; the
//! perceptual ramps (viridis family) are sampled anchor points meant for
//! interpolation. Lookup is case-insensitive.

use crate::error::ChoroplethError;
use crate::style::Color;

/// Scheme used when no `colors` option is given.
pub const DEFAULT_SCHEME: &str = "PuBuGn";

const fn c(hex: u32) -> Color {
    Color::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const BLUES: [Color; 9] = [
    c(0xf7fbff), c(0xdeebf7), c(0xc6dbef), c(0x9ecae1), c(0x6baed6),
    c(0x4292c6), c(0x2171b5), c(0x08519c), c(0x08306b),
];
const GREENS: [Color; 9] = [
    c(0xf7fcf5), c(0xe5f5e0), c(0xc7e9c0), c(0xa1d99b), c(0x74c476),
    c(0x41ab5d), c(0x238b45), c(0x006d2c), c(0x00441b),
];
const GREYS: [Color; 9] = [
    c(0xffffff), c(0xf0f0f0), c(0xd9d9d9), c(0xbdbdbd), c(0x969696),
    c(0x737373), c(0x525252), c(0x252525), c(0x000000),
];
const ORANGES: [Color; 9] = [
    c(0xfff5eb), c(0xfee6ce), c(0xfdd0a2), c(0xfdae6b), c(0xfd8d3c),
    c(0xf16913), c(0xd94801), c(0xa63603), c(0x7f2704),
];
const PURPLES: [Color; 9] = [
    c(0xfcfbfd), c(0xefedf5), c(0xdadaeb), c(0xbcbddc), c(0x9e9ac8),
    c(0x807dba), c(0x6a51a3), c(0x54278f), c(0x3f007d),
];
const REDS: [Color; 9] = [
    c(0xfff5f0), c(0xfee0d2), c(0xfcbba1), c(0xfc9272), c(0xfb6a4a),
    c(0xef3b2c), c(0xcb181d), c(0xa50f15), c(0x67000d),
];
const PUBUGN: [Color; 9] = [
    c(0xfff7fb), c(0xece2f0), c(0xd0d1e6), c(0xa6bddb), c(0x67a9cf),
    c(0x3690c0), c(0x02818a), c(0x016c59), c(0x014636),
];
const YLORRD: [Color; 9] = [
    c(0xffffcc), c(0xffeda0), c(0xfed976), c(0xfeb24c), c(0xfd8d3c),
    c(0xfc4e2a), c(0xe31a1c), c(0xbd0026), c(0x800026),
];
const YLGNBU: [Color; 9] = [
    c(0xffffd9), c(0xedf8b1), c(0xc7e9b4), c(0x7fcdbb), c(0x41b6c4),
    c(0x1d91c0), c(0x225ea8), c(0x253494), c(0x081d58),
];
const RDBU: [Color; 9] = [
    c(0xb2182b), c(0xd6604d), c(0xf4a582), c(0xfddbc7), c(0xf7f7f7),
    c(0xd1e5f0), c(0x92c5de), c(0x4393c3), c(0x2166ac),
];
const RDYLGN: [Color; 9] = [
    c(0xd73027), c(0xf46d43), c(0xfdae61), c(0xfee08b), c(0xffffbf),
    c(0xd9ef8b), c(0xa6d96a), c(0x66bd63), c(0x1a9850),
];
const SPECTRAL: [Color; 9] = [
    c(0xd53e4f), c(0xf46d43), c(0xfdae61), c(0xfee08b), c(0xffffbf),
    c(0xe6f598), c(0xabdda4), c(0x66c2a5), c(0x3288bd),
];

const VIRIDIS: [Color; 10] = [
    c(0x440154), c(0x482878), c(0x3e4989), c(0x31688e), c(0x26828e),
    c(0x1f9e89), c(0x35b779), c(0x6ece58), c(0xb5de2b), c(0xfde725),
];
const MAGMA: [Color; 9] = [
    c(0x000004), c(0x1c1044), c(0x4f127b), c(0x812581), c(0xb5367a),
    c(0xe55064), c(0xfb8761), c(0xfec287), c(0xfcfdbf),
];
const INFERNO: [Color; 10] = [
    c(0x000004), c(0x1b0c41), c(0x4a0c6b), c(0x781c6d), c(0xa52c60),
    c(0xcf4446), c(0xed6925), c(0xfb9b06), c(0xf7d13d), c(0xfcffa4),
];
const PLASMA: [Color; 11] = [
    c(0x0d0887), c(0x41049d), c(0x6a00a8), c(0x8f0da4), c(0xb12a90),
    c(0xcc4778), c(0xe16462), c(0xf2844b), c(0xfca636), c(0xfcce25),
    c(0xf0f921),
];

/// Names accepted by [`scheme_colors`], in their canonical spelling.
pub const SCHEME_NAMES: [&str; 16] = [
    "Blues", "Greens", "Greys", "Oranges", "Purples", "Reds", "PuBuGn", "YlOrRd", "YlGnBu",
    "RdBu", "RdYlGn", "Spectral", "viridis", "magma", "inferno", "plasma",
];

/// Resolve a scheme name to its color stops.
pub fn scheme_colors(name: &str) -> Result<&'static [Color], ChoroplethError> {
    let colors: &'static [Color] = match name.trim().to_ascii_lowercase().as_str() {
        "blues" => &BLUES,
        "greens" => &GREENS,
        "greys" | "grays" => &GREYS,
        "oranges" => &ORANGES,
        "purples" => &PURPLES,
        "reds" => &REDS,
        "pubugn" => &PUBUGN,
        "ylorrd" => &YLORRD,
        "ylgnbu" => &YLGNBU,
        "rdbu" => &RDBU,
        "rdylgn" => &RDYLGN,
        "spectral" => &SPECTRAL,
        "viridis" => &VIRIDIS,
        "magma" => &MAGMA,
        "inferno" => &INFERNO,
        "plasma" => &PLASMA,
        _ => return Err(ChoroplethError::UnknownScheme(name.to_string())),
    };
    Ok(colors)
}
