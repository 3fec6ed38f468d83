//! Value → color scales and the legend entries that describe them.

use crate::error::ChoroplethError;
use crate::format::ValueFormat;
use crate::schemes::{DEFAULT_SCHEME, scheme_colors};
use crate::style::Color;
use serde::{Deserialize, Serialize};

/// Closed numeric range a scale is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// True when the domain holds a single value.
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }

    /// Position of `v` inside the domain, in `[0, 1]` after clamping.
    pub fn fraction(&self, v: f64) -> f64 {
        let v = self.clamp(v);
        let span = self.span();
        if span.is_finite() {
            (v - self.min) / span
        } else {
            // bounds near f64::MAX overflow the difference; halves do not
            (v / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        }
    }

    /// Value at `num / den` of the way from `min` to `max`.
    pub fn point(&self, num: f64, den: f64) -> f64 {
        let span = self.span();
        if span.is_finite() {
            self.min + span * num / den
        } else {
            let f = num / den;
            self.min * (1.0 - f) + self.max * f
        }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        if v.is_nan() {
            self.min
        } else {
            v.clamp(self.min, self.max)
        }
    }
}

/// `"auto"` or an explicit `[min, max]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "DomainRepr", into = "DomainRepr")]
pub enum DomainSpec {
    #[default]
    Auto,
    Explicit { min: f64, max: f64 },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DomainRepr {
    Keyword(String),
    Pair([f64; 2]),
}

impl TryFrom<DomainRepr> for DomainSpec {
    type Error = String;

    fn try_from(r: DomainRepr) -> Result<Self, Self::Error> {
        match r {
            DomainRepr::Keyword(k) if k.eq_ignore_ascii_case("auto") => Ok(DomainSpec::Auto),
            DomainRepr::Keyword(k) => Err(format!("expected \"auto\" or [min, max], got \"{k}\"")),
            DomainRepr::Pair([min, max]) => Ok(DomainSpec::Explicit { min, max }),
        }
    }
}

impl From<DomainSpec> for DomainRepr {
    fn from(d: DomainSpec) -> Self {
        match d {
            DomainSpec::Auto => DomainRepr::Keyword("auto".to_string()),
            DomainSpec::Explicit { min, max } => DomainRepr::Pair([min, max]),
        }
    }
}

impl DomainSpec {
    /// Validate an explicit domain. `Auto` always passes.
    pub fn validate(&self) -> Result<(), ChoroplethError> {
        if let DomainSpec::Explicit { min, max } = *self {
            let invalid = |reason: &str| ChoroplethError::InvalidDomain {
                min,
                max,
                reason: reason.to_string(),
            };
            if !min.is_finite() || !max.is_finite() {
                return Err(invalid("bounds must be finite"));
            }
            if min > max {
                return Err(invalid("min is greater than max"));
            }
        }
        Ok(())
    }
}

/// How values between the domain bounds pick a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Equal-width classes, one per color.
    #[default]
    Quantize,
    /// Linear interpolation between neighbouring colors.
    Continuous,
}

/// A named scheme or an explicit list of colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorScheme {
    Named(String),
    Palette(Vec<Color>),
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme::Named(DEFAULT_SCHEME.to_string())
    }
}

impl ColorScheme {
    pub fn resolve(&self) -> Result<Vec<Color>, ChoroplethError> {
        match self {
            ColorScheme::Named(name) => Ok(scheme_colors(name)?.to_vec()),
            ColorScheme::Palette(colors) if colors.is_empty() => Err(ChoroplethError::EmptyPalette),
            ColorScheme::Palette(colors) => Ok(colors.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    pub scheme: ColorScheme,
    pub mode: ScaleMode,
}

/// One legend row describing part of a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub id: String,
    pub value: f64,
    pub extent: (f64, f64),
    pub color: Color,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    domain: Domain,
    mode: ScaleMode,
    colors: Vec<Color>,
}

impl ColorScale {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color for `v`, clamped to the domain. Total over every `f64`.
    pub fn color_of(&self, v: f64) -> Color {
        let n = self.colors.len();
        if n == 1 || self.domain.is_degenerate() {
            return self.colors[0];
        }
        let t = self.domain.fraction(v);
        match self.mode {
            ScaleMode::Quantize => {
                let idx = ((t * n as f64).floor() as usize).min(n - 1);
                self.colors[idx]
            }
            ScaleMode::Continuous => {
                let pos = t * (n - 1) as f64;
                let i = (pos.floor() as usize).min(n - 2);
                self.colors[i].lerp(self.colors[i + 1], pos - i as f64)
            }
        }
    }

    /// Bounds of the class painted with color `i` (quantize scales).
    pub fn class_extent(&self, i: usize) -> (f64, f64) {
        let n = self.colors.len() as f64;
        (
            self.domain.point(i as f64, n),
            self.domain.point((i + 1) as f64, n),
        )
    }

    /// Legend rows for this scale.
    ///
    /// Quantize scales yield one row per class labelled `lo - hi`; continuous
    /// scales yield `steps` evenly spaced samples (at least two). A scale
    /// that paints everything with one color yields a single row.
    pub fn legend_stops(&self, format: &ValueFormat, locale: &str, steps: usize) -> Vec<LegendEntry> {
        if self.colors.len() == 1 || self.domain.is_degenerate() {
            let Domain { min, max } = self.domain;
            let color = self.colors[0];
            let label = if self.domain.is_degenerate() {
                format.format_locale(min, locale)
            } else {
                format!(
                    "{} - {}",
                    format.format_locale(min, locale),
                    format.format_locale(max, locale)
                )
            };
            return vec![LegendEntry {
                id: color.to_hex(),
                value: min,
                extent: (min, max),
                color,
                label,
            }];
        }
        match self.mode {
            ScaleMode::Quantize => self
                .colors
                .iter()
                .enumerate()
                .map(|(i, color)| {
                    let (lo, hi) = self.class_extent(i);
                    LegendEntry {
                        id: color.to_hex(),
                        value: lo,
                        extent: (lo, hi),
                        color: *color,
                        label: format!(
                            "{} - {}",
                            format.format_locale(lo, locale),
                            format.format_locale(hi, locale)
                        ),
                    }
                })
                .collect(),
            ScaleMode::Continuous => {
                let steps = steps.max(2);
                (0..steps)
                    .map(|k| {
                        let v = self.domain.point(k as f64, (steps - 1) as f64);
                        let color = self.color_of(v);
                        LegendEntry {
                            id: format!("stop-{k}"),
                            value: v,
                            extent: (v, v),
                            color,
                            label: format.format_locale(v, locale),
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Min/max of the finite values; `[0, 0]` when there are none.
pub fn auto_domain(values: &[f64]) -> Domain {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        Domain { min: 0.0, max: 0.0 }
    } else {
        Domain { min, max }
    }
}

pub struct ColorScaleBuilder;

impl ColorScaleBuilder {
    /// Build a scale from the matched values and the domain/color configuration.
    ///
    /// Fails on an invalid explicit domain or an unusable color scheme; never
    /// fails because of the values themselves.
    pub fn build(
        matched_values: &[f64],
        domain: &DomainSpec,
        colors: &ColorConfig,
    ) -> Result<ColorScale, ChoroplethError> {
        domain.validate()?;
        let stops = colors.scheme.resolve()?;
        let domain = match *domain {
            DomainSpec::Auto => auto_domain(matched_values),
            DomainSpec::Explicit { min, max } => Domain { min, max },
        };
        Ok(ColorScale {
            domain,
            mode: colors.mode,
            colors: stops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(mode: ScaleMode) -> ColorConfig {
        ColorConfig {
            scheme: ColorScheme::Palette(vec![
                Color::rgb(0, 0, 0),
                Color::rgb(100, 100, 100),
                Color::rgb(200, 200, 200),
            ]),
            mode,
        }
    }

    #[test]
    fn auto_domain_ignores_non_finite() {
        let d = auto_domain(&[3.0, f64::NAN, -2.0, f64::INFINITY]);
        assert_eq!(d, Domain { min: -2.0, max: 3.0 });
        assert_eq!(auto_domain(&[]), Domain { min: 0.0, max: 0.0 });
    }

    #[test]
    fn quantize_classes_are_equal_width() {
        let scale = ColorScaleBuilder::build(
            &[],
            &DomainSpec::Explicit { min: 0.0, max: 30.0 },
            &palette(ScaleMode::Quantize),
        )
        .unwrap();
        assert_eq!(scale.color_of(0.0), Color::rgb(0, 0, 0));
        assert_eq!(scale.color_of(9.9), Color::rgb(0, 0, 0));
        assert_eq!(scale.color_of(15.0), Color::rgb(100, 100, 100));
        assert_eq!(scale.color_of(30.0), Color::rgb(200, 200, 200));
        assert_eq!(scale.class_extent(1), (10.0, 20.0));
    }

    #[test]
    fn continuous_interpolates_between_stops() {
        let scale = ColorScaleBuilder::build(
            &[0.0, 100.0],
            &DomainSpec::Auto,
            &palette(ScaleMode::Continuous),
        )
        .unwrap();
        assert_eq!(scale.color_of(25.0), Color::rgb(50, 50, 50));
        assert_eq!(scale.color_of(100.0), Color::rgb(200, 200, 200));
    }

    #[test]
    fn out_of_domain_values_clamp() {
        let scale = ColorScaleBuilder::build(&[10.0, 20.0], &DomainSpec::Auto, &palette(ScaleMode::Quantize))
            .unwrap();
        assert_eq!(scale.color_of(-1e9), scale.color_of(10.0));
        assert_eq!(scale.color_of(1e9), scale.color_of(20.0));
        assert_eq!(scale.color_of(f64::NAN), scale.color_of(10.0));
    }

    #[test]
    fn huge_domain_keeps_its_end_colors() {
        let scale = ColorScaleBuilder::build(
            &[],
            &DomainSpec::Explicit { min: -1e308, max: 1e308 },
            &palette(ScaleMode::Quantize),
        )
        .unwrap();
        assert_eq!(scale.color_of(1e308), Color::rgb(200, 200, 200));
        assert_eq!(scale.color_of(f64::INFINITY), Color::rgb(200, 200, 200));
        assert_eq!(scale.color_of(-1e308), Color::rgb(0, 0, 0));
        assert_eq!(scale.color_of(0.0), Color::rgb(100, 100, 100));
        let (lo, hi) = scale.class_extent(2);
        assert!(lo.is_finite());
        assert_eq!(hi, 1e308);
    }

    #[test]
    fn degenerate_domain_has_a_single_legend_row() {
        for mode in [ScaleMode::Quantize, ScaleMode::Continuous] {
            let scale =
                ColorScaleBuilder::build(&[], &DomainSpec::Explicit { min: 5.0, max: 5.0 }, &palette(mode))
                    .unwrap();
            let legend = scale.legend_stops(&ValueFormat::Plain, "en", 5);
            assert_eq!(legend.len(), 1);
            assert_eq!(legend[0].color, scale.color_of(5.0));
            assert_eq!(legend[0].extent, (5.0, 5.0));
        }
    }

    #[test]
    fn domain_spec_serde() {
        let auto: DomainSpec = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, DomainSpec::Auto);
        let explicit: DomainSpec = serde_json::from_str("[0, 100]").unwrap();
        assert_eq!(explicit, DomainSpec::Explicit { min: 0.0, max: 100.0 });
        assert!(serde_json::from_str::<DomainSpec>("\"sometimes\"").is_err());
    }

    #[test]
    fn empty_palette_is_rejected() {
        let cfg = ColorConfig {
            scheme: ColorScheme::Palette(vec![]),
            mode: ScaleMode::Quantize,
        };
        assert_eq!(
            ColorScaleBuilder::build(&[1.0], &DomainSpec::Auto, &cfg).unwrap_err(),
            ChoroplethError::EmptyPalette
        );
    }
}
