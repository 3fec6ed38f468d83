//! Value formatting for tooltips, exports and legend labels.
//!
//! Format strings follow a small subset of the d3-format mini language:
//!
//! | spec    | example input | output       |
//! |---------|---------------|--------------|
//! | `""`    | `1234.5`      | `1234.5`     |
//! | `.2f`   | `1234.5`      | `1234.50`    |
//! | `,.0f`  | `1234.6`      | `1,235`      |
//! | `.1%`   | `0.256`       | `25.6%`      |
//! | `.2s`   | `1234567`     | `1.23M`      |
//!
//! Digit grouping honours the configured locale (`30,000` vs `30.000`).

use crate::error::ChoroplethError;
use num_format::Locale;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Caller-supplied formatter.
pub type FormatFn = Arc<dyn Fn(f64) -> String + Send + Sync>;

#[derive(Clone)]
pub enum ValueFormat {
    /// Shortest round-trip representation (`10`, `2.5`).
    Plain,
    /// Fixed number of decimals, optionally with locale digit grouping.
    Fixed { decimals: usize, grouped: bool },
    /// Multiply by 100 and append `%`.
    Percent { decimals: usize },
    /// SI-prefixed (`k`, `M`, `G`, `T`).
    Si { decimals: usize },
    Custom(FormatFn),
}

impl fmt::Debug for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFormat::Plain => f.write_str("Plain"),
            ValueFormat::Fixed { decimals, grouped } => f
                .debug_struct("Fixed")
                .field("decimals", decimals)
                .field("grouped", grouped)
                .finish(),
            ValueFormat::Percent { decimals } => {
                f.debug_struct("Percent").field("decimals", decimals).finish()
            }
            ValueFormat::Si { decimals } => f.debug_struct("Si").field("decimals", decimals).finish(),
            ValueFormat::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::Plain
    }
}

fn format_spec_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<group>,)?(?:\.(?P<prec>\d{1,2}))?(?P<kind>[f%s])?$")
            .expect("static format regex")
    })
}

impl ValueFormat {
    /// Parse a d3-like format spec. An empty string yields [`ValueFormat::Plain`].
    pub fn parse(spec: &str) -> Result<Self, ChoroplethError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(ValueFormat::Plain);
        }
        let caps = format_spec_regex()
            .captures(spec)
            .ok_or_else(|| ChoroplethError::InvalidValueFormat(spec.to_string()))?;
        let grouped = caps.name("group").is_some();
        let prec = caps
            .name("prec")
            .map(|m| m.as_str().parse::<usize>())
            .transpose()
            .map_err(|_| ChoroplethError::InvalidValueFormat(spec.to_string()))?;
        match caps.name("kind").map(|m| m.as_str()) {
            Some("%") if !grouped => Ok(ValueFormat::Percent {
                decimals: prec.unwrap_or(0),
            }),
            Some("s") if !grouped => Ok(ValueFormat::Si {
                decimals: prec.unwrap_or(2),
            }),
            Some("f") | None if grouped || prec.is_some() => Ok(ValueFormat::Fixed {
                decimals: prec.unwrap_or(0),
                grouped,
            }),
            _ => Err(ChoroplethError::InvalidValueFormat(spec.to_string())),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        ValueFormat::Custom(Arc::new(f))
    }

    /// Format with the default (`en`) locale.
    pub fn format(&self, v: f64) -> String {
        self.format_locale(v, "en")
    }

    pub fn format_locale(&self, v: f64, locale_tag: &str) -> String {
        if !v.is_finite() {
            return "NA".to_string();
        }
        match self {
            ValueFormat::Plain => v.to_string(),
            ValueFormat::Fixed { decimals, grouped } => {
                if *grouped {
                    let (locale, dec_sep) = map_locale(locale_tag);
                    grouped_fixed(v, *decimals, locale, dec_sep)
                } else {
                    format!("{:.*}", decimals, v)
                }
            }
            ValueFormat::Percent { decimals } => format!("{:.*}%", decimals, v * 100.0),
            ValueFormat::Si { decimals } => {
                let (scale, suffix) = choose_si_scale(v.abs());
                format!("{:.*}{}", decimals, v / scale, suffix)
            }
            ValueFormat::Custom(f) => f(v),
        }
    }
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Pick an SI scale and suffix based on magnitude, e.g. `(1e6, "M")`.
pub fn choose_si_scale(max_abs: f64) -> (f64, &'static str) {
    if max_abs >= 1.0e12 {
        (1.0e12, "T")
    } else if max_abs >= 1.0e9 {
        (1.0e9, "G")
    } else if max_abs >= 1.0e6 {
        (1.0e6, "M")
    } else if max_abs >= 1.0e3 {
        (1.0e3, "k")
    } else {
        (1.0, "")
    }
}

fn grouped_fixed(v: f64, decimals: usize, locale: &Locale, dec_sep: char) -> String {
    let rounded = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };
    let mut out = String::new();
    if v < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    let separator = locale.separator();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(digit);
    }
    if let Some(frac) = frac_part {
        out.push(dec_sep);
        out.push_str(frac);
    }
    out
}
