//! Binding features to records: match, extract, format, color.
//!
//! One call to [`Binder::bind`] is one binding pass. It is a pure function of
//! the features, the records and the binder configuration; nothing is cached
//! between passes.

use crate::error::ChoroplethError;
use crate::format::ValueFormat;
use crate::matcher::{MatchRule, Matcher};
use crate::models::{DataRecord, Feature, value_to_plain_string};
use crate::scale::{ColorConfig, ColorScale, ColorScaleBuilder, DomainSpec, LegendEntry};
use crate::style::Color;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Color used for features without data unless configured otherwise.
pub const DEFAULT_UNKNOWN_COLOR: Color = Color::rgb(0x99, 0x99, 0x99);

pub type ValueFn = Arc<dyn Fn(&DataRecord) -> Option<f64> + Send + Sync>;
pub type LabelFn = Arc<dyn Fn(&Feature) -> String + Send + Sync>;

/// How to read the numeric value out of a matched record.
#[derive(Clone)]
pub enum ValueAccessor {
    /// Key path; JSON numbers and numeric strings are accepted.
    Field(String),
    /// `None` means the record has no usable value.
    Func(ValueFn),
}

impl ValueAccessor {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&DataRecord) -> Option<f64> + Send + Sync + 'static,
    {
        ValueAccessor::Func(Arc::new(f))
    }

    pub fn extract(&self, record: &DataRecord) -> Option<f64> {
        let v = match self {
            ValueAccessor::Field(path) => record.lookup(path).and_then(numeric)?,
            ValueAccessor::Func(f) => f(record)?,
        };
        v.is_finite().then_some(v)
    }
}

impl Default for ValueAccessor {
    fn default() -> Self {
        ValueAccessor::Field("value".to_string())
    }
}

impl fmt::Debug for ValueAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueAccessor::Field(p) => f.debug_tuple("Field").field(p).finish(),
            ValueAccessor::Func(_) => f.write_str("Func(..)"),
        }
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// How to name a feature in tooltips and exports.
#[derive(Clone)]
pub enum LabelAccessor {
    /// Key path on the feature; falls back to the feature id.
    Field(String),
    Func(LabelFn),
}

impl LabelAccessor {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Feature) -> String + Send + Sync + 'static,
    {
        LabelAccessor::Func(Arc::new(f))
    }

    pub fn label(&self, feature: &Feature) -> String {
        match self {
            LabelAccessor::Field(path) => feature
                .lookup(path)
                .map(value_to_plain_string)
                .unwrap_or_else(|| feature.id_string()),
            LabelAccessor::Func(f) => f(feature),
        }
    }
}

impl Default for LabelAccessor {
    fn default() -> Self {
        LabelAccessor::Field("id".to_string())
    }
}

impl fmt::Debug for LabelAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelAccessor::Field(p) => f.debug_tuple("Field").field(p).finish(),
            LabelAccessor::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A feature together with everything the binding pass derived for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundFeature {
    /// Position in the input feature list.
    pub index: usize,
    pub feature: Feature,
    pub label: String,
    pub data: Option<DataRecord>,
    pub value: Option<f64>,
    pub formatted_value: Option<String>,
    pub color: Color,
}

impl BoundFeature {
    pub fn is_matched(&self) -> bool {
        self.value.is_some()
    }
}

/// Output of one binding pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub features: Vec<BoundFeature>,
    pub scale: ColorScale,
    pub legend: Vec<LegendEntry>,
    pub unknown_color: Color,
}

impl Binding {
    /// Scale color for matched features, the unknown color otherwise.
    pub fn color_of(&self, feature: &BoundFeature) -> Color {
        match feature.value {
            Some(v) => self.scale.color_of(v),
            None => self.unknown_color,
        }
    }

    pub fn matched(&self) -> impl Iterator<Item = &BoundFeature> {
        self.features.iter().filter(|f| f.is_matched())
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &BoundFeature> {
        self.features.iter().filter(|f| !f.is_matched())
    }

    pub fn matched_values(&self) -> Vec<f64> {
        self.features.iter().filter_map(|f| f.value).collect()
    }
}

/// Binding configuration: match rule, accessors, formatter and color settings.
#[derive(Debug, Clone)]
pub struct Binder {
    pub match_rule: MatchRule,
    pub value: ValueAccessor,
    pub label: LabelAccessor,
    pub format: ValueFormat,
    pub colors: ColorConfig,
    pub domain: DomainSpec,
    pub unknown_color: Color,
    pub locale: String,
    /// Samples shown by the legend of a continuous scale.
    pub legend_steps: usize,
}

impl Default for Binder {
    fn default() -> Self {
        Self {
            match_rule: MatchRule::default(),
            value: ValueAccessor::default(),
            label: LabelAccessor::default(),
            format: ValueFormat::default(),
            colors: ColorConfig::default(),
            domain: DomainSpec::default(),
            unknown_color: DEFAULT_UNKNOWN_COLOR,
            locale: "en".to_string(),
            legend_steps: 5,
        }
    }
}

impl Binder {
    /// Join `features` to `records` and color every feature.
    ///
    /// Output order equals `features` order. A feature without a record, or
    /// whose record has no usable value, gets `unknown_color` and no value.
    /// Invalid domain or color configuration fails before anything is bound.
    pub fn bind(
        &self,
        features: &[Feature],
        records: &[DataRecord],
    ) -> Result<Binding, ChoroplethError> {
        self.domain.validate()?;
        self.colors.scheme.resolve()?;

        let matcher = Matcher::new(&self.match_rule, records);
        let resolved: Vec<Option<(&DataRecord, f64)>> = features
            .iter()
            .map(|feature| {
                let record = matcher.find(feature)?;
                match self.value.extract(record) {
                    Some(v) => Some((record, v)),
                    None => {
                        warn!(
                            "feature {}: matched record has no numeric value, rendering as unknown",
                            feature.id_string()
                        );
                        None
                    }
                }
            })
            .collect();

        let values: Vec<f64> = resolved.iter().flatten().map(|(_, v)| *v).collect();
        let scale = ColorScaleBuilder::build(&values, &self.domain, &self.colors)?;

        let bound: Vec<BoundFeature> = features
            .iter()
            .zip(resolved)
            .enumerate()
            .map(|(index, (feature, hit))| {
                let (data, value, formatted_value, color) = match hit {
                    Some((record, v)) => (
                        Some(record.clone()),
                        Some(v),
                        Some(self.format.format_locale(v, &self.locale)),
                        scale.color_of(v),
                    ),
                    None => (None, None, None, self.unknown_color),
                };
                BoundFeature {
                    index,
                    feature: feature.clone(),
                    label: self.label.label(feature),
                    data,
                    value,
                    formatted_value,
                    color,
                }
            })
            .collect();

        let legend = scale.legend_stops(&self.format, &self.locale, self.legend_steps);
        debug!(
            "bound {} features ({} matched) against {} records, domain [{}, {}]",
            bound.len(),
            values.len(),
            records.len(),
            scale.domain().min,
            scale.domain().max
        );

        Ok(Binding {
            features: bound,
            scale,
            legend,
            unknown_color: self.unknown_color,
        })
    }
}
