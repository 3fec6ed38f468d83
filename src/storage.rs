//! Reading features and datasets from disk, writing bound features back out.
//!
//! - Features: GeoJSON `FeatureCollection`, a bare array of features, or a single feature
//! - Records: CSV with a header row (cells kept as strings, empty cells as `null`)
//!   or a JSON array of objects
//! - Export: bound features as CSV (formula-safe) or pretty JSON

use crate::binder::Binding;
use crate::models::{DataRecord, Feature, value_to_plain_string};
use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Load polygon features from a GeoJSON file.
pub fn load_features<P: AsRef<Path>>(path: P) -> Result<Vec<Feature>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read features from {}", path.display()))?;
    parse_features(&text).with_context(|| format!("in {}", path.display()))
}

/// Parse GeoJSON text. Features whose geometry is not a (multi)polygon are skipped.
pub fn parse_features(text: &str) -> Result<Vec<Feature>> {
    let root: Value = serde_json::from_str(text).context("features are not valid JSON")?;
    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => match obj.remove("features") {
                Some(Value::Array(items)) => items,
                _ => bail!("FeatureCollection without a `features` array"),
            },
            Some("Feature") => vec![Value::Object(obj)],
            other => bail!("expected a FeatureCollection or Feature, found type {other:?}"),
        },
        _ => bail!("expected a GeoJSON object or an array of features"),
    };

    let total = items.len();
    let features: Vec<Feature> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<Feature>(item) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("skipping feature #{i}: {e}");
                None
            }
        })
        .collect();
    debug!("parsed {} of {} features", features.len(), total);
    Ok(features)
}

/// Load records; `.csv` files are read as CSV, anything else as a JSON array.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<DataRecord>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let mut file = File::open(path).with_context(|| format!("open dataset {}", path.display()))?;
    let records = if is_csv {
        read_csv_records(file)
    } else {
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        parse_json_records(&text)
    };
    records.with_context(|| format!("in {}", path.display()))
}

/// Read CSV records; every header becomes a field.
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<DataRecord>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let mut fields = Map::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(name.to_string(), value);
        }
        out.push(DataRecord::from(fields));
    }
    Ok(out)
}

/// Parse a JSON array of objects into records.
pub fn parse_json_records(text: &str) -> Result<Vec<DataRecord>> {
    let root: Value = serde_json::from_str(text).context("dataset is not valid JSON")?;
    let Value::Array(items) = root else {
        return Err(anyhow!("dataset must be a JSON array of objects"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(DataRecord::from(fields)),
            other => Err(anyhow!("record #{i} is not an object: {other}")),
        })
        .collect()
}

/// Prefix cells that a spreadsheet would evaluate as a formula. Negative
/// numbers, as written by the value formats, are left alone.
fn sanitize_cell(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@', '\t', '\r']) && !is_negative_number(s) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

fn is_negative_number(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('-') else {
        return false;
    };
    let body = rest.strip_suffix(['%', 'k', 'M', 'G', 'T']).unwrap_or(rest);
    body.starts_with(|c: char| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '\u{a0}' | '\u{202f}'))
}

/// Save one row per bound feature as CSV with header.
pub fn save_csv<P: AsRef<Path>>(binding: &Binding, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("index", "id", "label", "matched", "value", "formatted_value", "color"))?;
    for bf in &binding.features {
        let id = bf
            .feature
            .id
            .as_ref()
            .map(value_to_plain_string)
            .unwrap_or_default();
        wtr.serialize((
            bf.index,
            sanitize_cell(&id),
            sanitize_cell(&bf.label),
            bf.is_matched(),
            bf.value,
            bf.formatted_value.as_deref().map(sanitize_cell),
            bf.color.to_hex(),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save bound features as a pretty JSON array.
pub fn save_json<P: AsRef<Path>>(binding: &Binding, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&binding.features)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
