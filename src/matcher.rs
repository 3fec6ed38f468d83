//! Joining features to data records.
//!
//! A [`MatchRule`] either compares one key path on both sides or delegates to a
//! caller predicate. Whatever the rule, the first record that matches wins, so
//! duplicate keys resolve deterministically to the earliest record.

use crate::models::{DataRecord, Feature};
use ahash::AHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type MatchPredicate = Arc<dyn Fn(&Feature, &DataRecord) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum MatchRule {
    /// Equality of `feature.lookup(path)` and `record.lookup(path)`. Numbers
    /// compare by value and never equal strings.
    Key(String),
    Predicate(MatchPredicate),
}

impl MatchRule {
    pub fn key(path: impl Into<String>) -> Self {
        MatchRule::Key(path.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Feature, &DataRecord) -> bool + Send + Sync + 'static,
    {
        MatchRule::Predicate(Arc::new(f))
    }

    /// Whether `record` belongs to `feature` under this rule.
    pub fn matches(&self, feature: &Feature, record: &DataRecord) -> bool {
        match self {
            MatchRule::Key(path) => {
                match (
                    feature.lookup(path).and_then(canonical_key),
                    record.lookup(path).and_then(canonical_key),
                ) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            MatchRule::Predicate(f) => f(feature, record),
        }
    }
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule::Key("id".to_string())
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Key(path) => f.debug_tuple("Key").field(path).finish(),
            MatchRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// `null` never joins anything.
fn usable_key(v: &Value) -> bool {
    !v.is_null()
}

/// Linear scan: the first record accepted by `rule`, or `None`.
pub fn find_match<'r>(
    rule: &MatchRule,
    feature: &Feature,
    records: &'r [DataRecord],
) -> Option<&'r DataRecord> {
    records.iter().find(|r| rule.matches(feature, r))
}

/// Records indexed by the canonical JSON text of their key.
///
/// Keeps only the first record per key, matching [`find_match`].
#[derive(Debug, Default)]
pub struct KeyIndex {
    path: String,
    by_key: AHashMap<String, usize>,
}

impl KeyIndex {
    pub fn build(path: &str, records: &[DataRecord]) -> Self {
        let mut by_key = AHashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if let Some(key) = record.lookup(path).and_then(canonical_key) {
                by_key.entry(key).or_insert(i);
            }
        }
        Self {
            path: path.to_string(),
            by_key,
        }
    }

    pub fn get(&self, feature: &Feature) -> Option<usize> {
        let key = feature.lookup(&self.path).and_then(canonical_key)?;
        self.by_key.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// JSON text of a key. Integral floats are written as integers, so `1.0`
/// and `1` share a key while `"1"` keeps its own.
fn canonical_key(v: &Value) -> Option<String> {
    if !usable_key(v) {
        return None;
    }
    if let Value::Number(n) = v {
        if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
            if f.fract() == 0.0 && f.abs() < 9.2e18 {
                return Some((f as i64).to_string());
            }
        }
    }
    serde_json::to_string(v).ok()
}

/// Resolves features against one record set, indexing keys when the rule allows it.
pub struct Matcher<'r> {
    rule: &'r MatchRule,
    records: &'r [DataRecord],
    index: Option<KeyIndex>,
}

impl<'r> Matcher<'r> {
    pub fn new(rule: &'r MatchRule, records: &'r [DataRecord]) -> Self {
        let index = match rule {
            MatchRule::Key(path) => Some(KeyIndex::build(path, records)),
            MatchRule::Predicate(_) => None,
        };
        Self {
            rule,
            records,
            index,
        }
    }

    pub fn find(&self, feature: &Feature) -> Option<&'r DataRecord> {
        match &self.index {
            Some(index) => index.get(feature).map(|i| &self.records[i]),
            None => find_match(self.rule, feature, self.records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;
    use serde_json::json;

    fn feature(id: Value) -> Feature {
        Feature {
            id: Some(id),
            properties: Default::default(),
            geometry: Geometry::Polygon(vec![]),
        }
    }

    fn record(id: Value, value: f64) -> DataRecord {
        DataRecord::new().with("id", id).with("value", value)
    }

    #[test]
    fn key_rule_is_strict() {
        let rule = MatchRule::default();
        let records = vec![record(json!("1"), 5.0), record(json!(1), 6.0)];
        let hit = find_match(&rule, &feature(json!(1)), &records).unwrap();
        assert_eq!(hit.lookup("value"), Some(&json!(6.0)));
    }

    #[test]
    fn integral_floats_equal_integers() {
        let rule = MatchRule::default();
        let records = vec![record(json!("1"), 5.0), record(json!(1.0), 6.0)];
        let f = feature(json!(1));
        let scanned = find_match(&rule, &f, &records).unwrap();
        let indexed = Matcher::new(&rule, &records).find(&f).unwrap();
        assert_eq!(scanned, indexed);
        assert_eq!(indexed.lookup("value"), Some(&json!(6.0)));
        assert!(find_match(&rule, &feature(json!(1.5)), &records).is_none());
    }

    #[test]
    fn first_duplicate_wins_for_scan_and_index() {
        let rule = MatchRule::default();
        let records = vec![
            record(json!("A"), 1.0),
            record(json!("A"), 2.0),
            record(json!("B"), 3.0),
        ];
        let f = feature(json!("A"));
        let scanned = find_match(&rule, &f, &records).unwrap();
        let indexed = Matcher::new(&rule, &records).find(&f).unwrap();
        assert_eq!(scanned, indexed);
        assert_eq!(indexed.lookup("value"), Some(&json!(1.0)));
    }

    #[test]
    fn null_keys_never_match() {
        let rule = MatchRule::default();
        let records = vec![record(Value::Null, 1.0)];
        assert!(find_match(&rule, &feature(Value::Null), &records).is_none());
        assert!(Matcher::new(&rule, &records).find(&feature(Value::Null)).is_none());
        assert!(KeyIndex::build("id", &records).is_empty());
    }

    #[test]
    fn predicate_rule_scans_in_order() {
        let rule = MatchRule::predicate(|f, r| {
            let fid = f.lookup("id").and_then(Value::as_str).unwrap_or_default();
            let rid = r.lookup("id").and_then(Value::as_str).unwrap_or_default();
            fid.eq_ignore_ascii_case(rid)
        });
        let records = vec![record(json!("deu"), 1.0), record(json!("DEU"), 2.0)];
        let hit = Matcher::new(&rule, &records).find(&feature(json!("DEU"))).unwrap();
        assert_eq!(hit.lookup("value"), Some(&json!(1.0)));
    }
}
