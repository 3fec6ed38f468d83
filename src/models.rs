use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A linear ring of `[longitude, latitude]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Polygon geometry as found in GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Exterior ring followed by holes.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Iterate over every ring (exterior and holes) of every polygon.
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten()),
        }
    }
}

/// One geographic region to be colored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "map_or_null")]
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

/// GeoJSON allows `"properties": null`.
fn map_or_null<'de, D: Deserializer<'de>>(d: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(d)?.unwrap_or_default())
}

impl Feature {
    pub fn new(id: impl Into<Value>, geometry: Geometry) -> Self {
        Self {
            id: Some(id.into()),
            properties: Map::new(),
            geometry,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Resolve a dotted attribute path.
    ///
    /// `id` is the top-level feature id, `properties.x` and plain `x` both read
    /// from the properties object.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let root = match first {
            "id" => self.id.as_ref()?,
            "properties" => match segments.next() {
                Some(key) => self.properties.get(key)?,
                None => return None,
            },
            key => self.properties.get(key)?,
        };
        descend(root, segments)
    }

    /// Display form of the id, used in logs and error messages.
    pub fn id_string(&self) -> String {
        match &self.id {
            Some(v) => value_to_plain_string(v),
            None => "<no id>".to_string(),
        }
    }
}

/// One data point joined to a feature by key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRecord {
    pub fields: Map<String, Value>,
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Resolve a dotted attribute path inside the record.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.fields.get(segments.next()?)?;
        descend(first, segments)
    }
}

impl From<Map<String, Value>> for DataRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn descend<'a, 'p>(
    mut cur: &'a Value,
    segments: impl Iterator<Item = &'p str>,
) -> Option<&'a Value> {
    for seg in segments {
        cur = match cur {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Render a JSON scalar without quotes (`"DEU"` -> `DEU`).
pub fn value_to_plain_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
