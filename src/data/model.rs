use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Label used for a missing subclass and for unresolved identifiers.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// CellValue – a single parsed field
// ---------------------------------------------------------------------------

/// A dynamically-typed CSV field. Numbers are inferred at parse time so the
/// GWAS builder can filter on them without re-parsing text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infer the type of a raw field.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Null;
        }
        let trimmed = raw.trim();
        if looks_numeric(trimmed) {
            if let Ok(i) = trimmed.parse::<i64>() {
                return CellValue::Integer(i);
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                return CellValue::Float(f);
            }
        }
        match trimmed {
            "true" | "TRUE" => CellValue::Bool(true),
            "false" | "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Numeric view of the value; booleans and text are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Guards `str::parse::<f64>` from accepting `inf`, `NaN` and friends.
fn looks_numeric(s: &str) -> bool {
    let digits = s.trim_start_matches(['-', '+']);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row – one data line, addressed by header name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Row {
    /// 1-based line number in the source file.
    pub line: u64,
    pub fields: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Field rendered as text; `None` when absent or empty.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            CellValue::Null => None,
            value => Some(value.to_string()),
        }
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_f64)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaboliteRecord {
    pub id: String,
    pub name: String,
    pub subclass: String,
}

impl MetaboliteRecord {
    /// Stand-in for an identifier the info file never mentions.
    pub fn unknown(id: &str) -> Self {
        MetaboliteRecord {
            id: id.to_string(),
            name: UNKNOWN.to_string(),
            subclass: UNKNOWN.to_string(),
        }
    }
}

/// Identifier → display metadata. Read-only once built.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MetaboliteRegistry {
    records: BTreeMap<String, MetaboliteRecord>,
}

impl MetaboliteRegistry {
    /// Insert or overwrite; the last record for an identifier wins.
    pub(crate) fn insert(&mut self, record: MetaboliteRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<&MetaboliteRecord> {
        self.records.get(id)
    }

    /// Total lookup: unresolved identifiers get the `Unknown` fallback.
    pub fn resolve(&self, id: &str) -> MetaboliteRecord {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| MetaboliteRecord::unknown(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Correlation network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub subclass: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEdge {
    pub source: String,
    pub target: String,
}

/// Nodes are unique by id and listed in first-appearance order; edges are
/// kept verbatim, duplicates and self-loops included.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<CorrelationEdge>,
}

impl NetworkGraph {
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// ---------------------------------------------------------------------------
// GWAS series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationPoint {
    pub id: String,
    pub name: String,
    pub subclass: String,
    pub snp: String,
    pub position: f64,
    pub lod: f64,
}

pub type AssociationSeries = Vec<AssociationPoint>;

// ---------------------------------------------------------------------------
// Pipeline output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessedResult {
    pub registry: MetaboliteRegistry,
    pub graph: NetworkGraph,
    pub series: AssociationSeries,
}

/// Payload of a "metabolite selected" event. The GWAS detail fields are only
/// filled when the selection comes from the Manhattan plot.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaboliteDetail {
    pub id: String,
    pub name: String,
    pub subclass: Option<String>,
    pub snp: Option<String>,
    pub position: Option<f64>,
    pub lod: Option<f64>,
}

impl From<&AssociationPoint> for MetaboliteDetail {
    fn from(p: &AssociationPoint) -> Self {
        MetaboliteDetail {
            id: p.id.clone(),
            name: p.name.clone(),
            subclass: Some(p.subclass.clone()),
            snp: Some(p.snp.clone()),
            position: Some(p.position),
            lod: Some(p.lod),
        }
    }
}

impl From<&NetworkNode> for MetaboliteDetail {
    fn from(n: &NetworkNode) -> Self {
        MetaboliteDetail {
            id: n.id.clone(),
            name: n.name.clone(),
            subclass: Some(n.subclass.clone()),
            snp: None,
            position: None,
            lod: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_numbers_and_text() {
        assert_eq!(CellValue::infer("5000"), CellValue::Integer(5000));
        assert_eq!(CellValue::infer("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::infer("-1e3"), CellValue::Float(-1000.0));
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("true"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("rs100"), CellValue::Text("rs100".into()));
        // f64::from_str accepts these, CSV numbers should not
        assert_eq!(CellValue::infer("NaN"), CellValue::Text("NaN".into()));
        assert_eq!(CellValue::infer("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_numeric_ids_read_back_as_text() {
        let mut fields = BTreeMap::new();
        fields.insert("metabolite_id".to_string(), CellValue::infer("007"));
        fields.insert("name".to_string(), CellValue::infer("1.50"));
        fields.insert("subclass".to_string(), CellValue::infer(""));
        let row = Row { line: 2, fields };

        assert_eq!(row.text("metabolite_id").as_deref(), Some("7"));
        assert_eq!(row.text("name").as_deref(), Some("1.5"));
        assert_eq!(row.text("subclass"), None);
        assert_eq!(row.text("missing"), None);
        assert_eq!(row.number("metabolite_id"), Some(7.0));
    }

    #[test]
    fn test_registry_resolve_is_total() {
        let registry = MetaboliteRegistry::default();
        let rec = registry.resolve("M9");
        assert_eq!(rec.id, "M9");
        assert_eq!(rec.name, UNKNOWN);
        assert_eq!(rec.subclass, UNKNOWN);
        assert_eq!(registry.resolve("M9"), rec);
    }
}
