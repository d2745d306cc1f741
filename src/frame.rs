//! Inbound frames: the `{ header, data }` payload posted by the host.
//!
//! Decoding is strict. A payload either becomes a [`Frame`] whose rows all
//! match the header width, or it is rejected with a [`DecodeError`] before
//! any channel extraction runs.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The cell value hosts use to mark "no data".
pub const BLANK: &str = " ";

/// Largest integer magnitude an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Bounds outside which numbers print in exponent form.
const EXPONENT_ABOVE: f64 = 1e21;
const EXPONENT_BELOW: f64 = 1e-6;

/// A single table cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn blank() -> Self {
        Cell::Text(BLANK.to_string())
    }

    /// True for the blank sentinel and nothing else. Empty strings are values.
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s == BLANK)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl fmt::Display for Cell {
    /// Formats the way the host formats numbers: integral values carry no
    /// fractional part, and magnitudes at or above `1e21` or below `1e-6`
    /// switch to exponent form (`1e+21`, `1.5e-7`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            Cell::Number(n) => write_number(f, *n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = n.abs();
    if magnitude < EXPONENT_ABOVE && (magnitude >= EXPONENT_BELOW || magnitude == 0.0) {
        return write!(f, "{}", n);
    }
    let exp = format!("{:e}", n);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{}e+{}", mantissa, power),
        _ => f.write_str(&exp),
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Raw::deserialize(deserializer)
            .map(|raw| match raw {
                Raw::Number(n) => Cell::Number(n),
                Raw::Text(s) => Cell::Text(s),
            })
            .map_err(|_| serde::de::Error::custom("cell must be a number or a string"))
    }
}

pub type Row = Vec<Cell>;

/// A decoded table: column names plus rows of cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub header: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
}

impl Frame {
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    /// Decode the JSON text carried in a message's `data` field.
    pub fn decode(text: &str) -> Result<Frame, DecodeError> {
        let frame: Frame =
            serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;
        frame.normalized()
    }

    /// Trim column names and check every row against the header width.
    pub fn normalized(mut self) -> Result<Frame, DecodeError> {
        for name in self.header.iter_mut() {
            let trimmed = name.trim();
            if trimmed.len() != name.len() {
                *name = trimmed.to_string();
            }
        }

        let expected = self.header.len();
        if let Some((row, found)) = self
            .rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(DecodeError::RaggedRow {
                row,
                expected,
                found,
            });
        }

        Ok(self)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The object a host posts: `{ data: "<frame json>" }`.
///
/// Hosts share the message channel with other traffic, so an envelope
/// without a `data` field is not an error, it is simply not addressed to us.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            data: Some(serde_json::Value::String(text.into())),
        }
    }

    /// The frame text, `Ok(None)` when the envelope carries nothing for us.
    pub fn frame_text(&self) -> Result<Option<&str>, DecodeError> {
        match &self.data {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(DecodeError::DataNotText),
        }
    }
}

/// Why a payload was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Not JSON, or JSON of the wrong shape.
    Json(String),
    /// The envelope's `data` field is present but not a string.
    DataNotText,
    /// A row whose width differs from the header.
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(msg) => write!(f, "invalid frame json: {}", msg),
            DecodeError::DataNotText => f.write_str("message `data` field is not a string"),
            DecodeError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} cells, header has {} columns",
                row, found, expected
            ),
        }
    }
}

impl std::error::Error for DecodeError {}
