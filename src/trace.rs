//! Trace assembly: one frame in, one point-cloud trace out.

use serde::{Deserialize, Serialize};

use crate::columns::ColumnMap;
use crate::extract::{self, DEFAULT_COLOR, Rgba};
use crate::frame::{Cell, Frame};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    #[default]
    Scatter3d,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Markers,
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

/// Fixed trace attributes that do not come from the frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    pub kind: TraceKind,
    pub mode: Mode,
    pub name: String,
    pub default_color: Rgba,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            kind: TraceKind::default(),
            mode: Mode::default(),
            name: "scatter1".to_string(),
            default_color: DEFAULT_COLOR,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: Vec<String>,
    pub size: Vec<Cell>,
}

/// The object handed to the charting library.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    pub x: Vec<Cell>,
    pub y: Vec<Cell>,
    pub z: Vec<Cell>,
    pub text: Vec<Option<Cell>>,
    pub marker: Marker,
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub mode: Mode,
    pub name: String,
}

/// What the assembly noticed about the frame. Nothing here is an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildNotes {
    pub columns: ColumnMap,
    pub unrecognized: Vec<String>,
    pub rows_with_blank_color: usize,
}

impl ScatterTrace {
    pub fn build(frame: &Frame, options: &TraceOptions) -> (ScatterTrace, BuildNotes) {
        let columns = ColumnMap::resolve(&frame.header);
        let rows = &frame.rows;
        let color = extract::colors(rows, columns.color(), options.default_color);

        let trace = ScatterTrace {
            x: extract::positions(rows, columns.x),
            y: extract::positions(rows, columns.y),
            z: extract::positions(rows, columns.z),
            text: extract::labels(rows, columns.labels),
            marker: Marker {
                color: color.values,
                size: extract::sizes(rows, columns.size),
            },
            kind: options.kind,
            mode: options.mode,
            name: options.name.clone(),
        };

        let notes = BuildNotes {
            columns,
            unrecognized: ColumnMap::unrecognized(&frame.header)
                .into_iter()
                .map(str::to_string)
                .collect(),
            rows_with_blank_color: color.rows_with_blank,
        };

        (trace, notes)
    }

    pub fn from_frame(frame: &Frame) -> ScatterTrace {
        Self::build(frame, &TraceOptions::default()).0
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
