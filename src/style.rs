//! Optional layout and config passed along with each redraw.
//!
//! Drawing with no style reproduces a bare plot; [`PlotStyle::styled`] is the
//! built-in themed look.

use error_stack::ResultExt;
use serde::{Deserialize, Serialize};

use crate::{Result, VizError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub layout: Layout,
    pub config: PlotConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub l: f64,
    pub r: f64,
    pub b: f64,
    pub t: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspectmode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeroline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zerolinecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showbackground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backgroundcolor: Option<String>,
}

/// Plot-level options (the fourth argument of `newPlot`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    #[serde(rename = "displayModeBar", skip_serializing_if = "Option::is_none")]
    pub display_mode_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displaylogo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsive: Option<bool>,
}

impl Axis {
    fn themed(name: &str) -> Self {
        Self {
            title: Some(Title {
                text: name.to_string(),
            }),
            showgrid: Some(true),
            gridcolor: Some("rgb(68,68,68)".to_string()),
            zeroline: Some(false),
            zerolinecolor: None,
            showbackground: Some(true),
            backgroundcolor: Some("rgb(38,38,38)".to_string()),
        }
    }
}

impl PlotStyle {
    /// Dark theme with edge-to-edge margins, suited to a small embedded frame.
    pub fn styled() -> Self {
        Self {
            layout: Layout {
                title: None,
                paper_bgcolor: Some("rgb(30,30,30)".to_string()),
                plot_bgcolor: Some("rgb(30,30,30)".to_string()),
                font: Some(Font {
                    family: Some("DejaVu Sans Mono, monospace".to_string()),
                    size: Some(11.0),
                    color: Some("rgb(200,200,200)".to_string()),
                }),
                margin: Some(Margin::default()),
                showlegend: Some(false),
                autosize: Some(true),
                hovermode: Some("closest".to_string()),
                scene: Some(Scene {
                    xaxis: Some(Axis::themed("x")),
                    yaxis: Some(Axis::themed("y")),
                    zaxis: Some(Axis::themed("z")),
                    bgcolor: Some("rgb(30,30,30)".to_string()),
                    aspectmode: Some("auto".to_string()),
                }),
            },
            config: PlotConfig {
                display_mode_bar: Some(false),
                displaylogo: Some(false),
                responsive: Some(true),
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .change_context(VizError::Style)
            .attach("failed to parse plot style json")
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.layout.title = Some(Title { text: title.into() });
        self
    }
}
