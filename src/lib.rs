pub mod columns;
pub mod controller;
pub mod csv_source;
pub mod dispatch;
pub mod extract;
pub mod frame;
pub mod style;
pub mod trace;

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

use std::fmt;

/// Failure kinds reported by the visualizer.
///
/// Used as the context of an [`error_stack::Report`]; details travel as
/// attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizError {
    /// The inbound payload could not be decoded into a frame.
    MalformedPayload,
    /// A frame arrived before the surface was initialized.
    SurfaceNotReady,
    /// The charting library rejected a call.
    Surface,
    /// A style document could not be parsed.
    Style,
    /// CSV input could not be turned into a frame.
    Csv,
}

impl fmt::Display for VizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VizError::MalformedPayload => "malformed payload",
            VizError::SurfaceNotReady => "surface not ready",
            VizError::Surface => "surface call failed",
            VizError::Style => "invalid plot style",
            VizError::Csv => "invalid csv frame",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for VizError {}

pub type Result<T> = std::result::Result<T, error_stack::Report<VizError>>;

pub mod prelude {
    pub use crate::columns::*;
    pub use crate::controller::*;
    pub use crate::dispatch::*;
    pub use crate::extract::*;
    pub use crate::frame::*;
    pub use crate::style::*;
    pub use crate::trace::*;
    pub use crate::{Result, VizError};
}
