//! Host configuration

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use scatter_embed::style::PlotStyle;
use scatter_embed::trace::{TraceKind, TraceOptions};

/// Upper bound for the duration flags: one hundred years.
const MAX_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Development host for the embedded scatter visualizer
#[derive(Parser, Clone, Debug)]
#[command(name = "scatter-host")]
#[command(about = "Serves the scatter visualizer in a frame and relays tabular frames to it")]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// Path to static files directory
    #[arg(long, default_value = "scatter-host/static")]
    pub static_dir: String,

    /// Path to the wasm-bindgen output for scatter-embed
    #[arg(long, default_value = "pkg")]
    pub pkg_dir: String,

    /// Element id the visualizer draws into
    #[arg(long, default_value = "plotly_div")]
    pub surface_id: String,

    /// Layout/config JSON file applied to every redraw
    #[arg(long, conflicts_with = "styled")]
    pub style: Option<PathBuf>,

    /// Use the built-in dark theme
    #[arg(long)]
    pub styled: bool,

    /// Draw a flat `scatter` trace instead of `scatter3d`
    #[arg(long)]
    pub flat: bool,

    /// Seconds an idle stream without viewers is kept
    #[arg(
        long,
        default_value = "3600",
        value_parser = clap::value_parser!(u64).range(1..=MAX_SECONDS)
    )]
    pub stream_ttl: u64,

    /// Cleanup interval in seconds
    #[arg(
        long,
        default_value = "300",
        value_parser = clap::value_parser!(u64).range(1..=MAX_SECONDS)
    )]
    pub cleanup_interval: u64,

    /// Largest accepted frame body in bytes
    #[arg(long, default_value = "8388608")]
    pub max_body_bytes: usize,
}

impl Config {
    /// Resolve the plot style from `--style` / `--styled`.
    pub fn load_style(&self) -> anyhow::Result<Option<PlotStyle>> {
        if self.styled {
            return Ok(Some(PlotStyle::styled()));
        }
        let Some(path) = &self.style else {
            return Ok(None);
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading style file {}", path.display()))?;
        let style = PlotStyle::from_json(&json)
            .map_err(|report| anyhow::anyhow!("{:?}", report))
            .with_context(|| format!("parsing style file {}", path.display()))?;
        Ok(Some(style))
    }

    /// Idle time after which an unwatched stream is dropped
    pub fn stream_ttl(&self) -> chrono::Duration {
        i64::try_from(self.stream_ttl)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            kind: if self.flat {
                TraceKind::Scatter
            } else {
                TraceKind::Scatter3d
            },
            ..TraceOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = Config::parse_from(["scatter-host"]);
        assert_eq!(config.port, 8090);
        assert_eq!(config.surface_id, "plotly_div");
        assert!(config.load_style().unwrap().is_none());
        assert_eq!(config.trace_options().kind, TraceKind::Scatter3d);
    }

    #[test]
    fn styled_flag_selects_builtin_theme() {
        let config = Config::parse_from(["scatter-host", "--styled", "--flat"]);
        assert_eq!(config.load_style().unwrap(), Some(PlotStyle::styled()));
        assert_eq!(config.trace_options().kind, TraceKind::Scatter);
    }

    #[test]
    fn style_and_styled_conflict() {
        let parsed = Config::try_parse_from(["scatter-host", "--styled", "--style", "a.json"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_style_file_is_an_error() {
        let config = Config::parse_from(["scatter-host", "--style", "/nonexistent/style.json"]);
        assert!(config.load_style().is_err());
    }

    #[test]
    fn durations_are_bounded() {
        let config = Config::parse_from(["scatter-host", "--stream-ttl", "90"]);
        assert_eq!(config.stream_ttl(), chrono::Duration::seconds(90));

        for flag in ["--stream-ttl", "--cleanup-interval"] {
            assert!(Config::try_parse_from(["scatter-host", flag, "0"]).is_err());
            assert!(Config::try_parse_from(["scatter-host", flag, "18446744073709551615"]).is_err());
        }
    }

    #[test]
    fn oversized_ttl_saturates() {
        let mut config = Config::parse_from(["scatter-host"]);
        config.stream_ttl = u64::MAX;
        assert_eq!(config.stream_ttl(), chrono::Duration::MAX);
    }
}
