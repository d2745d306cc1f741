//! Page handlers

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};

use crate::AppState;
use crate::error::Result;

/// GET / - Host page embedding the visualizer in a frame
pub async fn index() -> impl IntoResponse {
    let html = include_str!("../../static/host.html");
    Html(html)
}

/// GET /view - The visualizer page loaded inside the frame
pub async fn view(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let style = match &state.style {
        Some(style) => serde_json::to_string(style)?,
        None => String::new(),
    };
    Ok(Html(render_view(&state.config.surface_id, &style)))
}

fn render_view(surface_id: &str, style_json: &str) -> String {
    include_str!("../../static/view.html")
        .replace("{{SURFACE_ID}}", surface_id)
        .replace("{{STYLE_JSON}}", &js_string(style_json))
}

/// Quote `s` as a JavaScript string literal safe inside a `<script>` block
fn js_string(s: &str) -> String {
    // `<` escaped so the literal cannot close the script element
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_embeds_surface_and_style() {
        let html = render_view("cloud_div", r#"{"layout":{}}"#);
        assert!(html.contains(r#"id="cloud_div""#));
        assert!(html.contains(r#""{\"layout\":{}}""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn script_close_cannot_escape() {
        assert_eq!(js_string("</script>"), r#""\u003c/script>""#);
    }
}
