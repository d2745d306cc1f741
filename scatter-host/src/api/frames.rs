//! Stream REST API handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use scatter_embed::csv_source::frame_from_csv;
use scatter_embed::frame::Frame;
use scatter_embed::trace::ScatterTrace;
use tracing::{debug, info};

use crate::AppState;
use crate::error::{HostError, Result};
use crate::models::StreamSummary;
use crate::models::stream::is_valid_name;

/// Build the stream API router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/streams", get(list_streams))
        .route("/streams/{name}", axum::routing::delete(delete_stream))
        .route("/streams/{name}/frames", post(push_frame))
        .route("/streams/{name}/frame", get(get_frame))
        .route("/streams/{name}/trace", get(get_trace))
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(HostError::BadRequest(format!("invalid stream name: {}", name)))
    }
}

/// Decode a request body as a frame: CSV for `text/csv`, frame JSON otherwise
fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Frame> {
    let text = std::str::from_utf8(body)
        .map_err(|_| HostError::BadRequest("body is not valid utf-8".to_string()))?;

    let is_csv = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/csv"));

    if is_csv {
        frame_from_csv(text).map_err(|report| HostError::BadRequest(format!("{:#}", report)))
    } else {
        Frame::decode(text).map_err(|e| HostError::BadRequest(e.to_string()))
    }
}

/// GET /api/v1/streams - List streams
async fn list_streams(State(state): State<Arc<AppState>>) -> Json<Vec<StreamSummary>> {
    let summaries = state
        .store
        .list()
        .iter()
        .map(|record| {
            StreamSummary::new(record, state.broadcast_hub.connection_count(&record.name))
        })
        .collect();
    Json(summaries)
}

/// POST /api/v1/streams/:name/frames - Store a frame and relay it to watchers
async fn push_frame(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StreamSummary>)> {
    check_name(&name)?;
    let frame = decode_body(&headers, &body)?;
    let json = frame.to_json()?;

    let record = state.store.put(&name, frame);
    let seq = state.broadcast_hub.broadcast_frame(&name, json);
    info!(
        "Stream {} revision {} ({} rows) relayed as seq {}",
        name,
        record.revision,
        record.frame.row_count(),
        seq
    );

    let status = if record.revision == 1 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let summary = StreamSummary::new(&record, state.broadcast_hub.connection_count(&name));
    Ok((status, Json(summary)))
}

/// GET /api/v1/streams/:name/frame - The latest frame
async fn get_frame(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Frame>> {
    let record = state
        .store
        .get(&name)
        .ok_or_else(|| HostError::NotFound(name.clone()))?;
    Ok(Json(record.frame))
}

/// GET /api/v1/streams/:name/trace - The trace the visualizer draws for the latest frame
async fn get_trace(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ScatterTrace>> {
    let record = state
        .store
        .get(&name)
        .ok_or_else(|| HostError::NotFound(name.clone()))?;

    let (trace, notes) = ScatterTrace::build(&record.frame, &state.trace_options);
    if !notes.unrecognized.is_empty() {
        debug!("Stream {} has unrecognized columns {:?}", name, notes.unrecognized);
    }
    Ok(Json(trace))
}

/// DELETE /api/v1/streams/:name - Drop a stream
async fn delete_stream(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    if state.store.delete(&name) {
        state.broadcast_hub.remove_stream(&name);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HostError::NotFound(name))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use clap::Parser;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::{AppState, build_router};

    use super::*;

    fn app() -> (Router, Arc<AppState>) {
        let config = Config::parse_from(["scatter-host"]);
        let state = Arc::new(AppState::new(config, None));
        (build_router(Arc::clone(&state)), state)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn post(uri: &str, content_type: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn json_frame_round_trips_to_trace() {
        let (app, _) = app();
        let (status, summary) = send(
            &app,
            post(
                "/api/v1/streams/cloud/frames",
                "application/json",
                r#"{"header":["position.x","position.y","position.z","size"],"data":[[1,2,3,5],[0," ",0,10]]}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(summary["rows"], 2);
        assert_eq!(summary["revision"], 1);

        let (status, trace) = send(&app, get_req("/api/v1/streams/cloud/trace")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trace["x"], serde_json::json!([1, 0]));
        assert_eq!(trace["y"], serde_json::json!([2, 0]));
        assert_eq!(trace["marker"]["size"], serde_json::json!([5, 10]));
        assert_eq!(trace["type"], "scatter3d");
    }

    #[tokio::test]
    async fn csv_frames_are_accepted() {
        let (app, state) = app();
        let (status, _) = send(
            &app,
            post("/api/v1/streams/csv/frames", "text/csv", "labels,size\na,\nb,4\n"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, frame) = send(&app, get_req("/api/v1/streams/csv/frame")).await;
        assert_eq!(frame["header"], serde_json::json!(["labels", "size"]));
        assert_eq!(frame["data"][0][1], " ");
        assert_eq!(state.store.get("csv").unwrap().frame.row_count(), 2);
    }

    #[tokio::test]
    async fn second_post_replaces_frame() {
        let (app, _) = app();
        let body = r#"{"header":["size"],"data":[[1]]}"#;
        send(&app, post("/api/v1/streams/s/frames", "application/json", body)).await;
        let (status, summary) =
            send(&app, post("/api/v1/streams/s/frames", "application/json", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["revision"], 2);
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected() {
        let (app, state) = app();
        let (status, err) = send(
            &app,
            post("/api/v1/streams/bad/frames", "application/json", "{\"header\":"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());

        let (status, _) = send(
            &app,
            post(
                "/api/v1/streams/bad/frames",
                "application/json",
                r#"{"header":["a","b"],"data":[[1]]}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            post("/api/v1/streams/bad/frames", "text/csv", "a,b\n1\n"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.store.get("bad").is_none());
    }

    #[tokio::test]
    async fn invalid_stream_name_is_rejected() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            post("/api/v1/streams/a.b/frames", "application/json", r#"{"header":[],"data":[]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_stream_is_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, get_req("/api/v1/streams/nope/frame")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get_req("/api/v1/streams/nope/trace")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_list() {
        let (app, _) = app();
        send(
            &app,
            post("/api/v1/streams/gone/frames", "application/json", r#"{"header":[],"data":[]}"#),
        )
        .await;
        let (_, list) = send(&app, get_req("/api/v1/streams")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/streams/gone")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = send(&app, get_req("/api/v1/streams")).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
