use axum::{body::to_bytes, http::Request, Router};
use serde_json::Value;
use strive_rs::{config::Config, state::AppState};
use tower::ServiceExt;

fn app() -> Router {
    strive_rs::app(AppState::in_memory(Config::default()))
}

fn sample_gpx() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><name>Morning Run</name><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><ele>34.0</ele><time>2026-01-01T12:00:00Z</time><extensions><steps>20</steps></extensions></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>39.0</ele><time>2026-01-01T12:30:00Z</time><extensions><steps>30</steps></extensions></trkpt>
    <trkpt lat="52.5210" lon="13.4070"><ele>36.0</ele><time>2026-01-01T13:00:00Z</time></trkpt>
  </trkseg></trk>
</gpx>"#
}

fn multipart_body(file_name: &str, file_body: &str, boundary: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{file_body}\r\n--{boundary}--\r\n"
    )
}

fn upload_request(body: String, boundary: &str) -> Request<axum::body::Body> {
    Request::builder()
        .uri("/api/upload")
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn upload_gpx_returns_stored_activity() {
    let boundary = "X-BOUNDARY-TEST";
    let body = multipart_body("run.gpx", sample_gpx(), boundary);

    let response = app()
        .oneshot(upload_request(body, boundary))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&body).expect("json");

    assert!(json["id"].is_string());
    assert_eq!(json["name"], "Morning Run");
    assert_eq!(json["type"], "running");
    assert_eq!(json["date"], "2026-01-01T12:00:00Z");
    assert_eq!(json["totalTime"], 3600.0);
    assert_eq!(json["totalCalories"], 280.0);
    assert_eq!(json["elevationChange"], 5.0);
    assert_eq!(json["averageCadence"], 25.0);
    assert_eq!(json["averageHeartRate"], 0.0);
    assert_eq!(json["coordinates"].as_array().expect("coordinates").len(), 3);
    assert!(json["distance"].as_f64().expect("distance") > 0.0);
}

#[tokio::test]
async fn upload_rejects_non_gpx_content() {
    let boundary = "X-BOUNDARY-TEST";
    let body = multipart_body("run.txt", "hello", boundary);

    let response = app()
        .oneshot(upload_request(body, boundary))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_gpx_without_tracks() {
    let boundary = "X-BOUNDARY-TEST";
    let body = multipart_body("empty.gpx", r#"<gpx version="1.1"></gpx>"#, boundary);

    let response = app()
        .oneshot(upload_request(body, boundary))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(text.contains("no segments"));
}

#[tokio::test]
async fn upload_without_file_field_is_bad_request() {
    let boundary = "X-BOUNDARY-TEST";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--{boundary}--\r\n"
    );

    let response = app()
        .oneshot(upload_request(body, boundary))
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}
