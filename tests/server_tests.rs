//! Integration tests for the delivery server routes

use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use inkframe::server::router;
use inkframe::{ServePolicy, ServeState};

/// Fresh output directory per test so runs never see each other's files
fn output_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("inkframe-server-test-{}-{tag}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn get(uri: &str, user_agent: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(ua) = user_agent {
        builder = builder.header(header::USER_AGENT, ua);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn missing_image_returns_not_found() {
    let dir = output_dir("missing");
    let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
    let app = router(state.clone(), "homepage", dir);

    let response = app.oneshot(get("/homepage.png", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // a failed request never counts as a serve
    assert_eq!(state.served_count(), 0);
}

#[tokio::test]
async fn serves_png_as_attachment_and_counts() {
    let dir = output_dir("png");
    fs::write(dir.join("homepage.png"), b"\x89PNG-bytes").unwrap();

    let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
    let app = router(state.clone(), "homepage", dir);

    let response = app.oneshot(get("/homepage.png", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"homepage.png\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"\x89PNG-bytes");
    assert_eq!(state.served_count(), 1);
}

#[tokio::test]
async fn serves_bmp_with_bmp_content_type() {
    let dir = output_dir("bmp");
    fs::write(dir.join("calendar.bmp"), b"BM-bytes").unwrap();

    let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
    let app = router(state.clone(), "calendar", dir);

    let response = app.oneshot(get("/calendar.bmp", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/bmp"
    );
    assert_eq!(state.served_count(), 1);
}

#[tokio::test]
async fn user_agent_policy_gates_serve_marking() {
    let dir = output_dir("ua");
    fs::write(dir.join("homepage.png"), b"png").unwrap();

    let state = ServeState::new(ServePolicy::UserAgent, "esp32".to_string());
    let app = router(state.clone(), "homepage", dir);

    // a browser poking at the URL gets the image but does not stop the run
    let response = app
        .clone()
        .oneshot(get("/homepage.png", Some("Mozilla/5.0")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.served_count(), 0);

    let response = app
        .oneshot(get("/homepage.png", Some("esp32-homepage/1.2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.served_count(), 1);
}

#[tokio::test]
async fn repeated_fetches_accumulate() {
    let dir = output_dir("repeat");
    fs::write(dir.join("homepage.png"), b"png").unwrap();

    let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
    let app = router(state.clone(), "homepage", dir);

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/homepage.png", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.served_count(), 3);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let dir = output_dir("unknown");
    fs::write(dir.join("homepage.png"), b"png").unwrap();

    let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
    let app = router(state.clone(), "homepage", dir);

    let response = app.oneshot(get("/other.png", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.served_count(), 0);
}
