use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use tower::ServiceExt;
use video_upload_backend::config::UploadConfig;
use video_upload_backend::{AppState, create_app};

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

fn setup_app(upload_dir: &Path, max_file_size: u64) -> Router {
    let config = UploadConfig {
        max_file_size,
        chunk_size: 64,
        upload_dir: upload_dir.to_path_buf(),
    };
    create_app(AppState::new(config))
}

fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: video/mp4\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let tmp = tempfile::tempdir().unwrap();
    let app = setup_app(&tmp.path().join("upload"), 1024);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!({ "message": "Healthy" }));
}

#[tokio::test]
async fn test_upload_flow() {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("nested").join("upload");
    let app = setup_app(&upload_dir, 1024 * 1024);

    // Binary content spanning several receiver chunks, including CR/LF bytes
    let content: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    let response = app
        .oneshot(upload_request(multipart_body("holiday.mp4", &content)))
        .await
        .unwrap();

    let status = response.status();
    let json = json_body(response).await;
    if status != StatusCode::OK {
        panic!("Upload failed with status {}: {}", status, json);
    }

    assert_eq!(json["filename"], "holiday.mp4");
    assert_eq!(json["size_bytes"], 1000);
    assert_eq!(json["message"], "Upload successful");

    assert!(upload_dir.is_dir());
    assert_eq!(std::fs::read(upload_dir.join("holiday.mp4")).unwrap(), content);
}

#[tokio::test]
async fn test_upload_overwrites_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("upload");
    let app = setup_app(&upload_dir, 1024);

    for content in [&b"first version, longer"[..], &b"second"[..]] {
        let response = app
            .clone()
            .oneshot(upload_request(multipart_body("clip.mp4", content)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(std::fs::read(upload_dir.join("clip.mp4")).unwrap(), b"second");
}

#[tokio::test]
async fn test_upload_ignores_extra_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("upload");
    let app = setup_app(&upload_dir, 1024);

    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"title\"\r\n\r\n\
        My holiday\r\n"
    )
    .into_bytes();
    body.extend(multipart_body("clip.mp4", b"frames"));

    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read(upload_dir.join("clip.mp4")).unwrap(), b"frames");
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = setup_app(&tmp.path().join("upload"), 1024);

    let body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"title\"\r\n\r\n\
        no file here\r\n\
        --{BOUNDARY}--\r\n"
    );

    let response = app
        .oneshot(upload_request(body.into_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "File field is required.");
}

#[tokio::test]
async fn test_concurrent_uploads_with_distinct_names() {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("upload");
    let app = setup_app(&upload_dir, 1024 * 1024);

    let a = vec![b'a'; 5000];
    let b = vec![b'b'; 7000];

    let (ra, rb) = tokio::join!(
        app.clone().oneshot(upload_request(multipart_body("a.mp4", &a))),
        app.clone().oneshot(upload_request(multipart_body("b.mp4", &b))),
    );

    let ra = ra.unwrap();
    let rb = rb.unwrap();
    assert_eq!(ra.status(), StatusCode::OK);
    assert_eq!(rb.status(), StatusCode::OK);
    assert_eq!(json_body(ra).await["size_bytes"], 5000);
    assert_eq!(json_body(rb).await["size_bytes"], 7000);

    assert_eq!(std::fs::read(upload_dir.join("a.mp4")).unwrap(), a);
    assert_eq!(std::fs::read(upload_dir.join("b.mp4")).unwrap(), b);
}

#[tokio::test]
async fn test_unavailable_directory_is_server_error() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("upload");
    std::fs::write(&blocker, b"a file where the directory should be").unwrap();
    let app = setup_app(&blocker, 1024);

    let response = app
        .oneshot(upload_request(multipart_body("clip.mp4", b"data")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Failed to prepare upload directory:"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let tmp = tempfile::tempdir().unwrap();
    let app = setup_app(&tmp.path().join("upload"), 1024);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let tmp = tempfile::tempdir().unwrap();
    let app = setup_app(&tmp.path().join("upload"), 1024);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["info"]["title"], "Video Upload Backend");
    assert!(json["paths"]["/"].is_object());
    assert!(json["paths"]["/upload"]["post"].is_object());
}
