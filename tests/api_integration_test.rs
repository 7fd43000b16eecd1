mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use drive_backend::create_app;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------drivebackendtestboundary";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, token: &str, folder_id: i32, files: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{id}\r\n",
        b = BOUNDARY,
        id = folder_id
    );
    for (field, filename, content) in files {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n",
            b = BOUNDARY
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/register",
            None,
            json!({"email": email, "display_name": "Tester", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": email, "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_drive_flow() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());
    let token = register_and_login(&app, "alice@example.com").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/folders", Some(&token), json!({"name": "Docs"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let folder: Value = serde_json::from_slice(&body).unwrap();
    let folder_id = folder["id"].as_i64().unwrap() as i32;
    assert!(folder["parent_id"].is_null());

    let (status, body) = send(
        &app,
        multipart_request(
            "/files/upload",
            &token,
            folder_id,
            &[("file", "hello.txt", "Hello, drive!")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&body));
    let file: Value = serde_json::from_slice(&body).unwrap();
    let file_id = file["id"].as_i64().unwrap();
    assert_eq!(file["name"], "hello.txt");
    assert_eq!(file["size"], 13);
    assert_eq!(file["extension"], ".txt");

    let (status, body) = send(&app, get(&format!("/files/{}/download", file_id), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Hello, drive!");

    let (status, body) = send(&app, get(&format!("/folders/{}", folder_id), &token)).await;
    assert_eq!(status, StatusCode::OK);
    let details: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(details["files"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/files/{}/rename", file_id),
            Some(&token),
            json!({"name": "greeting.txt"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/folders/{}", folder_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["folders_removed"], 1);
    assert_eq!(report["files_removed"], 1);

    let (status, body) = send(&app, get(&format!("/files/{}", file_id), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"].is_string());
    assert_eq!(ctx.blobs.len(), 0);
}

#[tokio::test]
async fn test_upload_multiple_endpoint() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());
    let token = register_and_login(&app, "alice@example.com").await;

    let (_, body) = send(
        &app,
        json_request("POST", "/folders", Some(&token), json!({"name": "Batch"})),
    )
    .await;
    let folder_id = serde_json::from_slice::<Value>(&body).unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let (status, body) = send(
        &app,
        multipart_request(
            "/files/upload-multiple",
            &token,
            folder_id,
            &[("files", "a.txt", "aaa"), ("files", "b.md", "bb")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&body));
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(ctx.blobs.len(), 2);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());

    let (status, _) = send(
        &app,
        Request::builder().uri("/folders").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/folders", "not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_database_and_storage() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());
    let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
    assert_eq!(json["storage"], "reachable");

    ctx.blobs.fail_get_on("health");
    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"], "connected");
    assert_eq!(json["storage"], "unreachable");
}

#[tokio::test]
async fn test_error_statuses() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());
    let token = register_and_login(&app, "alice@example.com").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/register",
            None,
            json!({"email": "alice@example.com", "display_name": "Again", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request("POST", "/folders", Some(&token), json!({"name": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/folders/abc", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/folders/99", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "alice@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_in_query_string_works_for_downloads() {
    let ctx = common::setup().await;
    let app = create_app(ctx.state.clone());
    let token = register_and_login(&app, "alice@example.com").await;

    let (status, _) = send(
        &app,
        Request::builder()
            .uri(format!("/users/me?token={}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
