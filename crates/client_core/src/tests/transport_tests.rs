use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

const SESSION_COOKIE: &str = "session=pdf-123";

#[derive(Debug, Clone)]
struct ReceivedPart {
    field_name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct ServerState {
    parts: Arc<Mutex<Vec<ReceivedPart>>>,
    questions: Arc<Mutex<Vec<String>>>,
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.split(';').any(|c| c.trim() == SESSION_COOKIE))
}

async fn handle_upload(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    let mut pdf = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let part = ReceivedPart {
            field_name: field.name().map(str::to_string),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.map(|b| b.to_vec()).unwrap_or_default(),
        };
        if part.field_name.as_deref() == Some("pdf") {
            pdf = Some(part.clone());
        }
        state.parts.lock().await.push(part);
    }

    let Some(pdf) = pdf else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "No file field named 'pdf'." })),
        )
            .into_response();
    };
    let file_name = pdf.file_name.unwrap_or_default();
    if !file_name.to_lowercase().ends_with(".pdf") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Only PDF files are allowed." })),
        )
            .into_response();
    }

    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
        Json(json!({
            "ok": true,
            "pdf_id": "1f0e",
            "pdf_name": file_name,
            "message": "PDF uploaded successfully."
        })),
    )
        .into_response()
}

async fn handle_ask(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Response {
    if !has_session(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Upload a PDF first." })),
        )
            .into_response();
    }
    state.questions.lock().await.push(request.question);
    Json(json!({ "ok": true, "answer": "30 days.", "source": "p.4" })).into_response()
}

async fn handle_reset() -> Response {
    (
        [(header::SET_COOKIE, "session=cleared; Path=/".to_string())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

async fn handle_bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        "<html><body>Bad Gateway</body></html>",
    )
        .into_response()
}

async fn handle_slow_ask() -> Response {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "ok": true, "answer": "late" })).into_response()
}

async fn spawn_backend_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/reset", post(handle_reset))
        .route("/broken/upload", post(handle_bad_gateway))
        .route("/broken/ask", post(handle_bad_gateway))
        .route("/broken/reset", post(handle_bad_gateway))
        .route("/slow/ask", post(handle_slow_ask))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn pdf_upload(filename: &str) -> PdfUpload {
    PdfUpload {
        filename: filename.to_string(),
        bytes: b"%PDF-1.4\n%%EOF\n".to_vec(),
    }
}

#[tokio::test]
async fn upload_sends_pdf_field_and_session_carries_to_ask() {
    let (server_url, state) = spawn_backend_server().await;
    let backend = HttpChatBackend::new(&server_url).expect("backend");

    let accepted = backend
        .upload_pdf(pdf_upload("doc.pdf"))
        .await
        .expect("upload");
    assert_eq!(accepted.pdf_name, "doc.pdf");
    assert_eq!(accepted.pdf_id.as_deref(), Some("1f0e"));

    let parts = state.parts.lock().await.clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].field_name.as_deref(), Some("pdf"));
    assert_eq!(parts[0].file_name.as_deref(), Some("doc.pdf"));
    assert_eq!(parts[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(parts[0].bytes, b"%PDF-1.4\n%%EOF\n".to_vec());

    let answer = backend
        .ask("What is the refund policy?")
        .await
        .expect("answer");
    assert_eq!(answer.text, "30 days.");
    assert_eq!(answer.source.as_deref(), Some("p.4"));
    assert_eq!(
        *state.questions.lock().await,
        vec!["What is the refund policy?".to_string()]
    );
}

#[tokio::test]
async fn rejection_with_error_status_is_parsed_from_body() {
    let (server_url, state) = spawn_backend_server().await;
    let backend = HttpChatBackend::new(&server_url).expect("backend");

    let err = backend.ask("anything").await.expect_err("no session");
    let rejection = err.rejection().expect("rejection");
    assert_eq!(rejection.endpoint, Endpoint::Ask);
    assert_eq!(rejection.message.as_deref(), Some("Upload a PDF first."));
    assert!(state.questions.lock().await.is_empty());
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_by_server() {
    let (server_url, _state) = spawn_backend_server().await;
    let backend = HttpChatBackend::new(&server_url).expect("backend");

    let err = backend
        .upload_pdf(pdf_upload("notes.txt"))
        .await
        .expect_err("rejected");
    assert_eq!(
        err.rejection().and_then(|r| r.message.as_deref()),
        Some("Only PDF files are allowed.")
    );
}

#[tokio::test]
async fn reset_drops_the_session() {
    let (server_url, _state) = spawn_backend_server().await;
    let backend = HttpChatBackend::new(&server_url).expect("backend");

    backend
        .upload_pdf(pdf_upload("doc.pdf"))
        .await
        .expect("upload");
    backend.reset().await.expect("reset");

    let err = backend.ask("still there?").await.expect_err("no session");
    assert!(err.rejection().is_some());
}

#[tokio::test]
async fn non_json_body_is_a_decode_failure() {
    let (server_url, _state) = spawn_backend_server().await;
    let backend = HttpChatBackend::new(&format!("{server_url}/broken")).expect("backend");

    let err = backend.reset().await.expect_err("html body");
    assert!(
        matches!(err, ClientError::Decode { endpoint: Endpoint::Reset, .. }),
        "unexpected error: {err}"
    );
    let err = backend
        .upload_pdf(pdf_upload("doc.pdf"))
        .await
        .expect_err("html body");
    assert!(matches!(err, ClientError::Decode { endpoint: Endpoint::Upload, .. }));
}

#[tokio::test]
async fn unreachable_server_is_an_http_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpChatBackend::new(&format!("http://{addr}")).expect("backend");
    let err = backend.ask("hello").await.expect_err("refused");
    assert!(matches!(err, ClientError::Http { endpoint: Endpoint::Ask, .. }));
}

#[tokio::test]
async fn request_timeout_surfaces_as_http_failure() {
    let (server_url, _state) = spawn_backend_server().await;
    let backend = HttpChatBackend::with_options(
        &format!("{server_url}/slow"),
        HttpOptions {
            request_timeout: Some(Duration::from_millis(200)),
        },
    )
    .expect("backend");

    let err = backend.ask("hello").await.expect_err("timed out");
    match err {
        ClientError::Http { source, .. } => assert!(source.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn base_url_gets_trailing_slash_for_endpoint_joins() {
    let url = normalize_base_url("http://127.0.0.1:5000").expect("url");
    assert_eq!(url.as_str(), "http://127.0.0.1:5000/");
    assert_eq!(
        url.join("upload").expect("join").as_str(),
        "http://127.0.0.1:5000/upload"
    );

    let nested = normalize_base_url(" https://example.com/pdfchat?x=1 ").expect("url");
    assert_eq!(
        nested.join("ask").expect("join").as_str(),
        "https://example.com/pdfchat/ask"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = normalize_base_url("not a url").expect_err("invalid");
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[tokio::test]
async fn pdf_upload_reads_file_name_and_bytes_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Policy Handbook.pdf");
    std::fs::write(&path, b"%PDF-1.7").expect("write");

    let upload = PdfUpload::from_path(&path).await.expect("read");
    assert_eq!(upload.filename, "Policy Handbook.pdf");
    assert_eq!(upload.bytes, b"%PDF-1.7".to_vec());

    let err = PdfUpload::from_path(&dir.path().join("missing.pdf"))
        .await
        .expect_err("missing");
    assert!(matches!(err, ClientError::Io { .. }));
}
