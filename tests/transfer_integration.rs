//! Integration tests for multipart uploads and streaming downloads.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use httpreq::{HttpClient, Method, ProgressUpdate, RequestError, RequestOptions, ResponseBody};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Finds `needle` inside `haystack`, byte-wise.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[tokio::test]
async fn test_upload_multipart_round_trip() {
    let file_content: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
    let temp_dir = TempDir::new().expect("temp dir");
    let file_path = temp_dir.path().join("sample.bin");
    std::fs::write(&file_path, &file_content).expect("write fixture");

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let response = client
        .upload_files(
            &format!("{}/upload", mock_server.uri()),
            RequestOptions::new()
                .parameter("a", "1")
                .file("attachment", &file_path),
        )
        .await
        .expect("upload should succeed");
    assert_eq!(response.text(), Some("stored"));

    let requests = mock_server.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    // Content-Type advertises multipart with the engine's boundary.
    let content_type = request
        .headers
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .expect("upload has a content type");
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "unexpected content type: {content_type}"
    );
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("boundary token");

    // A conformant parse recovers the field value and the exact file bytes.
    let body = &request.body;
    let field_part = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n"
    );
    assert!(
        find(body, field_part.as_bytes()).is_some(),
        "field part a=1 missing from body"
    );

    let file_header = format!(
        "--{boundary}\r\nContent-Disposition: file; name=\"attachment\"; \
         filename=\"sample.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    );
    let file_start = find(body, file_header.as_bytes()).expect("file part header missing")
        + file_header.len();
    let file_end = file_start + file_content.len();
    assert_eq!(
        &body[file_start..file_end],
        &file_content[..],
        "file bytes must round-trip byte-for-byte"
    );
    assert_eq!(&body[file_end..file_end + 2], b"\r\n");

    // Closing boundary terminates the body.
    let closing = format!("--{boundary}--\r\n");
    assert!(
        body.ends_with(closing.as_bytes()),
        "body must end with the closing boundary"
    );

    // Content-Length is the exact byte length of the assembled body.
    let declared: usize = request
        .headers
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("upload declares a content length");
    assert_eq!(declared, body.len());
}

#[tokio::test]
async fn test_upload_with_put_and_array_field() {
    let temp_dir = TempDir::new().expect("temp dir");
    let one = temp_dir.path().join("one.txt");
    let two = temp_dir.path().join("two.txt");
    std::fs::write(&one, b"first").expect("fixture one");
    std::fs::write(&two, b"second").expect("fixture two");

    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let response = client
        .request(
            Method::Put,
            &format!("{}/upload", mock_server.uri()),
            RequestOptions::new().files("docs", [&one, &two]),
        )
        .await
        .expect("PUT upload should succeed");
    assert_eq!(response.status, 200);

    let requests = mock_server.received_requests().await.expect("recording on");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert_eq!(
        body.matches("Content-Disposition: file; name=\"docs\"").count(),
        2,
        "array-valued field emits one part per path"
    );
    assert!(body.contains("first") && body.contains("second"));
}

#[tokio::test]
async fn test_upload_unreadable_file_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let result = client
        .upload_files(
            &format!("{}/upload", mock_server.uri()),
            RequestOptions::new().file("f", "/nonexistent/missing.bin"),
        )
        .await;

    assert!(
        matches!(result, Err(httpreq::RequestError::FileRead { .. })),
        "expected FileRead, got {result:?}"
    );
    let requests = mock_server.received_requests().await.expect("recording on");
    assert!(
        requests.is_empty(),
        "an unreadable upload source must fail before any network I/O"
    );
}

#[tokio::test]
async fn test_download_streams_byte_identical_file() {
    // Large enough to arrive in multiple fragments.
    let content: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fixture.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("temp dir");
    let destination = temp_dir.path().join("fixture.bin");

    let client = HttpClient::new();
    let response = client
        .download(
            &format!("{}/fixture.bin", mock_server.uri()),
            &destination,
            RequestOptions::new(),
        )
        .await
        .expect("download should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        ResponseBody::Saved(destination.clone()),
        "streamed responses report the destination, not a body"
    );

    let written = std::fs::read(&destination).expect("read downloaded file");
    assert_eq!(written, content, "downloaded file must be byte-identical");
}

#[tokio::test]
async fn test_failed_download_removes_partial_file() {
    // Hand-rolled responder: declares a megabyte, sends a few bytes, then
    // drops the connection mid-body.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind responder");
    let address = listener.local_addr().expect("responder address");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1048576\r\n\r\ntruncated")
            .await;
        let _ = socket.flush().await;
        drop(socket);
    });

    let temp_dir = TempDir::new().expect("temp dir");
    let destination = temp_dir.path().join("partial.bin");

    let client = HttpClient::new();
    let result = client
        .download(
            &format!("http://{address}/file.bin"),
            &destination,
            RequestOptions::new(),
        )
        .await;

    assert!(
        matches!(result, Err(RequestError::Aborted { .. })),
        "expected Aborted, got {result:?}"
    );
    assert!(
        !destination.exists(),
        "a failed stream must not leave a partial file behind"
    );
}

#[tokio::test]
async fn test_download_reports_determinate_progress() {
    let content = vec![7u8; 64 * 1024];
    let total = content.len() as u64;
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sized.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("temp dir");
    let destination = temp_dir.path().join("sized.bin");

    let seen: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let client = HttpClient::new();
    client
        .download(
            &format!("{}/sized.bin", mock_server.uri()),
            &destination,
            RequestOptions::new().on_progress(Arc::new(move |update| {
                sink.lock().expect("progress lock").push(update);
            })),
        )
        .await
        .expect("download should succeed");

    let seen = seen.lock().expect("progress lock");
    assert!(!seen.is_empty(), "progress must be reported");
    for update in seen.iter() {
        match update {
            ProgressUpdate::Determinate { total_bytes, .. } => {
                assert_eq!(*total_bytes, total);
            }
            ProgressUpdate::Unknown => {
                panic!("length was declared; no Unknown notice expected")
            }
        }
    }
    match seen.last().expect("at least one update") {
        ProgressUpdate::Determinate {
            current_bytes,
            percentage,
            ..
        } => {
            assert_eq!(*current_bytes, total);
            assert!((percentage - 100.0).abs() < f64::EPSILON);
        }
        ProgressUpdate::Unknown => unreachable!(),
    }
}

#[tokio::test]
async fn test_buffered_get_also_reports_progress() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&mock_server)
        .await;

    let seen: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let client = HttpClient::new();
    let response = client
        .get(
            &format!("{}/page", mock_server.uri()),
            RequestOptions::new().on_progress(Arc::new(move |update| {
                sink.lock().expect("progress lock").push(update);
            })),
        )
        .await
        .expect("GET should succeed");

    assert_eq!(response.text(), Some("hello"));
    assert!(
        !seen.lock().expect("progress lock").is_empty(),
        "buffered bodies report progress too"
    );
}

#[tokio::test]
async fn test_fire_and_forget_issues_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    client.fire_and_forget(
        Method::Post,
        &format!("{}/notify", mock_server.uri()),
        RequestOptions::new().json(serde_json::json!({"event": "done"})),
    );

    // The spawned transaction runs detached; poll until the server saw it.
    let mut waited = Duration::ZERO;
    loop {
        let requests = mock_server.received_requests().await.expect("recording on");
        if !requests.is_empty() {
            break;
        }
        assert!(
            waited < Duration::from_secs(5),
            "fire-and-forget request never arrived"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
}
