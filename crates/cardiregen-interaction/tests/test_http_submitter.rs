use std::time::Duration;

use cardiregen_core::FrameBlob;
use cardiregen_core::error::AnalysisError;
use cardiregen_core::submitter::FrameSubmitter;
use cardiregen_interaction::HttpFrameSubmitter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serves exactly one canned HTTP response and hands back the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{addr}/"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buffer, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());

    match content_length {
        Some(length) => {
            while buffer.len() < header_end + length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..n]);
            }
        }
        None => {
            // chunked body
            while !buffer.ends_with(b"0\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..n]);
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn frame() -> FrameBlob {
    FrameBlob::new("patient001_ed.nii.gz", b"\x1f\x8bfake-nifti".to_vec())
}

#[tokio::test]
async fn test_submit_success_posts_multipart_to_analyze() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"lv_volume_ml": 120.0, "rv_volume_ml": 150.5, "mesh_obj": "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"}"#,
    )
    .await;

    let submitter = HttpFrameSubmitter::new();
    let result = submitter.submit(&frame(), &endpoint).await.unwrap();

    assert_eq!(result.volume_ml, 120.0);
    assert_eq!(result.rv_volume_ml, Some(150.5));
    assert!(result.mesh_payload.is_some());
    assert_eq!(result.source_name, "patient001_ed.nii.gz");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /analyze HTTP/1.1"), "{request}");
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"patient001_ed.nii.gz\""));
    assert!(request.contains("fake-nifti"));
}

#[tokio::test]
async fn test_non_2xx_is_connectivity_with_status() {
    let (endpoint, server) = serve_once("500 Internal Server Error", r#"{"detail":"CUDA out of memory"}"#).await;

    let err = HttpFrameSubmitter::new()
        .submit(&frame(), &endpoint)
        .await
        .unwrap_err();

    match err {
        AnalysisError::Connectivity { status_code, .. } => assert_eq!(status_code, Some(500)),
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_malformed_json_is_connectivity() {
    let (endpoint, server) = serve_once("200 OK", "<html>ngrok offline</html>").await;

    let err = HttpFrameSubmitter::new()
        .submit(&frame(), &endpoint)
        .await
        .unwrap_err();

    assert!(err.is_connectivity(), "{err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_missing_volume_is_response_shape() {
    let (endpoint, server) = serve_once("200 OK", r#"{"mesh_obj": null}"#).await;

    let err = HttpFrameSubmitter::new()
        .submit(&frame(), &endpoint)
        .await
        .unwrap_err();

    assert!(err.is_response_shape(), "{err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_is_connectivity() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpFrameSubmitter::new()
        .submit(&frame(), &format!("http://{addr}"))
        .await
        .unwrap_err();

    assert!(err.is_connectivity(), "{err:?}");
}

#[tokio::test]
async fn test_timeout_is_connectivity() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        // Hold the connection open without answering.
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(socket);
    });

    let err = HttpFrameSubmitter::new()
        .with_timeout(Duration::from_millis(200))
        .submit(&frame(), &format!("http://{addr}"))
        .await
        .unwrap_err();

    assert!(err.is_connectivity(), "{err:?}");
    server.abort();
}

#[tokio::test]
async fn test_empty_frame_rejected_without_request() {
    let err = HttpFrameSubmitter::new()
        .submit(&FrameBlob::new("empty.nii.gz", Vec::new()), "http://127.0.0.1:1")
        .await
        .unwrap_err();

    assert!(err.is_validation());
}
