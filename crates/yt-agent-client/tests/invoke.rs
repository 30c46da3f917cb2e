use std::time::Duration;

use serde_json::{json, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};
use yt_agent_client::{
    arguments,
    types::{Credential, Operation, ToolCall},
    ClientConfig, McpClient, ToolInvoker,
};

struct CapturedRequest {
    head: String,
    body: Value,
}

/// Serves exactly one HTTP request with the given status and body, handing the
/// captured request back through the returned channel.
async fn serve_once(
    status: &'static str,
    response_body: String,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        let (head, request_body) = loop {
            let read = socket.read(&mut chunk).await.expect("read");
            buffer.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&buffer).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = text[..split].to_string();
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                let received = &buffer[split + 4..];
                if received.len() >= length {
                    let parsed = serde_json::from_slice(&received[..length]).unwrap_or(Value::Null);
                    break (head, parsed);
                }
            }
            if read == 0 {
                break (text, Value::Null);
            }
        };

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{response_body}",
            response_body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.flush().await.ok();
        let _ = tx.send(CapturedRequest {
            head,
            body: request_body,
        });
    });

    (format!("http://{addr}"), rx)
}

fn client_for(base_url: String) -> McpClient {
    McpClient::with_config(ClientConfig {
        base_url,
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn forwards_credentials_and_body() {
    let (base_url, captured) = serve_once(
        "200 OK",
        json!({"success": true, "data": {"message": "liked"}}).to_string(),
    )
    .await;
    let client = client_for(base_url);

    let result = client
        .invoke(ToolCall::new(
            Operation::LikeVideo,
            arguments! { "video_id" => "dQw4w9WgXcQ" },
            Credential::new(
                Some("ya29.token".to_string()),
                Some("yt_access_token=ya29.token".to_string()),
            ),
        ))
        .await;

    assert!(result.success);
    let request = captured.await.expect("request captured");
    assert!(request.head.starts_with("POST /mcp/call"));
    let head = request.head.to_lowercase();
    assert!(head.contains("authorization: bearer ya29.token"));
    assert!(head.contains("cookie: yt_access_token=ya29.token"));
    assert_eq!(
        request.body,
        json!({"tool_name": "like_video", "arguments": {"video_id": "dQw4w9WgXcQ"}})
    );
}

#[tokio::test]
async fn anonymous_call_sends_no_auth_headers() {
    let (base_url, captured) =
        serve_once("200 OK", json!({"success": true, "data": {"items": []}}).to_string()).await;
    let client = client_for(base_url);

    let result = client
        .invoke(ToolCall::new(
            Operation::TrendingVideos,
            arguments! { "max_results" => 12 },
            Credential::anonymous(),
        ))
        .await;

    assert!(result.success);
    let request = captured.await.expect("request captured");
    let head = request.head.to_lowercase();
    assert!(!head.contains("authorization:"));
    assert!(!head.contains("\r\ncookie:"));
}

#[tokio::test]
async fn declined_call_keeps_backend_error() {
    let (base_url, _captured) = serve_once(
        "500 Internal Server Error",
        json!({"success": false, "error": "Authentication required"}).to_string(),
    )
    .await;
    let client = client_for(base_url);

    let result = client
        .invoke(ToolCall::new(
            Operation::SubscribeChannel,
            arguments! { "channel_id" => "UCsBjURrPoezykLs9EqgamOA" },
            Credential::anonymous(),
        ))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Authentication required"));
}

#[tokio::test]
async fn garbage_body_becomes_failure() {
    let (base_url, _captured) = serve_once("502 Bad Gateway", "<html>oops</html>".to_string()).await;
    let client = client_for(base_url);

    let result = client
        .invoke(ToolCall::new(
            Operation::MySubscriptions,
            arguments! {},
            Credential::anonymous(),
        ))
        .await;

    assert!(!result.success);
    assert!(result.error_or_default().contains("502"));
}

#[tokio::test]
async fn transport_failure_becomes_failure() {
    // Bind then drop so the port is known to be closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = client_for(format!("http://{addr}"));

    let result = client
        .invoke(ToolCall::new(
            Operation::SearchVideos,
            arguments! { "query" => "rust", "max_results" => 10 },
            Credential::anonymous(),
        ))
        .await;

    assert!(!result.success);
    assert!(result.error_or_default().starts_with("HTTP request failed"));
}

#[tokio::test]
async fn lists_backend_tools() {
    let (base_url, captured) = serve_once(
        "200 OK",
        json!({
            "tools": [
                {"name": "search_videos", "description": "Search for YouTube videos.", "input_schema": {"type": "object"}},
                {"name": "like_video", "description": "Like a video."}
            ],
            "total_count": 2
        })
        .to_string(),
    )
    .await;
    let client = client_for(base_url);

    let tools = client.list_tools().await.expect("catalogue loads");
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "search_videos");
    let request = captured.await.expect("request captured");
    assert!(request.head.starts_with("GET /mcp/tools"));
}
