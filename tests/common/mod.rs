#![allow(dead_code)]

use palit::pipeline::client::Client;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

/// What the responder saw.
pub struct Recorded {
    pub request_line: String,
    pub headers: String,
    pub body: serde_json::Value,
}

/// Answer exactly one HTTP request with `status` and `body`, then stop.
pub async fn respond_once(status: u16, body: String) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before headers ended");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before body ended");
            raw.extend_from_slice(&buf[..n]);
        }

        let reason = match status {
            200 => "OK",
            401 => "Unauthorized",
            429 => "Too Many Requests",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        let (request_line, headers) = head.split_once("\r\n").unwrap();
        Recorded {
            request_line: request_line.to_string(),
            headers: headers.to_lowercase(),
            body: serde_json::from_slice(&raw[header_end..header_end + content_length])
                .unwrap_or(serde_json::Value::Null),
        }
    });

    (base_url, handle)
}

/// A client that never routes loopback test traffic through a proxy.
pub fn local_client() -> Client {
    Client::from_reqwest(reqwest::Client::builder().no_proxy().build().unwrap())
}

/// A chat completion whose message content is `content`.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content, "refusal": null },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// A successful Firecrawl scrape of `markdown`.
pub fn scrape_body(markdown: &str, source_url: &str) -> String {
    serde_json::json!({
        "success": true,
        "data": {
            "markdown": markdown,
            "metadata": {
                "title": "Calendar | Metrograph",
                "sourceURL": source_url,
                "statusCode": 200
            }
        }
    })
    .to_string()
}
