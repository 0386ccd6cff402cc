#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tower_lsp::{LspService, Server};

use swiftlint_lsp::Backend;

pub async fn send_msg<W: AsyncWriteExt + Unpin>(writer: &mut W, msg: &str) {
    let content = format!("Content-Length: {}\r\n\r\n{}", msg.len(), msg);
    writer.write_all(content.as_bytes()).await.unwrap();
    writer.flush().await.unwrap();
}

pub async fn recv_msg<R: AsyncReadExt + Unpin>(reader: &mut R) -> Option<String> {
    let mut buffer = Vec::new();
    let mut content_length = 0;

    loop {
        let byte = reader.read_u8().await.ok()?;
        buffer.push(byte);
        if buffer.ends_with(b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buffer);
            for line in headers.lines() {
                if line.to_lowercase().starts_with("content-length:") {
                    let parts: Vec<&str> = line.split(':').collect();
                    if parts.len() == 2 {
                        content_length = parts[1].trim().parse().unwrap_or_else(|e| {
                            panic!("Failed to parse Content-Length: {e}, header: {line}")
                        });
                    }
                }
            }
            break;
        }
    }

    if content_length == 0 {
        return None;
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    Some(String::from_utf8(body).unwrap())
}

/// An in-process editor connected to a running server.
///
/// Requests sent by the server (`workspace/applyEdit`, ...) are answered
/// automatically and also kept in the message log.
pub struct TestClient {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<Value>,
    backlog: VecDeque<Value>,
    next_id: i64,
}

impl TestClient {
    pub fn start() -> Self {
        let (client_read, server_write) = tokio::io::duplex(64 * 1024);
        let (server_read, mut client_write) = tokio::io::duplex(64 * 1024);

        let (service, socket) = LspService::new(Backend::new);
        tokio::spawn(async move {
            Server::new(server_read, server_write, socket)
                .serve(service)
                .await;
        });

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                send_msg(&mut client_write, &msg).await;
            }
        });

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let replies = out_tx.clone();
        tokio::spawn(async move {
            let mut reader = tokio::io::BufReader::new(client_read);
            while let Some(raw) = recv_msg(&mut reader).await {
                let msg: Value = serde_json::from_str(&raw).unwrap();
                if let (Some(id), Some(method)) = (msg.get("id"), msg.get("method")) {
                    let result = match method.as_str() {
                        Some("workspace/applyEdit") => json!({ "applied": true }),
                        _ => Value::Null,
                    };
                    let reply = json!({ "jsonrpc": "2.0", "id": id, "result": result });
                    let _ = replies.send(reply.to_string());
                }
                if in_tx.send(msg).is_err() {
                    break;
                }
            }
        });

        Self {
            outgoing: out_tx,
            incoming: in_rx,
            backlog: VecDeque::new(),
            next_id: 1,
        }
    }

    pub fn notify(&self, method: &str, params: Value) {
        let msg = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        self.outgoing.send(msg.to_string()).unwrap();
    }

    /// Sends a request and waits for its response.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let mut msg = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        // Parameterless requests such as `shutdown` must omit the field.
        if !params.is_null() {
            msg["params"] = params;
        }
        self.outgoing.send(msg.to_string()).unwrap();

        loop {
            let msg = self.next_message().await.expect("server closed the connection");
            if msg.get("method").is_none() && msg["id"] == json!(id) {
                return msg;
            }
            self.backlog.push_back(msg);
        }
    }

    /// Initializes the server with a single workspace folder.
    pub async fn initialize(&mut self, root: &std::path::Path, options: Value) -> Value {
        let root_uri = tower_lsp::lsp_types::Url::from_file_path(root).unwrap();
        let response = self
            .request(
                "initialize",
                json!({
                    "capabilities": {},
                    "rootUri": root_uri,
                    "workspaceFolders": [{ "uri": root_uri, "name": "root" }],
                    "initializationOptions": options,
                }),
            )
            .await;
        self.notify("initialized", json!({}));
        response
    }

    /// Waits for a server message with `method` that satisfies `matches`.
    pub async fn wait_for<F>(&mut self, method: &str, matches: F) -> Option<Value>
    where
        F: Fn(&Value) -> bool,
    {
        if let Some(pos) = self
            .backlog
            .iter()
            .position(|m| m["method"] == method && matches(&m["params"]))
        {
            return self.backlog.remove(pos);
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let msg = tokio::time::timeout_at(deadline, self.next_message())
                .await
                .ok()??;
            if msg["method"] == method && matches(&msg["params"]) {
                return Some(msg);
            }
            self.backlog.push_back(msg);
        }
    }

    /// Collects messages with `method` that arrive within `window`.
    pub async fn collect(&mut self, method: &str, window: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(msg)) = tokio::time::timeout_at(deadline, self.next_message()).await {
            self.backlog.push_back(msg);
        }
        self.backlog
            .iter()
            .filter(|m| m["method"] == method)
            .cloned()
            .collect()
    }

    async fn next_message(&mut self) -> Option<Value> {
        self.incoming.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_msg_success() {
        let payload = r#"{"jsonrpc":"2.0","method":"abc","params":{}}"#;
        let data = format!("Content-Length: {}\r\n\r\n{}", payload.len(), payload);
        let mut cursor = std::io::Cursor::new(data.into_bytes());

        let result = recv_msg(&mut cursor).await;
        assert_eq!(result.unwrap(), payload);
    }

    #[tokio::test]
    #[should_panic(expected = "Failed to parse Content-Length")]
    async fn test_recv_msg_parse_error() {
        let data = "Content-Length: invalid\r\n\r\n{}";
        let mut cursor = std::io::Cursor::new(data.as_bytes().to_vec());
        let _ = recv_msg(&mut cursor).await;
    }
}
