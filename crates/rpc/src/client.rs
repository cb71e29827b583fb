use crate::codec::{RpcRequest, RpcResponse, SERVER_ERROR_CODE};
use aarogya_common::{IntakeError, Result};
use serde_json::Value;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

struct Transport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

/// JSON-RPC 2.0 client over any byte stream pair. One request and its
/// matching response occupy the stream at a time; calls serialize on an
/// internal lock.
pub struct RpcClient<R, W> {
    transport: Mutex<Transport<R, W>>,
    next_id: AtomicU64,
    timeout: Duration,
    // Keeps the records process alive for the lifetime of the client.
    _child: Option<Child>,
}

impl<R, W> RpcClient<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            transport: Mutex::new(Transport {
                lines: BufReader::new(reader).lines(),
                writer,
            }),
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_CALL_TIMEOUT,
            _child: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        let mut line = serde_json::to_string(&request)
            .map_err(|e| IntakeError::Internal(format!("failed to encode RPC request: {e}")))?;
        line.push('\n');

        debug!("rpc call {} (id {})", method, id);

        let mut transport = self.transport.lock().await;
        transport
            .writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to write RPC request: {e}")))?;
        transport
            .writer
            .flush()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to flush RPC request: {e}")))?;

        let reply = tokio::time::timeout(self.timeout, transport.lines.next_line())
            .await
            .map_err(|_| IntakeError::Adapter(format!("RPC call '{method}' timed out")))?
            .map_err(|e| IntakeError::Adapter(format!("failed to read RPC response: {e}")))?
            .ok_or_else(|| {
                IntakeError::Protocol("records connection closed mid-call".to_string())
            })?;

        let response: RpcResponse = serde_json::from_str(&reply)
            .map_err(|e| IntakeError::Protocol(format!("malformed RPC response: {e}")))?;

        if response.id != id {
            return Err(IntakeError::Protocol(format!(
                "RPC response id mismatch: expected {id}, got {}",
                response.id
            )));
        }
        if let Some(error) = response.error {
            if error.code == SERVER_ERROR_CODE && error.message.to_lowercase().contains("not found")
            {
                return Err(IntakeError::NotFound(error.message));
            }
            return Err(IntakeError::Adapter(format!(
                "records error {}: {}",
                error.code, error.message
            )));
        }
        response
            .result
            .ok_or_else(|| IntakeError::Protocol("RPC response carried neither result nor error".to_string()))
    }
}

/// Spawns the records backend as a child process and connects to its stdio.
/// `command` is a whitespace-separated program invocation, e.g.
/// `python3 records_server.py`.
pub fn spawn_records_process(command: &str) -> Result<RpcClient<ChildStdout, ChildStdin>> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| IntakeError::Internal("empty records command".to_string()))?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| IntakeError::Internal(format!("failed to spawn records process: {e}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| IntakeError::Internal("records process has no stdin".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| IntakeError::Internal("records process has no stdout".to_string()))?;

    info!("spawned records process: {}", command);

    let mut client = RpcClient::new(stdout, stdin);
    client._child = Some(child);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{duplex, split};

    /// Serves exactly one scripted reply per received line.
    async fn serve_one(stream: tokio::io::DuplexStream, reply: impl Fn(RpcRequest) -> String) {
        let (read, mut write) = split(stream);
        let mut lines = BufReader::new(read).lines();
        if let Ok(Some(line)) = lines.next_line().await {
            let request: RpcRequest = serde_json::from_str(&line).unwrap();
            let mut out = reply(request);
            out.push('\n');
            write.write_all(out.as_bytes()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_call_returns_result() {
        let (client_io, server_io) = duplex(4096);
        tokio::spawn(serve_one(server_io, |request| {
            assert_eq!(request.method, "test_connection");
            format!(
                r#"{{"jsonrpc":"2.0","id":{},"result":{{"status":"ok"}}}}"#,
                request.id
            )
        }));

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        let result = client.call("test_connection", None).await.unwrap();
        assert_eq!(result, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_server_error_surfaces_as_adapter_error() {
        let (client_io, server_io) = duplex(4096);
        tokio::spawn(serve_one(server_io, |request| {
            format!(
                r#"{{"jsonrpc":"2.0","id":{},"error":{{"code":-32000,"message":"no such patient"}}}}"#,
                request.id
            )
        }));

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        let err = client
            .call("get_patient_detail", Some(json!({"patient_id": 99})))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Adapter(_)));
        assert!(err.to_string().contains("no such patient"));
    }

    #[tokio::test]
    async fn test_not_found_error_maps_to_not_found() {
        let (client_io, server_io) = duplex(4096);
        tokio::spawn(serve_one(server_io, |request| {
            format!(
                r#"{{"jsonrpc":"2.0","id":{},"error":{{"code":-32000,"message":"Patient not found"}}}}"#,
                request.id
            )
        }));

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        let err = client
            .call("get_patient_detail", Some(json!({"patient_id": 99})))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_id_mismatch_is_a_protocol_error() {
        let (client_io, server_io) = duplex(4096);
        tokio::spawn(serve_one(server_io, |_| {
            r#"{"jsonrpc":"2.0","id":999,"result":{}}"#.to_string()
        }));

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        let err = client.call("test_connection", None).await.unwrap_err();
        assert!(matches!(err, IntakeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_closed_connection_is_a_protocol_error() {
        let (client_io, server_io) = duplex(4096);
        drop(server_io);

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        let err = client.call("test_connection", None).await.unwrap_err();
        assert!(matches!(err, IntakeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let (client_io, server_io) = duplex(4096);
        tokio::spawn(async move {
            let (read, mut write) = split(server_io);
            let mut lines = BufReader::new(read).lines();
            let mut expected = 1;
            while let Ok(Some(line)) = lines.next_line().await {
                let request: RpcRequest = serde_json::from_str(&line).unwrap();
                assert_eq!(request.id, expected);
                expected += 1;
                let reply = format!(r#"{{"jsonrpc":"2.0","id":{},"result":{{}}}}"#, request.id);
                write.write_all(reply.as_bytes()).await.unwrap();
                write.write_all(b"\n").await.unwrap();
            }
        });

        let (read, write) = split(client_io);
        let client = RpcClient::new(read, write);
        for _ in 0..3 {
            client.call("test_connection", None).await.unwrap();
        }
    }
}
