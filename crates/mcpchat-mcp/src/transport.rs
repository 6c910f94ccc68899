//! Stdio transport for MCP server communication.
//!
//! The child's stdout carries newline-delimited JSON-RPC; its stderr is
//! forwarded line by line to the log at debug level.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// How long a server gets to exit after its stdin is closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Async stdio transport for one MCP server process.
pub(crate) struct StdioTransport {
    server: String,
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
    child: Arc<Mutex<Child>>,
    timeout_ms: u64,
}

impl StdioTransport {
    /// Spawn the server process and start its background I/O tasks.
    pub(crate) fn spawn(server: &str, config: &McpServerConfig) -> Result<Self, McpError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::SpawnFailed {
                name: server.to_string(),
                source: e,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpError::Protocol(format!(
                "MCP server '{server}' has no piped stdio"
            )));
        };
        let stderr = child.stderr.take();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = Vec::with_capacity(3);

        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        tasks.push(tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                let line = msg + "\n";
                if stdin.write_all(line.as_bytes()).await.is_err() || stdin.flush().await.is_err()
                {
                    break;
                }
            }
        }));

        let closed = Arc::new(AtomicBool::new(false));
        let reader_closed = Arc::clone(&closed);
        let reader_pending = Arc::clone(&pending);
        let reader_server = server.to_string();
        tasks.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let msg: JsonRpcResponse = match serde_json::from_str(&line) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("[{reader_server}] unparseable MCP message: {e}: {line}");
                        continue;
                    }
                };
                match (msg.id, msg.method.as_deref()) {
                    (Some(id), None) => {
                        if let Some(tx) = reader_pending.lock().await.remove(&id) {
                            let _ = tx.send(msg);
                        }
                    }
                    (_, Some(method)) => {
                        tracing::trace!("[{reader_server}] ignoring server message: {method}");
                    }
                    (None, None) => {
                        tracing::warn!("[{reader_server}] MCP message without id or method");
                    }
                }
            }
            // Server went away: fail every request still waiting
            reader_closed.store(true, Ordering::SeqCst);
            reader_pending.lock().await.clear();
        }));

        if let Some(stderr) = stderr {
            let stderr_server = server.to_string();
            tasks.push(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!("[{stderr_server}] {line}");
                }
            }));
        }

        Ok(Self {
            server: server.to_string(),
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            closed,
            tasks,
            child: Arc::new(Mutex::new(child)),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Send a request and wait for the matching response.
    pub(crate) async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if self.closed.load(Ordering::SeqCst) || self.write_tx.send(serialized).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(self.not_running());
        }

        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(self.not_running()),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(McpError::Timeout {
                    name: self.server.clone(),
                    method: method.to_string(),
                    timeout_ms: self.timeout_ms,
                })
            }
        }
    }

    /// Send a notification (fire-and-forget).
    pub(crate) async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let serialized = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| self.not_running())
    }

    fn not_running(&self) -> McpError {
        McpError::ServerNotRunning {
            name: self.server.clone(),
        }
    }

    /// Close stdin, give the child a grace period, then kill it.
    pub(crate) async fn shutdown(self) {
        drop(self.write_tx);

        let graceful = tokio::time::timeout(SHUTDOWN_GRACE, async {
            let _ = self.child.lock().await.wait().await;
        })
        .await;

        if graceful.is_err() {
            tracing::debug!("MCP server '{}' did not exit, killing it", self.server);
            let _ = self.child.lock().await.kill().await;
        }

        for task in self.tasks {
            task.abort();
        }
    }
}
