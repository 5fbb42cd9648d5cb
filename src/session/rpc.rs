//! JSON-RPC session over an arbitrary byte stream
//!
//! [`RpcSession`] speaks LSP's base protocol over any `AsyncRead` /
//! `AsyncWrite` pair: a child process's stdio, a socket, or an in-memory
//! pipe in tests. Outbound messages are funneled through a single writer
//! task; a reader task routes responses back to their pending requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use lsp_types::notification::{DidOpenTextDocument, Exit, Initialized, Notification};
use lsp_types::request::{Initialize, Request, Shutdown};
use lsp_types::{
    ClientCapabilities, ClientInfo, DidOpenTextDocumentParams, InitializeParams, InitializeResult,
    InitializedParams, LogMessageParams, MessageType, ShowMessageParams, TextDocumentItem, Url,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use super::Session;
use super::codec::{read_message, write_message};
use crate::types::{ConnectorError, Result};

/// JSON-RPC error code for an unsupported method
const METHOD_NOT_FOUND: i64 = -32601;

type Pending = Arc<DashMap<i64, oneshot::Sender<Result<Value>>>>;

/// Work for the writer task, handled strictly in order
enum Outbound {
    Message(Value),
    /// Acknowledged once everything queued before it has been written
    Flush(oneshot::Sender<()>),
}

/// A live connection to one language server
pub struct RpcSession {
    server_id: String,
    next_id: AtomicI64,
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Pending,
    alive: Arc<AtomicBool>,
    tasks: [AbortHandle; 2],
}

impl RpcSession {
    /// Start a session reading server output from `reader` and writing to `writer`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R, W>(server_id: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server_id = server_id.into();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let pending: Pending = Arc::new(DashMap::new());
        let alive = Arc::new(AtomicBool::new(true));

        let writer_task = tokio::spawn(run_writer(
            server_id.clone(),
            writer,
            outbound_rx,
            Arc::clone(&pending),
            Arc::clone(&alive),
        ))
        .abort_handle();

        let reader_task = tokio::spawn(run_reader(
            server_id.clone(),
            BufReader::new(reader),
            outbound.clone(),
            Arc::clone(&pending),
            Arc::clone(&alive),
        ))
        .abort_handle();

        Self {
            server_id,
            next_id: AtomicI64::new(1),
            outbound,
            pending,
            alive,
            tasks: [writer_task, reader_task],
        }
    }

    /// Send a request and wait for the raw result
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        if !self.alive.load(Ordering::SeqCst) {
            self.pending.remove(&id);
            return Err(ConnectorError::SessionClosed);
        }

        let mut message = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if !params.is_null() {
            message["params"] = params;
        }

        log::debug!("[{}] -> {} (id {})", self.server_id, method, id);
        if self.outbound.send(Outbound::Message(message)).is_err() {
            self.pending.remove(&id);
            return Err(ConnectorError::SessionClosed);
        }

        rx.await.unwrap_or(Err(ConnectorError::SessionClosed))
    }

    /// Send a typed LSP request
    pub async fn request<R>(&self, params: R::Params) -> Result<R::Result>
    where
        R: Request,
        R::Params: Serialize,
        R::Result: DeserializeOwned,
    {
        let result = self.call(R::METHOD, serde_json::to_value(params)?).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a raw notification
    pub fn send_notification(&self, method: &str, params: Value) -> Result<()> {
        let mut message = json!({"jsonrpc": "2.0", "method": method});
        if !params.is_null() {
            message["params"] = params;
        }
        log::debug!("[{}] -> {}", self.server_id, method);
        self.outbound
            .send(Outbound::Message(message))
            .map_err(|_| ConnectorError::SessionClosed)
    }

    /// Wait until every message queued so far has been written to the transport
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.outbound
            .send(Outbound::Flush(tx))
            .map_err(|_| ConnectorError::SessionClosed)?;
        rx.await.map_err(|_| ConnectorError::SessionClosed)
    }

    /// Send a typed LSP notification
    pub fn notify<N>(&self, params: N::Params) -> Result<()>
    where
        N: Notification,
        N::Params: Serialize,
    {
        self.send_notification(N::METHOD, serde_json::to_value(params)?)
    }

    /// Perform the `initialize` / `initialized` handshake
    pub async fn initialize(&self, root_uri: Option<Url>) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri,
            capabilities: ClientCapabilities::default(),
            client_info: Some(ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        };
        let result = self.request::<Initialize>(params).await?;
        self.notify::<Initialized>(InitializedParams {})?;
        Ok(result)
    }

    /// Tell the server a document is open
    pub fn did_open(&self, uri: Url, language_id: &str, text: String) -> Result<()> {
        self.notify::<DidOpenTextDocument>(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id: language_id.to_string(),
                version: 1,
                text,
            },
        })
    }

    /// Ask the server to shut down, then tell it to exit
    ///
    /// Returns once the `exit` notification has been written, so the session
    /// can be dropped right after.
    pub async fn shutdown(&self) -> Result<()> {
        self.request::<Shutdown>(()).await?;
        self.notify::<Exit>(())?;
        self.flush().await
    }
}

impl Drop for RpcSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl Session for RpcSession {
    fn server_id(&self) -> &str {
        &self.server_id
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        self.call(method, params).await
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Mark the session dead and fail every request still waiting
fn close(pending: &Pending, alive: &AtomicBool) {
    alive.store(false, Ordering::SeqCst);
    let ids: Vec<i64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(ConnectorError::SessionClosed));
        }
    }
}

async fn run_writer<W>(
    server_id: String,
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    pending: Pending,
    alive: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(next) = outbound.recv().await {
        match next {
            Outbound::Message(message) => {
                if let Err(e) = write_message(&mut writer, &message).await {
                    log::error!("[{}] write failed, closing session: {}", server_id, e);
                    close(&pending, &alive);
                    return;
                }
            }
            Outbound::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn run_reader<R>(
    server_id: String,
    mut reader: BufReader<R>,
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Pending,
    alive: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => handle_inbound(&server_id, message, &outbound, &pending),
            Ok(None) => {
                log::debug!("[{}] server closed the connection", server_id);
                break;
            }
            Err(e) => {
                log::error!("[{}] read failed, closing session: {}", server_id, e);
                break;
            }
        }
    }
    close(&pending, &alive);
}

fn handle_inbound(
    server_id: &str,
    message: Value,
    outbound: &mpsc::UnboundedSender<Outbound>,
    pending: &Pending,
) {
    let id = message.get("id").cloned();
    let method = message
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_owned);

    match (method.as_deref(), id) {
        (None, Some(id)) => {
            let Some(id) = id.as_i64() else {
                log::warn!("[{}] response with unexpected id {}", server_id, id);
                return;
            };
            let Some((_, tx)) = pending.remove(&id) else {
                log::warn!("[{}] response for unknown request {}", server_id, id);
                return;
            };
            let _ = tx.send(response_result(message));
        }
        (Some(method), Some(id)) => {
            log::warn!("[{}] unsupported server request: {}", server_id, method);
            let reply = json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": METHOD_NOT_FOUND, "message": format!("Method not found: {}", method)},
            });
            let _ = outbound.send(Outbound::Message(reply));
        }
        (Some(method), None) => {
            handle_notification(server_id, method, message.get("params").cloned())
        }
        (None, None) => log::warn!("[{}] ignoring malformed message", server_id),
    }
}

fn response_result(mut message: Value) -> Result<Value> {
    if let Some(error) = message.get("error") {
        return Err(ConnectorError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            data: error.get("data").cloned(),
        });
    }
    Ok(message
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn handle_notification(server_id: &str, method: &str, params: Option<Value>) {
    let params = params.unwrap_or(Value::Null);
    let (typ, text) = match method {
        "window/logMessage" => match serde_json::from_value::<LogMessageParams>(params) {
            Ok(p) => (p.typ, p.message),
            Err(_) => return,
        },
        "window/showMessage" => match serde_json::from_value::<ShowMessageParams>(params) {
            Ok(p) => (p.typ, p.message),
            Err(_) => return,
        },
        other => {
            log::debug!("[{}] <- {}", server_id, other);
            return;
        }
    };

    match typ {
        MessageType::ERROR => log::error!("[{}] {}", server_id, text),
        MessageType::WARNING => log::warn!("[{}] {}", server_id, text),
        MessageType::INFO => log::info!("[{}] {}", server_id, text),
        _ => log::debug!("[{}] {}", server_id, text),
    }
}
