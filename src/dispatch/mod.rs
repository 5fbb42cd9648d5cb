//! Command dispatch
//!
//! Turns an editor command invocation into a `workspace/executeCommand`
//! request on the session bound to the active document. When no session is
//! bound the invocation is a silent no-op.
//!
//! # Example
//!
//! ```ignore
//! # use std::sync::Arc;
//! # use universal_connector::{CommandDispatcher, ConvertCommand, SessionRegistry};
//! # fn run(registry: Arc<SessionRegistry>, document: universal_connector::Document) {
//! let dispatcher = CommandDispatcher::new(registry, "universal-connector");
//!
//! // Fire and forget; `None` means no session was bound to the document.
//! let _ = dispatcher.run(ConvertCommand::ToHtml, &document);
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use lsp_types::request::{ExecuteCommand, Request};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::session::{Session, SessionProvider};
use crate::types::{CommandRequest, ConnectorError, ConvertCommand, Document, Result};

/// Forwards conversion commands to the server bound to a document
pub struct CommandDispatcher<P> {
    provider: P,
    server_id: String,
}

impl<P: SessionProvider> CommandDispatcher<P> {
    /// Create a dispatcher resolving sessions registered under `server_id`
    pub fn new(provider: P, server_id: impl Into<String>) -> Self {
        Self {
            provider,
            server_id: server_id.into(),
        }
    }

    /// Server id sessions are resolved under
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Session bound to `document`, if any
    pub fn resolve(&self, document: &Document) -> Option<Arc<dyn Session>> {
        self.provider.session_for(document, &self.server_id)
    }

    /// Run `command` against `document` without waiting for the reply
    ///
    /// Returns `None` and sends nothing when no session is bound to the
    /// document. Otherwise the request is sent in the background and the
    /// reply, success or failure, is discarded; dropping the returned handle
    /// does not cancel it.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime when a session is bound,
    /// since the request is spawned onto it.
    pub fn run(&self, command: ConvertCommand, document: &Document) -> Option<JoinHandle<()>> {
        let Some(session) = self.resolve(document) else {
            log::debug!(
                "no '{}' session for document {}, skipping {}",
                self.server_id,
                document.id(),
                command
            );
            return None;
        };
        Some(dispatch(session, command, document.locator()))
    }

    /// Run `command` against `document` and surface the server's reply
    ///
    /// Like [`run`](Self::run) the request is sent in the background; the
    /// returned [`PendingResult`] resolves once the server answers.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime when a session is bound.
    pub fn run_with_result(&self, command: ConvertCommand, document: &Document) -> Option<PendingResult> {
        let session = self.resolve(document)?;
        Some(dispatch_with_result(session, command, document.locator()))
    }
}

/// Send `command` for `locator` over `session` in the background, discarding the reply
///
/// Must be called from within a tokio runtime.
pub fn dispatch(session: Arc<dyn Session>, command: ConvertCommand, locator: String) -> JoinHandle<()> {
    let request = CommandRequest::new(command, locator);
    tokio::spawn(async move {
        if let Err(e) = execute(session.as_ref(), request).await {
            log::debug!("[{}] {} failed: {}", session.server_id(), command, e);
        }
    })
}

/// Send `command` for `locator` over `session` in the background, keeping the reply
///
/// Must be called from within a tokio runtime.
pub fn dispatch_with_result(session: Arc<dyn Session>, command: ConvertCommand, locator: String) -> PendingResult {
    let request = CommandRequest::new(command, locator);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(execute(session.as_ref(), request).await);
    });
    PendingResult { rx }
}

async fn execute(session: &dyn Session, request: CommandRequest) -> Result<Option<Value>> {
    log::debug!(
        "[{}] executing {} on '{}'",
        session.server_id(),
        request.command(),
        request.locator()
    );
    let params = serde_json::to_value(request.into_params())?;
    let result = session.send_request(ExecuteCommand::METHOD, params).await?;
    Ok(match result {
        Value::Null => None,
        value => Some(value),
    })
}

/// The eventual reply to a dispatched command
///
/// Resolves to the server's result, `None` when it returned `null`.
#[must_use = "use `CommandDispatcher::run` when the reply is not needed"]
pub struct PendingResult {
    rx: oneshot::Receiver<Result<Option<Value>>>,
}

impl Future for PendingResult {
    type Output = Result<Option<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ConnectorError::SessionClosed)))
    }
}
