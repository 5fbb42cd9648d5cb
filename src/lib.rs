//! # Universal Connector
//!
//! Editor-side bridge to the Universal Language Connector language server.
//!
//! The server does all of the conversion work. This crate resolves the
//! session bound to the active document and forwards the editor's
//! "Convert To HTML" / "Convert To Markdown" commands to it as
//! `workspace/executeCommand` requests.
//!
//! ## Pieces
//!
//! - [`ServerConfig`]: how to launch the server and which documents it serves
//! - [`SessionProvider`]: looks up the session bound to a document
//! - [`SessionRegistry`]: an in-memory [`SessionProvider`]
//! - [`RpcSession`]: a JSON-RPC session over any byte stream
//! - [`CommandDispatcher`]: resolves a session and sends the command
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use universal_connector::{
//!     CommandDispatcher, ConvertCommand, Document, DocumentId, RpcSession, ServerConfig,
//!     SessionRegistry, DEFAULT_SERVER_ID,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let mut child = tokio::process::Command::new(&config.command[0])
//!     .stdin(std::process::Stdio::piped())
//!     .stdout(std::process::Stdio::piped())
//!     .kill_on_drop(true)
//!     .spawn()?;
//! let stdout = child.stdout.take().ok_or("no stdout")?;
//! let stdin = child.stdin.take().ok_or("no stdin")?;
//!
//! let session = Arc::new(RpcSession::new(DEFAULT_SERVER_ID, stdout, stdin));
//! session.initialize(None).await?;
//!
//! let registry = Arc::new(SessionRegistry::new());
//! registry.register(session, config.selector.clone());
//!
//! let document = Document::from_path(DocumentId(1), "/tmp/notes.md", "source.markdown")?;
//! registry.attach(DEFAULT_SERVER_ID, &document);
//!
//! let dispatcher = CommandDispatcher::new(registry, DEFAULT_SERVER_ID);
//! let _ = dispatcher.run(ConvertCommand::ToHtml, &document);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod session;
pub mod types;

// Re-export main types and functions
pub use config::{DEFAULT_SERVER_ID, LanguageConfig, Selector, ServerConfig};
pub use dispatch::{CommandDispatcher, PendingResult, dispatch, dispatch_with_result};
pub use session::{RpcSession, Session, SessionProvider, SessionRegistry};
pub use types::{
    CommandRequest, ConnectorError, ConversionOutput, ConvertCommand, Document, DocumentId, Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
