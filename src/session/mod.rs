//! Sessions with running language servers
//!
//! A [`Session`] is an established connection to one server instance. The
//! dispatcher never creates or stores one; it asks a [`SessionProvider`] for
//! the session bound to the current document each time a command runs.

pub mod codec;
mod registry;
mod rpc;

pub use registry::SessionRegistry;
pub use rpc::RpcSession;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Document, Result};

/// An established connection to a language server
#[async_trait]
pub trait Session: Send + Sync {
    /// Logical id of the server this session talks to
    fn server_id(&self) -> &str;

    /// Send a request and wait for its result
    async fn send_request(&self, method: &str, params: Value) -> Result<Value>;

    /// Whether the connection can still carry requests
    fn is_alive(&self) -> bool {
        true
    }
}

/// Looks up the session bound to a document
///
/// Returning `None` is a normal outcome: the server may not be running yet,
/// or the document may not be one it serves.
pub trait SessionProvider: Send + Sync {
    /// Session for `document` registered under `server_id`, if any
    fn session_for(&self, document: &Document, server_id: &str) -> Option<Arc<dyn Session>>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for Arc<P> {
    fn session_for(&self, document: &Document, server_id: &str) -> Option<Arc<dyn Session>> {
        (**self).session_for(document, server_id)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Session that records every request and answers with `null`
    pub(crate) struct RecordingSession {
        server_id: String,
        alive: AtomicBool,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingSession {
        pub(crate) fn new(server_id: &str) -> Self {
            Self {
                server_id: server_id.to_string(),
                alive: AtomicBool::new(true),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn kill(&self) {
            self.alive.store(false, Ordering::SeqCst);
        }

        pub(crate) fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Session for RecordingSession {
        fn server_id(&self) -> &str {
            &self.server_id
        }

        async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            Ok(Value::Null)
        }

        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }
}
