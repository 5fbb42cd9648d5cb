//! In-memory session registry
//!
//! Tracks which server sessions exist and which documents are attached to
//! each. This is the lookup table behind [`SessionProvider`].

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Session, SessionProvider};
use crate::config::Selector;
use crate::types::{Document, DocumentId};

struct Binding {
    session: Arc<dyn Session>,
    selector: Selector,
    documents: HashSet<DocumentId>,
}

/// Sessions keyed by server id, with the documents attached to each
#[derive(Default)]
pub struct SessionRegistry {
    entries: DashMap<String, Binding>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` under its server id, replacing any previous one
    ///
    /// Documents attached to a replaced session stay attached.
    pub fn register(&self, session: Arc<dyn Session>, selector: Selector) {
        let server_id = session.server_id().to_string();
        log::debug!("registering session '{}' for '{}'", server_id, selector);

        match self.entries.entry(server_id) {
            Entry::Occupied(mut occupied) => {
                let binding = occupied.get_mut();
                binding.session = session;
                binding.selector = selector;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Binding {
                    session,
                    selector,
                    documents: HashSet::new(),
                });
            }
        }
    }

    /// Drop the session registered under `server_id`
    pub fn unregister(&self, server_id: &str) -> Option<Arc<dyn Session>> {
        self.entries.remove(server_id).map(|(_, entry)| entry.session)
    }

    /// Attach a document to a session if the session's selector accepts it
    pub fn attach(&self, server_id: &str, document: &Document) -> bool {
        let Some(mut entry) = self.entries.get_mut(server_id) else {
            return false;
        };
        if !entry.selector.matches(document.scope()) {
            log::debug!(
                "document {} ({}) not served by '{}'",
                document.id(),
                document.scope(),
                server_id
            );
            return false;
        }
        entry.documents.insert(document.id());
        true
    }

    /// Detach a document from every session
    pub fn detach(&self, document: DocumentId) {
        for mut entry in self.entries.iter_mut() {
            entry.documents.remove(&document);
        }
    }

    /// Documents attached to a session
    pub fn documents(&self, server_id: &str) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self
            .entries
            .get(server_id)
            .map(|entry| entry.documents.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Registered server ids
    pub fn server_ids(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl SessionProvider for SessionRegistry {
    fn session_for(&self, document: &Document, server_id: &str) -> Option<Arc<dyn Session>> {
        let entry = self.entries.get(server_id)?;
        if !entry.documents.contains(&document.id()) || !entry.session.is_alive() {
            return None;
        }
        Some(Arc::clone(&entry.session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::RecordingSession;
    use url::Url;

    fn markdown_doc(id: u64) -> Document {
        Document::new(
            DocumentId(id),
            Url::parse(&format!("file:///tmp/doc{id}.md")).unwrap(),
            "source.markdown",
        )
    }

    fn registry_with(server_id: &str) -> (SessionRegistry, Arc<RecordingSession>) {
        let registry = SessionRegistry::new();
        let session = Arc::new(RecordingSession::new(server_id));
        registry.register(session.clone(), Selector::parse("source.markdown").unwrap());
        (registry, session)
    }

    #[test]
    fn test_resolves_attached_document() {
        let (registry, _session) = registry_with("universal-connector");
        let doc = markdown_doc(1);

        assert!(registry.attach("universal-connector", &doc));
        let found = registry.session_for(&doc, "universal-connector").unwrap();
        assert_eq!(found.server_id(), "universal-connector");
    }

    #[test]
    fn test_unattached_document_has_no_session() {
        let (registry, _session) = registry_with("universal-connector");
        assert!(registry.session_for(&markdown_doc(1), "universal-connector").is_none());
    }

    #[test]
    fn test_mismatched_server_id() {
        let (registry, _session) = registry_with("other-server");
        let doc = markdown_doc(1);
        assert!(registry.attach("other-server", &doc));

        assert!(registry.session_for(&doc, "universal-connector").is_none());
        assert!(registry.session_for(&doc, "other-server").is_some());
    }

    #[test]
    fn test_attach_respects_selector() {
        let (registry, _session) = registry_with("universal-connector");
        let doc = Document::unsaved(DocumentId(9), "source.python");

        assert!(!registry.attach("universal-connector", &doc));
        assert!(!registry.attach("missing", &markdown_doc(2)));
        assert!(registry.documents("universal-connector").is_empty());
    }

    #[test]
    fn test_unsaved_document_can_attach() {
        let (registry, _session) = registry_with("universal-connector");
        let doc = Document::unsaved(DocumentId(3), "source.markdown");

        assert!(registry.attach("universal-connector", &doc));
        assert!(registry.session_for(&doc, "universal-connector").is_some());
    }

    #[test]
    fn test_dead_session_is_not_returned() {
        let (registry, session) = registry_with("universal-connector");
        let doc = markdown_doc(1);
        registry.attach("universal-connector", &doc);

        session.kill();
        assert!(registry.session_for(&doc, "universal-connector").is_none());
    }

    #[test]
    fn test_detach_and_unregister() {
        let (registry, _session) = registry_with("universal-connector");
        let doc = markdown_doc(1);
        registry.attach("universal-connector", &doc);
        registry.attach("universal-connector", &markdown_doc(2));
        assert_eq!(
            registry.documents("universal-connector"),
            vec![DocumentId(1), DocumentId(2)]
        );

        registry.detach(doc.id());
        assert!(registry.session_for(&doc, "universal-connector").is_none());

        assert!(registry.unregister("universal-connector").is_some());
        assert!(registry.server_ids().is_empty());
    }

    #[test]
    fn test_reregister_keeps_documents() {
        let (registry, _old) = registry_with("universal-connector");
        let doc = markdown_doc(1);
        registry.attach("universal-connector", &doc);

        let replacement = Arc::new(RecordingSession::new("universal-connector"));
        registry.register(replacement, Selector::parse("source.markdown").unwrap());

        assert!(registry.session_for(&doc, "universal-connector").is_some());
    }

    #[test]
    fn test_reregister_swaps_session_and_selector() {
        let (registry, old) = registry_with("universal-connector");
        let doc = markdown_doc(1);
        registry.attach("universal-connector", &doc);
        old.kill();

        let replacement = Arc::new(RecordingSession::new("universal-connector"));
        registry.register(replacement, Selector::parse("text.html").unwrap());

        assert!(registry.session_for(&doc, "universal-connector").unwrap().is_alive());
        assert!(!registry.attach("universal-connector", &markdown_doc(2)));
        assert!(registry.attach(
            "universal-connector",
            &Document::unsaved(DocumentId(3), "text.html.basic")
        ));
    }

    #[test]
    fn test_reregister_never_hides_the_session() {
        let (registry, _session) = registry_with("universal-connector");
        let doc = markdown_doc(1);
        registry.attach("universal-connector", &doc);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..500 {
                    let session = Arc::new(RecordingSession::new("universal-connector"));
                    registry.register(session, Selector::parse("source.markdown").unwrap());
                }
            });
            for _ in 0..500 {
                assert!(registry.session_for(&doc, "universal-connector").is_some());
            }
        });
    }
}
