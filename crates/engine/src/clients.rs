use crate::messages::ClientMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// One attached foreground context, as seen by the engine.
#[derive(Clone)]
pub struct ClientHandle {
    pub id: u64,
    pub url: String,
    sender: UnboundedSender<ClientMessage>,
}

impl ClientHandle {
    /// Fire-and-forget send. Returns whether the context was still
    /// listening; a dropped receiver is not an error, the next poll
    /// cycle falls back to the store.
    pub fn post_message(&self, message: ClientMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// Registry of live foreground contexts: what windows exist, and how to
/// focus or open one. The real window manager is a collaborator outside
/// this core; the engine only consumes this interface.
#[async_trait::async_trait]
pub trait IContextRegistry: Send + Sync {
    async fn attach(&self, url: String, sender: UnboundedSender<ClientMessage>) -> u64;
    async fn detach(&self, client_id: u64);
    /// All attached contexts still able to receive messages, in
    /// attach order.
    async fn match_all(&self) -> Vec<ClientHandle>;
    async fn focus(&self, client_id: u64) -> bool;
    async fn open_window(&self, url: &str) -> bool;
}

/// In-process registry backing the daemon and the tests. Focus and
/// open requests are recorded so callers can observe click handling.
pub struct InProcessContextRegistry {
    clients: Mutex<Vec<ClientHandle>>,
    next_id: AtomicU64,
    focus_log: Mutex<Vec<u64>>,
    open_log: Mutex<Vec<String>>,
}

impl InProcessContextRegistry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            focus_log: Mutex::new(Vec::new()),
            open_log: Mutex::new(Vec::new()),
        }
    }

    pub fn focused(&self) -> Vec<u64> {
        self.focus_log.lock().unwrap().clone()
    }

    pub fn opened_windows(&self) -> Vec<String> {
        self.open_log.lock().unwrap().clone()
    }
}

impl Default for InProcessContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IContextRegistry for InProcessContextRegistry {
    async fn attach(&self, url: String, sender: UnboundedSender<ClientMessage>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut clients = self.clients.lock().unwrap();
        clients.push(ClientHandle { id, url, sender });
        debug!("Foreground context {} attached", id);
        id
    }

    async fn detach(&self, client_id: u64) {
        let mut clients = self.clients.lock().unwrap();
        clients.retain(|c| c.id != client_id);
        debug!("Foreground context {} detached", client_id);
    }

    async fn match_all(&self) -> Vec<ClientHandle> {
        let mut clients = self.clients.lock().unwrap();
        // A context that died without detaching must not keep showing
        // up as attached, or the engine would delegate to it forever.
        clients.retain(|c| !c.sender.is_closed());
        clients.clone()
    }

    async fn focus(&self, client_id: u64) -> bool {
        let clients = self.clients.lock().unwrap();
        if clients.iter().any(|c| c.id == client_id) {
            self.focus_log.lock().unwrap().push(client_id);
            true
        } else {
            false
        }
    }

    async fn open_window(&self, url: &str) -> bool {
        self.open_log.lock().unwrap().push(url.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn attach_and_detach_update_the_client_list() {
        let registry = InProcessContextRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = registry.attach("/".into(), tx).await;
        assert_eq!(registry.match_all().await.len(), 1);

        registry.detach(id).await;
        assert!(registry.match_all().await.is_empty());
    }

    #[tokio::test]
    async fn focus_fails_for_unknown_contexts() {
        let registry = InProcessContextRegistry::new();
        assert!(!registry.focus(42).await);
        assert!(registry.focused().is_empty());
    }

    #[tokio::test]
    async fn posting_to_a_closed_context_reports_failure() {
        let registry = InProcessContextRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.attach("/".into(), tx).await;

        let clients = registry.match_all().await;
        drop(rx);
        assert!(!clients[0].post_message(ClientMessage::RequestSchedules));
    }

    #[tokio::test]
    async fn dead_contexts_are_dropped_from_match_all() {
        let registry = InProcessContextRegistry::new();
        let (live_tx, _live_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let live_id = registry.attach("/".into(), live_tx).await;
        registry.attach("/".into(), dead_tx).await;
        drop(dead_rx);

        let clients = registry.match_all().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, live_id);
    }
}
