//! Graceful shutdown of the API server.

use tokio::sync::broadcast;

/// Cloneable shutdown switch shared by the signal task and the server.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Resolves once [`trigger`](Self::trigger) is called after this
    /// future was created. A closed channel counts as a trigger.
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        // no subscribers yet is fine
        let _ = self.tx.send(());
    }

    /// Tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
