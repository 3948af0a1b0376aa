//! Cooperative shutdown signal shared by all nodes.

use tokio::sync::watch;

/// Create a connected trigger/listener pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn listener(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listens for the shutdown signal. Clone one per node.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Resolves once shutdown is triggered or the trigger is dropped.
    pub async fn wait(&mut self) {
        // An Err means the trigger is gone, which also ends the run.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
