use tokio::sync::broadcast;

/// Per-handler view of the server-wide shutdown signal.
///
/// Each Connection Handler holds one of these and selects on `recv` at its
/// blocking read boundary; once the signal has been observed, `is_shutdown`
/// stays true so the handler's loop condition can exit without polling the
/// channel again.
pub struct Shutdown {
    is_shutdown: bool,
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            is_shutdown: false,
            notify,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    pub async fn recv(&mut self) {
        if self.is_shutdown {
            return;
        }

        // A RecvError means the sender side was dropped, which is also a
        // shutdown notification.
        let _ = self.notify.recv().await;

        self.is_shutdown = true;
    }
}
