//! Single-value cache slots.

use tokio::sync::watch;

/// One cached value, overwritten by every successful fetch.
///
/// There is no keying, eviction or ordering: when two fetches of the same kind
/// race, whichever response is written last wins.
#[derive(Debug)]
pub struct Slot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn is_set(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.tx.borrow().as_ref())
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> Option<T> {
        (*self.tx.borrow()).clone()
    }

    /// Resolve once the slot holds a value (immediately if it already does).
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            let current = (*rx.borrow_and_update()).clone();
            if let Some(value) = current {
                return value;
            }
            // The sender lives in `self`, so the channel cannot close while we wait.
            let _ = rx.changed().await;
        }
    }
}
