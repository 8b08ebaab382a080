//! Background work: where async tasks run and where their results land.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Single-slot mailbox for a task result.
///
/// Writing replaces any value nobody has taken yet, so when several tasks
/// race, the one that finishes last is the one that is seen.
pub struct OutcomeCell<T>(Arc<Mutex<Option<T>>>);

impl<T> OutcomeCell<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    /// Store `value`, returning the unread value it displaced, if any.
    pub fn put(&self, value: T) -> Option<T> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl<T> Clone for OutcomeCell<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for OutcomeCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mailbox that keeps every result, in arrival order.
pub struct OutcomeQueue<T>(Arc<Mutex<Vec<T>>>);

impl<T> OutcomeQueue<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn push(&self, value: T) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Everything delivered since the last drain, oldest first.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T> Clone for OutcomeQueue<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for OutcomeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs futures off the UI frame loop: a tokio runtime on native, the
/// browser's microtask queue on the web.
pub struct Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
}

#[cfg(not(target_arch = "wasm32"))]
impl Spawner {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("bg-remover-net")
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future);
    }
}

#[cfg(target_arch = "wasm32")]
impl Spawner {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        wasm_bindgen_futures::spawn_local(future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_replaces_unread_value() {
        let cell = OutcomeCell::new();
        assert_eq!(cell.put(1), None);
        assert_eq!(cell.put(2), Some(1));
        assert_eq!(cell.take(), Some(2));
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn clones_share_the_slot() {
        let cell = OutcomeCell::new();
        let writer = cell.clone();
        std::thread::spawn(move || {
            writer.put("done");
        })
        .join()
        .unwrap();
        assert_eq!(cell.take(), Some("done"));
    }

    #[test]
    fn queue_keeps_every_result_in_order() {
        let queue = OutcomeQueue::new();
        let writer = queue.clone();
        writer.push("first");
        writer.push("second");
        assert_eq!(queue.drain(), vec!["first", "second"]);
        assert!(queue.drain().is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn spawned_task_reports_into_cell() {
        let spawner = Spawner::new().unwrap();
        let cell = OutcomeCell::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let writer = cell.clone();
        spawner.spawn(async move {
            writer.put(42);
            let _ = tx.send(());
        });
        rx.recv().unwrap();
        assert_eq!(cell.take(), Some(42));
    }
}
