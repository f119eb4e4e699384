use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::handler::RecordHandler;
use crate::record::Record;
use crate::sink::OutputSink;

/// A sink or handler that outlives a single submission task.
pub struct Shared<T: ?Sized> {
    inner: Arc<Mutex<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }
}

impl<T: ?Sized> Shared<T> {
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Shared<T> {
    fn clear(&mut self) {
        self.lock().clear();
    }

    fn append(&mut self, text: &str) {
        self.lock().append(text);
    }

    fn scroll_to_end(&mut self) {
        self.lock().scroll_to_end();
    }
}

impl<T: RecordHandler + ?Sized> RecordHandler for Shared<T> {
    fn handle(&mut self, record: &Record) {
        self.lock().handle(record);
    }
}

/// Access to a shared sink or handler that expires once a newer submission
/// of the same form starts.
///
/// The generation is compared while the lock is held, so a superseded task
/// can never interleave output with its replacement.
pub struct Guarded<T: ?Sized> {
    target: Shared<T>,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl<T: ?Sized> Guarded<T> {
    pub fn new(target: Shared<T>, current: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            target,
            current,
            generation,
        }
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.target.lock();
        if !self.is_current() {
            return None;
        }
        Some(f(&mut *guard))
    }
}

impl<T: ?Sized> Clone for Guarded<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            current: Arc::clone(&self.current),
            generation: self.generation,
        }
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Guarded<T> {
    fn clear(&mut self) {
        self.with(|sink| sink.clear());
    }

    fn append(&mut self, text: &str) {
        self.with(|sink| sink.append(text));
    }

    fn scroll_to_end(&mut self) {
        self.with(|sink| sink.scroll_to_end());
    }
}

impl<T: RecordHandler + ?Sized> RecordHandler for Guarded<T> {
    fn handle(&mut self, record: &Record) {
        self.with(|handler| handler.handle(record));
    }
}
