//! Download progress as seen by a presentation layer.
//!
//! [`ProgressModel`] is a bounded range fixed at `0..=100`. Outside this crate
//! it can only be read and observed; the fetcher drives it through the
//! crate-private mutation methods. Observers are called synchronously, in
//! registration order, on the task doing the download, so an observer that
//! touches UI state has to hand the value over to its own thread.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const MINIMUM: u8 = 0;
pub const MAXIMUM: u8 = 100;

/// Receives every change of the download percentage.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: u8);
}

impl<F> ProgressObserver for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        self(percent)
    }
}

/// Handle returned by [`ProgressModel::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observers = Vec<(ObserverId, Arc<dyn ProgressObserver>)>;

#[derive(Default)]
pub struct ProgressModel {
    value: AtomicU8,
    next_id: AtomicU64,
    observers: Mutex<Observers>,
}

impl ProgressModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: impl ProgressObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<dyn ProgressObserver> = Arc::new(observer);
        self.observers().push((id, observer));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    pub fn minimum(&self) -> u8 {
        MINIMUM
    }

    pub fn maximum(&self) -> u8 {
        MAXIMUM
    }

    /// The value never changes in a way a slider would call "adjusting".
    pub fn is_adjusting(&self) -> bool {
        false
    }

    /// Resets to zero for a new transfer without notifying anyone.
    pub(crate) fn begin(&self) {
        self.value.store(MINIMUM, Ordering::Release);
    }

    /// Records `written` of `total` bytes.
    ///
    /// Only values below the maximum are published here; reaching 100 is
    /// left to [`complete`](Self::complete) so it is announced exactly once.
    /// `total` must be non-zero.
    pub(crate) fn advance(&self, written: u64, total: u64) {
        let percent = written.saturating_mul(100) / total;
        if percent >= u64::from(MAXIMUM) {
            return;
        }

        let percent = percent as u8;
        if self.value.swap(percent, Ordering::AcqRel) != percent {
            self.notify(percent);
        }
    }

    /// Forces the maximum and publishes it unconditionally.
    pub(crate) fn complete(&self) {
        self.value.store(MAXIMUM, Ordering::Release);
        self.notify(MAXIMUM);
    }

    fn notify(&self, percent: u8) {
        // Snapshot so observers may (un)register from inside the callback.
        let observers: Vec<_> = self
            .observers()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer.on_progress(percent);
        }
    }

    fn observers(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProgressModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressModel")
            .field("value", &self.value())
            .field("observers", &self.observers().len())
            .finish()
    }
}
