use crate::coordinator::outcome::RefreshOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked after every completed refresh attempt.
pub type Listener = Arc<dyn Fn(&RefreshOutcome) + Send + Sync>;

/// Handle returned by [`Coordinator::subscribe`](crate::Coordinator::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Registered listeners, kept in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener)>>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Calls every listener in registration order.
    ///
    /// The list stays locked while listeners run, so once `unsubscribe` or `clear`
    /// returns no removed listener is called again. A listener therefore must not call
    /// `subscribe`, `unsubscribe` or `Coordinator::close` on the same coordinator; each
    /// of them waits for this lock and would deadlock.
    pub(crate) fn notify(&self, outcome: &RefreshOutcome) {
        for (_, listener) in self.lock().iter() {
            listener(outcome);
        }
    }
}
