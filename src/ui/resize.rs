//! Resize notification
//!
//! A [`ResizeHub`] holds the last confirmed terminal size and the callbacks
//! subscribed to size changes. Resizes can be confirmed from any thread (the
//! SIGWINCH watcher, the input reader); callbacks fire once per actual change
//! and run outside the hub's lock.
//!
//! One thread delivers at a time. A change confirmed while a delivery is
//! running is handed to the delivering thread, which keeps going until
//! subscribers have seen the current size, so the last size a subscriber
//! hears is always the hub's size.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::core::Size;

/// Callback invoked with the new `(columns, rows)`
///
/// Runs on the thread delivering the resize; it must not block.
pub type ResizeCallback = Arc<dyn Fn(u16, u16) + Send + Sync>;

/// Opaque subscription handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResizeHandle(u64);

/// A resize callback carried by configuration
#[derive(Clone)]
pub struct ResizeListener(pub(crate) ResizeCallback);

impl ResizeListener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }
}

impl fmt::Debug for ResizeListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResizeListener(..)")
    }
}

struct HubState {
    size: Size,
    subscribers: Vec<(ResizeHandle, ResizeCallback)>,
    /// Some thread is running callbacks
    delivering: bool,
}

/// Releases the delivery role if a callback panics
struct Delivery<'a> {
    hub: &'a ResizeHub,
    finished: bool,
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.hub.lock().delivering = false;
        }
    }
}

/// Shared resize state; clones refer to the same hub
#[derive(Clone)]
pub struct ResizeHub {
    state: Arc<Mutex<HubState>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for ResizeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ResizeHub")
            .field("size", &state.size)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl ResizeHub {
    pub fn new(size: Size) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                size,
                subscribers: Vec::new(),
                delivering: false,
            })),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // A panicking callback never holds the lock, so poisoning leaves
        // the state consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Last confirmed size
    pub fn size(&self) -> Size {
        self.lock().size
    }

    pub fn subscribe<F>(&self, callback: F) -> ResizeHandle
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
    {
        self.subscribe_shared(Arc::new(callback))
    }

    pub fn subscribe_shared(&self, callback: ResizeCallback) -> ResizeHandle {
        let handle = ResizeHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().subscribers.push((handle, callback));
        handle
    }

    /// Remove a subscription; false if the handle was not registered
    pub fn unsubscribe(&self, handle: ResizeHandle) -> bool {
        let mut state = self.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(h, _)| *h != handle);
        state.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Record a reported size and notify subscribers if it changed
    ///
    /// Returns whether the size changed. When another delivery is running
    /// (on another thread, or from inside a callback) the callbacks for this
    /// change run there, after the current batch.
    pub fn confirm(&self, size: Size) -> bool {
        let mut state = self.lock();
        if state.size == size {
            return false;
        }
        state.size = size;
        if state.delivering {
            debug!("Resize confirmed: {} (queued behind running delivery)", size);
            return true;
        }
        state.delivering = true;
        let mut delivery = Delivery {
            hub: self,
            finished: false,
        };

        loop {
            let size = state.size;
            let callbacks: Vec<ResizeCallback> =
                state.subscribers.iter().map(|(_, cb)| cb.clone()).collect();
            drop(state);

            debug!("Resize confirmed: {} ({} subscribers)", size, callbacks.len());
            for callback in callbacks {
                callback(size.cols, size.rows);
            }

            state = self.lock();
            if state.size == size {
                state.delivering = false;
                delivery.finished = true;
                return true;
            }
        }
    }
}
