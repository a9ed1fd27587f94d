//! Direct-connection observer signals.
//!
//! A [`Signal<Args>`] holds a set of connected slots and calls every one of
//! them, on the emitting thread, each time it is emitted. Widgets use it to
//! announce that they were closed and progress indicators use it to publish
//! value changes.
//!
//! # Example
//!
//! ```
//! use termdash_core::Signal;
//!
//! let value_changed = Signal::<f64>::new();
//! let id = value_changed.connect(|value| println!("now at {value}"));
//! value_changed.emit(42.0);
//! assert!(value_changed.disconnect(id));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// Slots are invoked without the connection lock held, so a slot may connect
/// or disconnect slots on the same signal. Such changes take effect from the
/// next emission.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a slot. Returns `false` if the id was unknown.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect every slot.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Temporarily suppress emissions.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::Release);
    }

    /// Returns `true` if emissions are suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Call every connected slot with `args`.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "termdash_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: "termdash_core::signal", connection_count = slots.len(), "emitting signal");
        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn test_emit_reaches_all_slots() {
        let signal = Signal::<i32>::new();
        let total = Arc::new(AtomicI32::new(0));

        for _ in 0..3 {
            let total = total.clone();
            signal.connect(move |v| {
                total.fetch_add(*v, Ordering::SeqCst);
            });
        }

        signal.emit(5);
        assert_eq!(total.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicI32::new(0));
        let counter = hits.clone();
        let id = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_blocked_signal() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicI32::new(0));
        let counter = hits.clone();
        signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        signal.emit(());
        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_may_disconnect_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let weak = Arc::downgrade(&signal);
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                signal.disconnect_all();
            }
        });
        signal.emit(());
        assert_eq!(signal.connection_count(), 0);
    }
}
