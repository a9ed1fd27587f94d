//! Bounded multi-producer, multi-consumer event queue.
//!
//! [`EventQueue`] wraps a bounded `crossbeam-channel` pair and keeps both ends,
//! so the queue never disconnects while it is alive. Clones share the same
//! underlying buffer, which lets producers on timer threads, the signal poll
//! thread and worker threads all feed one consumer.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use termdash_core::EventQueue;
//!
//! let queue = EventQueue::new(4);
//! queue.push("render");
//! assert!(queue.push_timeout("layout", Duration::from_millis(10)).is_ok());
//! assert_eq!(queue.pop(), Some("render"));
//! assert_eq!(queue.try_pop().ok(), Some("layout"));
//! ```

use std::time::Duration;

use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError, TrySendError,
};

use crate::error::QueueError;

/// A bounded FIFO queue shared between producers and a consumer.
///
/// Items pushed from one thread are popped in the order they were pushed.
/// No ordering is guaranteed between items from different producers.
pub struct EventQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
}

impl<T> EventQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// A capacity of zero is raised to one; a rendezvous queue would make
    /// every push wait for a pop.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Push an item, waiting for space if the queue is full.
    ///
    /// Returns the item back if the queue cannot accept it. This only happens
    /// if the channel is disconnected, which cannot occur while `self` is alive.
    pub fn push(&self, item: T) -> std::result::Result<(), T> {
        self.sender.send(item).map_err(|err| err.into_inner())
    }

    /// Push an item, waiting at most `timeout` for space.
    ///
    /// # Errors
    ///
    /// Returns the item together with [`QueueError::Timeout`] if no space
    /// became available in time.
    pub fn push_timeout(&self, item: T, timeout: Duration) -> std::result::Result<(), (T, QueueError)> {
        self.sender.send_timeout(item, timeout).map_err(|err| match err {
            SendTimeoutError::Timeout(item) => (item, QueueError::Timeout),
            SendTimeoutError::Disconnected(item) => (item, QueueError::Disconnected),
        })
    }

    /// Push an item without waiting.
    ///
    /// # Errors
    ///
    /// Returns the item together with [`QueueError::Full`] if the queue is at
    /// capacity.
    pub fn try_push(&self, item: T) -> std::result::Result<(), (T, QueueError)> {
        self.sender.try_send(item).map_err(|err| match err {
            TrySendError::Full(item) => (item, QueueError::Full),
            TrySendError::Disconnected(item) => (item, QueueError::Disconnected),
        })
    }

    /// Pop the next item, waiting until one is available.
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Pop the next item, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Timeout`] if nothing arrived in time.
    pub fn pop_timeout(&self, timeout: Duration) -> std::result::Result<T, QueueError> {
        self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => QueueError::Timeout,
            RecvTimeoutError::Disconnected => QueueError::Disconnected,
        })
    }

    /// Pop the next item without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Empty`] if the queue holds nothing.
    pub fn try_pop(&self) -> std::result::Result<T, QueueError> {
        self.receiver.try_recv().map_err(|err| match err {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Disconnected,
        })
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Clone for EventQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> std::fmt::Debug for EventQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

static_assertions::assert_impl_all!(EventQueue<u32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::new(8);
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        let popped: Vec<_> = (0..5).filter_map(|_| queue.try_pop().ok()).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_try_push_full() {
        let queue = EventQueue::new(2);
        queue.try_push(1).unwrap();
        queue.try_push(2).unwrap();
        let (item, err) = queue.try_push(3).unwrap_err();
        assert_eq!(item, 3);
        assert_eq!(err, QueueError::Full);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_push_timeout_expires() {
        let queue = EventQueue::new(1);
        queue.push(1).unwrap();
        let (item, err) = queue
            .push_timeout(2, Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(item, 2);
        assert_eq!(err, QueueError::Timeout);
    }

    #[test]
    fn test_pop_timeout_and_empty() {
        let queue: EventQueue<u8> = EventQueue::new(1);
        assert_eq!(queue.try_pop().unwrap_err(), QueueError::Empty);
        assert_eq!(
            queue.pop_timeout(Duration::from_millis(10)).unwrap_err(),
            QueueError::Timeout
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let queue = EventQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.try_push(()).unwrap();
    }

    #[test]
    fn test_blocked_push_released_by_pop() {
        let queue = Arc::new(EventQueue::new(1));
        queue.push(1).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.push(2).is_ok())
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.pop(), Some(1));
        assert!(producer.join().unwrap());
        assert_eq!(queue.pop(), Some(2));
    }

    #[test]
    fn test_multiple_producers() {
        let queue = EventQueue::new(64);
        let handles: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        queue.push((p, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last = [None::<i32>; 4];
        while let Ok((p, i)) = queue.try_pop() {
            if let Some(prev) = last[p] {
                assert!(i > prev, "per-producer order must be preserved");
            }
            last[p] = Some(i);
        }
        assert!(last.iter().all(|l| *l == Some(9)));
    }
}
