//! Playlist queue shared between the UI (producers) and the audio thread (single consumer).

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Ordered, mutex-guarded FIFO with a blocking pop.
///
/// Insertion order is play order. Any number of threads may push; exactly one thread is
/// expected to pop. [`RingQueue::close`] wakes the consumer for good, so a waiting
/// [`RingQueue::pop_blocking`] returns `None` and the consumer can terminate.
pub struct RingQueue<T> {
    inner: Mutex<Inner<T>>,
    cv: Condvar,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> Default for RingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RingQueue<T> {
    pub fn new() -> Self {
        RingQueue {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one element and wake the consumer.
    pub fn push(&self, item: T) {
        self.lock().items.push_back(item);
        self.cv.notify_one();
    }

    /// Append all elements in order under one lock acquisition.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let mut g = self.lock();
        let before = g.items.len();
        g.items.extend(items);
        let added = g.items.len() > before;
        drop(g);
        if added {
            self.cv.notify_one();
        }
    }

    /// Remove and return the front element, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue has been closed.
    pub fn pop_blocking(&self) -> Option<T> {
        self.pop_blocking_with(|_| {})
    }

    /// Like [`pop_blocking`](Self::pop_blocking), but runs `on_pop` on the popped element
    /// before the lock is released.
    ///
    /// Producers that mutate the queue and raise a signal inside
    /// [`clear_with`](Self::clear_with) / [`replace_with`](Self::replace_with) are therefore
    /// totally ordered against the consumer's reaction to a pop.
    pub fn pop_blocking_with(&self, on_pop: impl FnOnce(&T)) -> Option<T> {
        let mut g = self.lock();
        loop {
            if g.closed {
                return None;
            }
            if let Some(item) = g.items.pop_front() {
                on_pop(&item);
                return Some(item);
            }
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Drop every pending element. A track already popped is unaffected.
    pub fn clear(&self) -> usize {
        self.clear_with(|| {})
    }

    /// Clear, then run `signal` while the lock is still held.
    pub fn clear_with(&self, signal: impl FnOnce()) -> usize {
        let mut g = self.lock();
        let dropped = g.items.len();
        g.items.clear();
        signal();
        dropped
    }

    /// Atomically clear the queue and push exactly one element.
    pub fn replace(&self, item: T) {
        self.replace_with(item, || {})
    }

    /// [`replace`](Self::replace), running `signal` while the lock is still held.
    pub fn replace_with(&self, item: T, signal: impl FnOnce()) {
        let mut g = self.lock();
        g.items.clear();
        g.items.push_back(item);
        signal();
        drop(g);
        self.cv.notify_one();
    }

    /// Wake the consumer permanently; subsequent pops return `None`. Idempotent.
    pub fn close(&self) {
        self.lock().closed = true;
        self.cv.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

impl<T: Clone> RingQueue<T> {
    /// Copy of the pending elements in play order.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.iter().cloned().collect()
    }
}
