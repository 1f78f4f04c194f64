//! Bounded per-connection outbound queue.
//!
//! Each connection gets one channel. The hub pushes without ever waiting;
//! the connection's writer task drains it at whatever pace its socket allows.
//! When a slow receiver lets the queue fill up, the oldest non-authoritative
//! event is evicted and the incoming state-carrying event is enqueued as a
//! `sync`, which also supersedes any older queued `sync`. Every playback
//! event carries the full state, so the receiver still converges on the
//! latest snapshot.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::Notify;

use crate::domain::{Event, EventKind};

/// Receiver side has gone away.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("outbound channel closed")]
pub struct ChannelClosed;

/// What happened to a pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The queue was full; `evicted` older events were discarded
    Overflowed { evicted: usize },
}

struct Shared {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
    notify: Notify,
    sender_closed: AtomicBool,
    receiver_closed: AtomicBool,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a bounded outbound channel. A capacity of 0 is treated as 1.
pub fn channel(capacity: usize) -> (OutboundSender, OutboundReceiver) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::with_capacity(capacity)),
        capacity,
        notify: Notify::new(),
        sender_closed: AtomicBool::new(false),
        receiver_closed: AtomicBool::new(false),
    });
    (
        OutboundSender {
            shared: shared.clone(),
        },
        OutboundReceiver { shared },
    )
}

pub struct OutboundSender {
    shared: Arc<Shared>,
}

impl OutboundSender {
    /// Enqueue without waiting.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` once the receiver has been dropped.
    pub fn push(&self, event: Event) -> Result<PushOutcome, ChannelClosed> {
        if self.shared.receiver_closed.load(Ordering::Acquire) {
            return Err(ChannelClosed);
        }
        let outcome = {
            let mut queue = self.shared.queue();
            enqueue(&mut queue, self.shared.capacity, event)
        };
        self.shared.notify.notify_one();
        Ok(outcome)
    }

    /// Stop the receiver after it drains what is already queued.
    pub fn close(&self) {
        self.shared.sender_closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.receiver_closed.load(Ordering::Acquire)
    }
}

impl Drop for OutboundSender {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct OutboundReceiver {
    shared: Arc<Shared>,
}

impl OutboundReceiver {
    /// Next event in FIFO order, or `None` once the sender is closed and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.shared.sender_closed.load(Ordering::Acquire) {
                // Catch a push that raced with close.
                return self.try_recv();
            }
            self.shared.notify.notified().await;
        }
    }

    pub fn try_recv(&mut self) -> Option<Event> {
        self.shared.queue().pop_front()
    }

    pub fn len(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for OutboundReceiver {
    fn drop(&mut self) {
        self.shared.receiver_closed.store(true, Ordering::Release);
    }
}

fn enqueue(queue: &mut VecDeque<Event>, capacity: usize, event: Event) -> PushOutcome {
    if queue.len() < capacity {
        queue.push_back(event);
        return PushOutcome::Queued;
    }

    let before = queue.len();
    if let Some(index) = queue.iter().position(|e| !e.is_authoritative()) {
        queue.remove(index);
    }

    let incoming = if event.carries_state() {
        let mut sync = event.to_sync();
        // A superseded sync may hold the only roster still queued.
        let queued_roster = queue
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::Sync && e.roster.is_some())
            .and_then(|e| e.roster.clone());
        if sync.roster.is_none() {
            sync.roster = queued_roster;
        }
        queue.retain(|e| e.kind != EventKind::Sync);
        sync
    } else {
        event
    };

    // Only authoritative events left and still no room.
    while queue.len() >= capacity {
        queue.pop_front();
    }

    let evicted = before - queue.len();
    queue.push_back(incoming);
    PushOutcome::Overflowed { evicted }
}
