//! Cancellable scheduled tasks and per-frame requests
//!
//! Nothing here reads a clock. The host passes `now_ms` into `pop_due`, and
//! frame requests fire whenever the host calls `take` at the start of a frame.

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Handle to a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    seq: u64,
    due_ms: f64,
    payload: T,
}

/// Timers ordered by due time, then by scheduling order
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    entries: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due_ms: f64, payload: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled {
            seq,
            due_ms,
            payload,
        });
        TimerHandle(seq)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.seq != handle.0);
        self.entries.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.seq == handle.0)
    }

    /// Remove and return every timer due at `now_ms`, earliest first
    pub fn pop_due(&mut self, now_ms: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.due_ms <= now_ms);
        self.entries = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.payload).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Explicit animation-frame loop
///
/// A self-rescheduling callback becomes: `take` the current requests, run
/// them, and `request` again for anything that should keep animating.
#[derive(Debug, Clone)]
pub struct FrameLoop<T> {
    requests: Vec<(FrameHandle, T)>,
    next_id: u64,
}

impl<T> Default for FrameLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameLoop<T> {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            next_id: 0,
        }
    }

    pub fn request(&mut self, payload: T) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.requests.push((handle, payload));
        handle
    }

    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.requests.len();
        self.requests.retain(|(h, _)| *h != handle);
        self.requests.len() != before
    }

    /// Requests due this frame; anything requested afterwards waits for the next
    pub fn take(&mut self) -> Vec<(FrameHandle, T)> {
        std::mem::take(&mut self.requests)
    }

    pub fn cancel_all(&mut self) {
        self.requests.clear();
    }

    pub fn pending(&self) -> usize {
        self.requests.len()
    }
}
