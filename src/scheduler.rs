//! Playback clock observation and due-bubble detection
//!
//! Ticks are chained: each tick's `previous_ms` is the last reported
//! `current_ms`, never an independent clock read. A tick that advances by
//! more than the skip threshold is a seek and releases every bubble it jumped
//! over, in trigger order, as one batch. Bubbles already due but still unseen
//! lead that batch.

use std::collections::VecDeque;

use crate::model::{Bubble, Video};
use crate::settings::{DuePolicy, EngineSettings};

/// One observed clock advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub previous_ms: u64,
    pub current_ms: u64,
}

/// Chains host time updates into ticks
#[derive(Debug, Clone, Default)]
pub struct ClockAdapter {
    last_ms: u64,
}

impl ClockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, current_ms: u64) -> Tick {
        let tick = Tick {
            previous_ms: self.last_ms,
            current_ms,
        };
        self.last_ms = current_ms;
        tick
    }

    pub fn last_reported_ms(&self) -> u64 {
        self.last_ms
    }

    /// Session start: the next tick is treated as the first one
    pub fn reset(&mut self) {
        self.last_ms = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Normal,
    Skip,
}

/// A skip is a forward jump past the threshold. The first tick of a session
/// (`previous_ms == 0`) never is, whatever offset playback starts at.
pub fn classify_tick(tick: Tick, skip_threshold_ms: u64) -> TickKind {
    if tick.previous_ms > 0 && tick.current_ms.saturating_sub(tick.previous_ms) > skip_threshold_ms {
        TickKind::Skip
    } else {
        TickKind::Normal
    }
}

/// Bubbles not yet presented this session, ascending by trigger offset
#[derive(Debug, Clone, Default)]
pub struct UnseenSet {
    bubbles: VecDeque<Bubble>,
}

impl UnseenSet {
    pub fn from_video(video: &Video) -> Self {
        Self {
            bubbles: video.bubbles().iter().cloned().collect(),
        }
    }

    /// Refill with every bubble of the video (session restart only)
    pub fn reset(&mut self, video: &Video) {
        *self = Self::from_video(video);
    }

    pub fn peek(&self) -> Option<&Bubble> {
        self.bubbles.front()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.bubbles.iter().any(|b| b.id == id)
    }

    /// Remove the head if it is due at `current_ms`
    pub fn take_head_if_due(&mut self, current_ms: u64) -> Option<Bubble> {
        if self.peek()?.trigger_offset_ms <= current_ms {
            self.bubbles.pop_front()
        } else {
            None
        }
    }

    /// Remove bubbles matching `due`, keeping order on both sides
    fn take_where(&mut self, due: impl Fn(&Bubble) -> bool) -> Vec<Bubble> {
        let (taken, kept): (VecDeque<_>, VecDeque<_>) =
            std::mem::take(&mut self.bubbles).into_iter().partition(|b| due(b));
        self.bubbles = kept;
        taken.into()
    }

    /// Remove every bubble with trigger offset in `(after_ms, until_ms]`
    pub fn take_range(&mut self, after_ms: u64, until_ms: u64) -> Vec<Bubble> {
        self.take_where(|b| b.trigger_offset_ms > after_ms && b.trigger_offset_ms <= until_ms)
    }

    /// Remove every bubble with trigger offset at or before `until_ms`
    pub fn take_due(&mut self, until_ms: u64) -> Vec<Bubble> {
        self.take_where(|b| b.trigger_offset_ms <= until_ms)
    }
}

/// Feeds newly-due bubbles to the queue
#[derive(Debug, Clone)]
pub struct BubbleScheduler {
    unseen: UnseenSet,
    skip_threshold_ms: u64,
    due_policy: DuePolicy,
}

impl BubbleScheduler {
    pub fn new(video: &Video, settings: &EngineSettings) -> Self {
        Self {
            unseen: UnseenSet::from_video(video),
            skip_threshold_ms: settings.skip_threshold_ms,
            due_policy: settings.due_policy,
        }
    }

    pub fn unseen(&self) -> &UnseenSet {
        &self.unseen
    }

    pub fn reset(&mut self, video: &Video) {
        self.unseen.reset(video);
    }

    /// Bubbles released by this tick, in presentation order
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Bubble> {
        match classify_tick(tick, self.skip_threshold_ms) {
            TickKind::Skip => {
                // Bubbles held back by the head-only rule are older than the
                // jumped range and go first
                let mut batch = self.unseen.take_due(tick.previous_ms);
                batch.extend(self.unseen.take_range(tick.previous_ms, tick.current_ms));
                if !batch.is_empty() {
                    log::info!(
                        "Skip {}ms -> {}ms released {} bubble(s)",
                        tick.previous_ms,
                        tick.current_ms,
                        batch.len()
                    );
                }
                batch
            }
            TickKind::Normal => match self.due_policy {
                DuePolicy::HeadOnly => self
                    .unseen
                    .take_head_if_due(tick.current_ms)
                    .into_iter()
                    .collect(),
                DuePolicy::AllDue => self.unseen.take_due(tick.current_ms),
            },
        }
    }
}
