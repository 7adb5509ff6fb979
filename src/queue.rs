//! Single-flight bubble presentation
//!
//! `Idle -> Presenting -> Idle`, one bubble at a time. The host is paused on
//! entry and resumed only when the queue drains, so a batch of bubbles from
//! one seek plays back-to-back without playback flickering between them.

use std::collections::VecDeque;

use crate::host::HostPlayer;
use crate::model::Bubble;

/// Presentation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueueState {
    #[default]
    Idle,
    Presenting { bubble: Bubble },
}

/// FIFO of due bubbles plus the pause/resume contract with the host
#[derive(Debug, Default)]
pub struct QueueProcessor {
    pending: VecDeque<Bubble>,
    state: QueueState,
    /// Captured when leaving `Idle`; decides whether to resume on drain
    was_playing_before_presenting: bool,
    /// Ids presented this session, in order
    presented: Vec<String>,
}

impl QueueProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    pub fn is_presenting(&self) -> bool {
        matches!(self.state, QueueState::Presenting { .. })
    }

    pub fn active(&self) -> Option<&Bubble> {
        match &self.state {
            QueueState::Presenting { bubble } => Some(bubble),
            QueueState::Idle => None,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn presented(&self) -> &[String] {
        &self.presented
    }

    pub fn was_playing_before_presenting(&self) -> bool {
        self.was_playing_before_presenting
    }

    /// Append a batch in order. Never interrupts the active bubble.
    pub fn enqueue(&mut self, batch: impl IntoIterator<Item = Bubble>) {
        for bubble in batch {
            log::debug!("Queued bubble {} @{}ms", bubble.id, bubble.trigger_offset_ms);
            self.pending.push_back(bubble);
        }
    }

    /// `Idle -> Presenting` if anything is queued: capture play state, pause.
    ///
    /// Returns the bubble to mount.
    pub fn advance<P: HostPlayer + ?Sized>(&mut self, player: &mut P) -> Option<Bubble> {
        if self.is_presenting() {
            return None;
        }
        let bubble = self.pending.pop_front()?;

        self.was_playing_before_presenting = player.is_playing();
        if let Err(e) = player.pause() {
            log::warn!("Failed to pause host for bubble {}: {}", bubble.id, e);
        }
        log::info!(
            "Presenting bubble {} (host was {})",
            bubble.id,
            if self.was_playing_before_presenting { "playing" } else { "paused" }
        );
        Some(self.present(bubble))
    }

    fn present(&mut self, bubble: Bubble) -> Bubble {
        self.presented.push(bubble.id.clone());
        self.state = QueueState::Presenting {
            bubble: bubble.clone(),
        };
        bubble
    }

    /// Active bubble closed: present the next one without resuming, or go
    /// idle and resume the host if it was playing.
    ///
    /// Returns the next bubble to mount, if any.
    pub fn finish<P: HostPlayer + ?Sized>(&mut self, player: &mut P) -> Option<Bubble> {
        if !self.is_presenting() {
            return None;
        }
        if let Some(next) = self.pending.pop_front() {
            log::info!("Presenting queued bubble {} without resuming", next.id);
            return Some(self.present(next));
        }

        self.state = QueueState::Idle;
        self.resume_if_needed(player);
        None
    }

    /// The active bubble could not be shown (mount failed). Moves on exactly
    /// like `finish` so the host is never left paused.
    pub fn abort<P: HostPlayer + ?Sized>(&mut self, player: &mut P) -> Option<Bubble> {
        if let Some(bubble) = self.active() {
            log::warn!("Abandoning bubble {} after lifecycle error", bubble.id);
        }
        self.finish(player)
    }

    /// Drop everything queued. An active bubble is abandoned and the host
    /// restored to its captured play state.
    pub fn clear<P: HostPlayer + ?Sized>(&mut self, player: &mut P) {
        self.pending.clear();
        if self.is_presenting() {
            self.state = QueueState::Idle;
            self.resume_if_needed(player);
        }
    }

    /// Forget the presentation history (new session)
    pub fn reset_history(&mut self) {
        self.presented.clear();
    }

    fn resume_if_needed<P: HostPlayer + ?Sized>(&mut self, player: &mut P) {
        if std::mem::take(&mut self.was_playing_before_presenting) {
            log::info!("Queue drained, resuming playback");
            if let Err(e) = player.play() {
                log::warn!("Failed to resume host: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;

    /// Records the order of pause/play calls
    #[derive(Default)]
    struct TestPlayer {
        playing: bool,
        calls: Vec<&'static str>,
    }

    impl HostPlayer for TestPlayer {
        fn pause(&mut self) -> Result<(), HostError> {
            self.playing = false;
            self.calls.push("pause");
            Ok(())
        }
        fn play(&mut self) -> Result<(), HostError> {
            self.playing = true;
            self.calls.push("play");
            Ok(())
        }
        fn current_time_ms(&self) -> u64 {
            0
        }
        fn seek_to(&mut self, _ms: u64) -> Result<(), HostError> {
            Ok(())
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn bubble(id: &str, at: u64) -> Bubble {
        Bubble {
            id: id.into(),
            trigger_offset_ms: at,
            order: None,
            prompt: "?".into(),
            options: ["a".into(), "b".into()],
            correct_answer_index: 0,
            explanation: None,
        }
    }

    #[test]
    fn test_batch_resumes_once_after_last() {
        let mut player = TestPlayer {
            playing: true,
            ..Default::default()
        };
        let mut queue = QueueProcessor::new();
        queue.enqueue([bubble("a", 2000), bubble("b", 5000), bubble("c", 8000)]);

        let first = queue.advance(&mut player).unwrap();
        assert_eq!(first.id, "a");
        assert!(!player.is_playing());

        assert_eq!(queue.finish(&mut player).unwrap().id, "b");
        assert!(!player.is_playing());
        assert_eq!(queue.finish(&mut player).unwrap().id, "c");
        assert!(!player.is_playing());
        assert!(queue.finish(&mut player).is_none());

        assert!(player.is_playing());
        assert_eq!(player.calls, vec!["pause", "play"]);
        assert_eq!(queue.presented(), ["a", "b", "c"]);
        assert_eq!(*queue.state(), QueueState::Idle);
    }

    #[test]
    fn test_paused_host_stays_paused() {
        let mut player = TestPlayer::default();
        let mut queue = QueueProcessor::new();
        queue.enqueue([bubble("a", 1)]);
        queue.advance(&mut player);
        queue.finish(&mut player);
        assert!(!player.calls.contains(&"play"));
    }

    #[test]
    fn test_enqueue_while_presenting_does_not_interrupt() {
        let mut player = TestPlayer {
            playing: true,
            ..Default::default()
        };
        let mut queue = QueueProcessor::new();
        queue.enqueue([bubble("a", 1)]);
        queue.advance(&mut player);

        queue.enqueue([bubble("b", 2)]);
        assert!(queue.advance(&mut player).is_none());
        assert_eq!(queue.active().map(|b| b.id.as_str()), Some("a"));
        assert_eq!(queue.finish(&mut player).unwrap().id, "b");
    }

    #[test]
    fn test_abort_restores_playback() {
        let mut player = TestPlayer {
            playing: true,
            ..Default::default()
        };
        let mut queue = QueueProcessor::new();
        queue.enqueue([bubble("broken", 1)]);
        queue.advance(&mut player);
        assert!(queue.abort(&mut player).is_none());
        assert!(player.is_playing());
    }

    #[test]
    fn test_clear_resumes_and_empties() {
        let mut player = TestPlayer {
            playing: true,
            ..Default::default()
        };
        let mut queue = QueueProcessor::new();
        queue.enqueue([bubble("a", 1), bubble("b", 2)]);
        queue.advance(&mut player);
        queue.clear(&mut player);
        assert!(player.is_playing());
        assert_eq!(queue.pending_len(), 0);
        assert!(!queue.is_presenting());
    }
}
