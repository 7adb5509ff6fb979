//! Timeline engine: the piece the host player talks to
//!
//! Host events come in (`on_time_update`, `on_ended`, `on_gesture`,
//! `on_frame`); the engine pauses/resumes the host, mounts overlays and
//! reports outward through `drain_events`.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::{AudioManager, AudioSink, SoundEffect};
use crate::host::{HostPlayer, OverlaySurface};
use crate::model::{Bubble, PlaybackClock, Video};
use crate::overlay::{GestureEvent, Overlay, OverlaySignal};
use crate::queue::QueueProcessor;
use crate::scheduler::{BubbleScheduler, ClockAdapter};
use crate::settings::EngineSettings;

/// Signals reported to the embedding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// An overlay was mounted for this bubble
    BubblePresented { bubble_id: String },
    /// `onBubbleAnswer(bubbleId, isCorrect)`
    BubbleAnswered { bubble_id: String, is_correct: bool },
    /// `onComplete(videoId)`, once per session
    Completed { video_id: String },
    /// Unseen bubbles were refilled (loop or explicit reset)
    SessionRestarted,
}

/// Ephemeral per-session score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionScore {
    pub answered: u32,
    pub correct: u32,
}

/// The interactive timeline engine for one video
pub struct TimelineEngine<P, S, A> {
    video: Video,
    settings: EngineSettings,
    player: P,
    surface: S,
    audio: AudioManager<A>,
    clock: ClockAdapter,
    playback: PlaybackClock,
    scheduler: BubbleScheduler,
    queue: QueueProcessor,
    overlay: Option<Overlay>,
    rng: Pcg32,
    score: SessionScore,
    completed: bool,
    /// Media ended with a bubble on screen; loop once the queue drains
    loop_pending: bool,
    events: Vec<EngineEvent>,
}

impl<P, S, A> TimelineEngine<P, S, A>
where
    P: HostPlayer,
    S: OverlaySurface,
    A: AudioSink,
{
    pub fn new(video: Video, settings: EngineSettings, player: P, surface: S, audio: A) -> Self {
        let settings = settings.validated();
        let seed = settings.rng_seed.unwrap_or_else(rand::random);
        log::info!(
            "Engine for video {} ({} bubbles, {} due policy, seed {})",
            video.id,
            video.bubbles().len(),
            settings.due_policy.as_str(),
            seed
        );

        Self {
            scheduler: BubbleScheduler::new(&video, &settings),
            audio: AudioManager::new(audio, &settings),
            video,
            settings,
            player,
            surface,
            clock: ClockAdapter::new(),
            playback: PlaybackClock::default(),
            queue: QueueProcessor::new(),
            overlay: None,
            rng: Pcg32::seed_from_u64(seed),
            score: SessionScore::default(),
            completed: false,
            loop_pending: false,
            events: Vec::new(),
        }
    }

    // === Host input ===

    /// Host time update (the `onTimeUpdate` callback)
    pub fn on_time_update(&mut self, current_ms: u64) {
        let tick = self.clock.observe(current_ms);
        self.playback = PlaybackClock {
            current_time_ms: tick.current_ms,
            previous_time_ms: tick.previous_ms,
            is_playing: self.player.is_playing(),
        };

        // The host must never play under an overlay
        if self.queue.is_presenting() && self.playback.is_playing {
            log::warn!("Host playing while a bubble is presented, pausing again");
            if let Err(e) = self.player.pause() {
                log::warn!("Failed to pause host: {}", e);
            }
            self.playback.is_playing = false;
        }

        let batch = self.scheduler.on_tick(tick);
        if !batch.is_empty() {
            self.queue.enqueue(batch);
            self.present_next();
        }
    }

    /// Read the host clock and process it as a time update
    pub fn poll_clock(&mut self) {
        let now = self.player.current_time_ms();
        self.on_time_update(now);
    }

    /// Host reached the end of the media (the `onEnded` callback)
    pub fn on_ended(&mut self) {
        if !self.completed {
            self.completed = true;
            log::info!("Video {} completed", self.video.id);
            self.events.push(EngineEvent::Completed {
                video_id: self.video.id.clone(),
            });
        }

        if !self.settings.loop_playback {
            return;
        }
        if self.queue.is_presenting() {
            log::info!("Loop deferred until the open bubble is answered");
            self.loop_pending = true;
        } else {
            self.restart_loop();
        }
    }

    fn restart_loop(&mut self) {
        self.restart_session();
        if let Err(e) = self.player.seek_to(0) {
            log::warn!("Failed to rewind for loop: {}", e);
        }
        if let Err(e) = self.player.play() {
            log::warn!("Failed to restart playback: {}", e);
        }
    }

    /// Pointer input on the overlay
    pub fn on_gesture(&mut self, event: GestureEvent) {
        let signals = match self.overlay.as_mut() {
            Some(overlay) => overlay.on_gesture(event, &mut self.surface),
            None => return,
        };
        self.handle_signals(signals);
    }

    /// Animation frame from the host frame clock
    pub fn on_frame(&mut self, now_ms: f64) {
        let container = self.surface.container();
        let signals = match self.overlay.as_mut() {
            Some(overlay) => overlay.on_frame(now_ms, container),
            None => return,
        };
        self.handle_signals(signals);
    }

    /// Ask the host to seek; the next time update classifies the jump
    pub fn seek_to(&mut self, ms: u64) {
        if let Err(e) = self.player.seek_to(ms) {
            log::warn!("Seek to {}ms failed: {}", ms, e);
        }
    }

    /// Start a fresh playback session: every bubble becomes unseen again
    pub fn restart_session(&mut self) {
        self.dismiss_overlay();
        self.queue.clear(&mut self.player);
        self.queue.reset_history();
        self.scheduler.reset(&self.video);
        self.clock.reset();
        self.playback = PlaybackClock::default();
        self.score = SessionScore::default();
        self.completed = false;
        self.loop_pending = false;
        log::info!("Session restarted for video {}", self.video.id);
        self.events.push(EngineEvent::SessionRestarted);
    }

    /// Cancel everything outstanding (navigation away / component teardown)
    pub fn teardown(&mut self) {
        self.dismiss_overlay();
        self.queue.clear(&mut self.player);
        self.loop_pending = false;
        log::info!("Engine torn down");
    }

    // === Presentation ===

    fn present_next(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        if let Some(bubble) = self.queue.advance(&mut self.player) {
            self.mount(bubble);
        }
    }

    /// Mount an overlay; on failure move on without leaving the host paused
    fn mount(&mut self, bubble: Bubble) {
        let mut next = Some(bubble);
        while let Some(bubble) = next.take() {
            let id = bubble.id.clone();
            match Overlay::mount(bubble, self.surface.container(), &self.settings, &mut self.rng) {
                Ok(overlay) => {
                    self.overlay = Some(overlay);
                    self.events.push(EngineEvent::BubblePresented { bubble_id: id });
                }
                Err(e) => {
                    log::error!("Failed to mount bubble {}: {}", id, e);
                    next = self.queue.abort(&mut self.player);
                }
            }
        }
    }

    fn dismiss_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.unmount(&mut self.surface);
        }
    }

    fn handle_signals(&mut self, signals: Vec<OverlaySignal>) {
        for signal in signals {
            match signal {
                OverlaySignal::Resolved(resolution) => {
                    let effect = if resolution.is_correct {
                        SoundEffect::Correct
                    } else {
                        SoundEffect::Incorrect
                    };
                    self.audio.play(effect);
                }
                OverlaySignal::Outcome(resolution) => {
                    self.score.answered += 1;
                    if resolution.is_correct {
                        self.score.correct += 1;
                    }
                    self.events.push(EngineEvent::BubbleAnswered {
                        bubble_id: resolution.bubble_id,
                        is_correct: resolution.is_correct,
                    });
                }
                OverlaySignal::Close => {
                    self.dismiss_overlay();
                    if let Some(next) = self.queue.finish(&mut self.player) {
                        self.mount(next);
                    } else if std::mem::take(&mut self.loop_pending) {
                        self.restart_loop();
                    }
                }
            }
        }
    }

    // === Accessors ===

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> SessionScore {
        self.score
    }

    pub fn video(&self) -> &Video {
        &self.video
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn playback(&self) -> PlaybackClock {
        self.playback
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn queue(&self) -> &QueueProcessor {
        &self.queue
    }

    pub fn scheduler(&self) -> &BubbleScheduler {
        &self.scheduler
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn audio(&mut self) -> &mut AudioManager<A> {
        &mut self.audio
    }
}
