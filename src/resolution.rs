//! Answer evaluation for a presented bubble
//!
//! An answer dropped onto the statement resolves the bubble exactly once.
//! The outcome is reported after a fixed delay (so the absorb or shake
//! animation can play), immediately followed by the close signal.

use glam::Vec2;

use crate::drag::{DragObject, VisualState};
use crate::model::Bubble;
use crate::settings::EngineSettings;
use crate::sim::circles_collide;
use crate::timer::{TimerHandle, TimerQueue};

/// Shake amplitude in pixels
const SHAKE_AMPLITUDE: f32 = 12.0;
/// Shake angular frequency (radians per ms)
const SHAKE_FREQUENCY: f64 = 0.06;

/// Outcome of dropping an answer on the statement
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub bubble_id: String,
    pub option_index: usize,
    pub is_correct: bool,
    pub resolved_at_ms: f64,
}

/// Lifecycle signals, in the order they are emitted
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionSignal {
    /// Report the answer outward (`onCorrect` / `onIncorrect`)
    Outcome(Resolution),
    /// The overlay may unmount
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Animation {
    /// Pull into the statement while shrinking to nothing
    Absorb { from: Vec2, to: Vec2 },
    /// Side-to-side shake around the drop point
    Shake { origin: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Open,
    Resolving {
        resolution: Resolution,
        slot: usize,
        animation: Animation,
        started_ms: f64,
        finish: TimerHandle,
    },
    Closed,
}

/// Classifies drops and drives the win/lose animation
#[derive(Debug, Clone)]
pub struct ResolutionEvaluator {
    bubble_id: String,
    correct_answer_index: usize,
    collision_threshold: f32,
    correct_delay_ms: f64,
    incorrect_delay_ms: f64,
    absorb_ms: f64,
    shake_ms: f64,
    phase: Phase,
    timers: TimerQueue<()>,
}

impl ResolutionEvaluator {
    pub fn new(bubble: &Bubble, settings: &EngineSettings) -> Self {
        Self {
            bubble_id: bubble.id.clone(),
            correct_answer_index: bubble.correct_answer_index,
            collision_threshold: settings.collision_threshold,
            correct_delay_ms: settings.correct_close_delay_ms,
            incorrect_delay_ms: settings.incorrect_close_delay_ms,
            absorb_ms: settings.absorb_animation_ms,
            shake_ms: settings.shake_duration_ms,
            phase: Phase::Open,
            timers: TimerQueue::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, Phase::Closed)
    }

    /// Resolution in progress, if any
    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.phase {
            Phase::Resolving { resolution, .. } => Some(resolution),
            _ => None,
        }
    }

    /// Slot of the answer being animated
    pub fn animating_slot(&self) -> Option<usize> {
        match self.phase {
            Phase::Resolving { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Evaluate a released answer against the statement.
    ///
    /// A miss (or any drop after the first hit) returns `None` and leaves the
    /// answer to its physics.
    pub fn evaluate(
        &mut self,
        slot: usize,
        answer: &mut DragObject,
        statement: &DragObject,
        now_ms: f64,
    ) -> Option<Resolution> {
        if !self.is_open() {
            return None;
        }
        let option_index = answer.option_index()?;
        if !circles_collide(
            answer.center(),
            0.0,
            statement.center(),
            statement.radius(),
            self.collision_threshold,
        ) {
            return None;
        }

        let is_correct = option_index == self.correct_answer_index;
        let resolution = Resolution {
            bubble_id: self.bubble_id.clone(),
            option_index,
            is_correct,
            resolved_at_ms: now_ms,
        };

        answer.body.freeze();
        let (animation, delay) = if is_correct {
            answer.visual = VisualState::Absorbing;
            (
                Animation::Absorb {
                    from: answer.center(),
                    to: statement.center(),
                },
                self.correct_delay_ms,
            )
        } else {
            answer.visual = VisualState::Shaking;
            (
                Animation::Shake {
                    origin: answer.center(),
                },
                self.incorrect_delay_ms,
            )
        };
        let finish = self.timers.schedule(now_ms + delay, ());

        log::info!(
            "Bubble {} resolved: option {} is {}",
            self.bubble_id,
            option_index,
            if is_correct { "correct" } else { "incorrect" }
        );
        self.phase = Phase::Resolving {
            resolution: resolution.clone(),
            slot,
            animation,
            started_ms: now_ms,
            finish,
        };
        Some(resolution)
    }

    /// Advance the resolution animation on the answer being resolved
    pub fn animate(&self, now_ms: f64, answer: &mut DragObject) {
        let Phase::Resolving {
            animation,
            started_ms,
            ..
        } = self.phase
        else {
            return;
        };
        let elapsed = (now_ms - started_ms).max(0.0);

        match animation {
            Animation::Absorb { from, to } => {
                let t = progress(elapsed, self.absorb_ms);
                answer.body.position = from.lerp(to, t);
                answer.scale = 1.0 - t;
            }
            Animation::Shake { origin } => {
                let t = progress(elapsed, self.shake_ms);
                if t >= 1.0 {
                    answer.body.position = origin;
                    answer.visual = VisualState::Resting;
                } else {
                    let wobble = (elapsed * SHAKE_FREQUENCY).sin() as f32;
                    answer.body.position = origin + Vec2::new(wobble * SHAKE_AMPLITUDE * (1.0 - t), 0.0);
                }
            }
        }
    }

    /// Fire the finish timer if due: outcome first, then close
    pub fn poll(&mut self, now_ms: f64) -> Vec<ResolutionSignal> {
        if self.timers.pop_due(now_ms).is_empty() {
            return Vec::new();
        }
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Resolving { resolution, .. } => {
                vec![ResolutionSignal::Outcome(resolution), ResolutionSignal::Close]
            }
            other => {
                self.phase = other;
                Vec::new()
            }
        }
    }

    /// Cancel any pending finish (teardown); nothing is reported afterwards
    pub fn cancel(&mut self) {
        if let Phase::Resolving { finish, .. } = self.phase {
            self.timers.cancel(finish);
        }
        self.timers.clear();
        self.phase = Phase::Closed;
    }
}

/// Fraction of `duration` covered by `elapsed`, clamped to 0..=1
fn progress(elapsed: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble() -> Bubble {
        Bubble {
            id: "a".into(),
            trigger_offset_ms: 5000,
            order: None,
            prompt: "The sky is blue".into(),
            options: ["True".into(), "False".into()],
            correct_answer_index: 0,
            explanation: None,
        }
    }

    fn statement() -> DragObject {
        DragObject::statement("The sky is blue", Vec2::new(400.0, 180.0), 160.0)
    }

    #[test]
    fn test_correct_drop_resolves_after_delay() {
        let settings = EngineSettings::default();
        let mut eval = ResolutionEvaluator::new(&bubble(), &settings);
        let mut answer = DragObject::answer(0, "True", Vec2::new(410.0, 200.0), 110.0);

        let res = eval.evaluate(0, &mut answer, &statement(), 100.0).unwrap();
        assert!(res.is_correct);
        assert_eq!(answer.visual, VisualState::Absorbing);

        assert!(eval.poll(500.0).is_empty());
        let signals = eval.poll(100.0 + settings.correct_close_delay_ms);
        assert_eq!(
            signals,
            vec![ResolutionSignal::Outcome(res), ResolutionSignal::Close]
        );
        assert!(eval.is_closed());
        assert!(eval.poll(1.0e9).is_empty());
    }

    #[test]
    fn test_incorrect_drop() {
        let settings = EngineSettings::default();
        let mut eval = ResolutionEvaluator::new(&bubble(), &settings);
        let mut answer = DragObject::answer(1, "False", Vec2::new(400.0, 180.0), 110.0);
        answer.body.velocity = Vec2::new(5.0, 5.0);
        answer.body.is_moving = true;

        let res = eval.evaluate(1, &mut answer, &statement(), 0.0).unwrap();
        assert!(!res.is_correct);
        assert_eq!(answer.body.velocity, Vec2::ZERO);
        assert_eq!(answer.visual, VisualState::Shaking);

        // Correct delay is not enough for a wrong answer
        assert!(eval.poll(settings.correct_close_delay_ms).is_empty());
        assert_eq!(eval.poll(settings.incorrect_close_delay_ms).len(), 2);
    }

    #[test]
    fn test_miss_is_noop() {
        let mut eval = ResolutionEvaluator::new(&bubble(), &EngineSettings::default());
        // 80 (radius) + 10 (threshold) = 90; this is 100 away
        let mut answer = DragObject::answer(0, "True", Vec2::new(400.0, 280.0), 110.0);
        assert!(eval.evaluate(0, &mut answer, &statement(), 0.0).is_none());
        assert!(eval.is_open());

        // Within the forgiveness margin
        answer.body.position = Vec2::new(400.0, 265.0);
        assert!(eval.evaluate(0, &mut answer, &statement(), 0.0).is_some());
    }

    #[test]
    fn test_only_first_drop_resolves() {
        let mut eval = ResolutionEvaluator::new(&bubble(), &EngineSettings::default());
        let mut first = DragObject::answer(1, "False", Vec2::new(400.0, 180.0), 110.0);
        let mut second = DragObject::answer(0, "True", Vec2::new(400.0, 180.0), 110.0);
        assert!(eval.evaluate(1, &mut first, &statement(), 0.0).is_some());
        assert!(eval.evaluate(0, &mut second, &statement(), 1.0).is_none());
        assert_eq!(eval.resolution().map(|r| r.option_index), Some(1));
    }

    #[test]
    fn test_absorb_animation_shrinks_into_statement() {
        let settings = EngineSettings::default();
        let mut eval = ResolutionEvaluator::new(&bubble(), &settings);
        let mut answer = DragObject::answer(0, "True", Vec2::new(440.0, 180.0), 110.0);
        eval.evaluate(0, &mut answer, &statement(), 0.0).unwrap();
        assert_eq!(eval.animating_slot(), Some(0));

        eval.animate(settings.absorb_animation_ms / 2.0, &mut answer);
        assert!((answer.scale - 0.5).abs() < 1e-3);
        assert!((answer.center().x - 420.0).abs() < 1e-3);

        eval.animate(settings.absorb_animation_ms * 2.0, &mut answer);
        assert_eq!(answer.scale, 0.0);
        assert_eq!(answer.center(), Vec2::new(400.0, 180.0));
    }

    #[test]
    fn test_cancel_suppresses_signals() {
        let mut eval = ResolutionEvaluator::new(&bubble(), &EngineSettings::default());
        let mut answer = DragObject::answer(0, "True", Vec2::new(400.0, 180.0), 110.0);
        eval.evaluate(0, &mut answer, &statement(), 0.0).unwrap();
        eval.cancel();
        assert!(eval.poll(1.0e9).is_empty());
    }
}
