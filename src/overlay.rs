//! Overlay lifecycle for one presented bubble
//!
//! Mounting lays out the statement and the two answers, shuffling which
//! option lands on which anchor. Gestures and frames are routed to the drag
//! controllers and the resolution evaluator; unmounting cancels every pending
//! frame and timer and releases pointer captures.

use glam::Vec2;
use rand::Rng;

use crate::drag::{DragController, DragObject};
use crate::error::{Error, Result};
use crate::host::{OverlaySurface, PointerId};
use crate::model::{Bubble, OPTION_COUNT};
use crate::resolution::{Resolution, ResolutionEvaluator, ResolutionSignal};
use crate::settings::EngineSettings;
use crate::sim::{Container, clamp_to_container, point_in_circle};
use crate::timer::FrameLoop;

/// Slot used for the statement in the frame loop (never scheduled)
const STATEMENT_SLOT: usize = usize::MAX;

/// Pointer gesture phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Start,
    Move,
    End,
    Cancel,
}

/// A pointer event in overlay coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub pointer: PointerId,
    pub position: Vec2,
    /// Host timestamp of the event (ms)
    pub time_ms: f64,
}

impl GestureEvent {
    pub fn new(kind: GestureKind, pointer: PointerId, position: Vec2, time_ms: f64) -> Self {
        Self {
            kind,
            pointer,
            position,
            time_ms,
        }
    }
}

/// What the overlay reports upward
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySignal {
    /// An answer just hit the statement (play feedback now)
    Resolved(Resolution),
    /// Delay elapsed: report the answer outward
    Outcome(Resolution),
    /// Overlay is done and may be unmounted
    Close,
}

/// The blocking question layer for one bubble
#[derive(Debug)]
pub struct Overlay {
    bubble: Bubble,
    statement: DragController,
    answers: [DragController; OPTION_COUNT],
    evaluator: ResolutionEvaluator,
    frames: FrameLoop<usize>,
    mounted: bool,
}

impl Overlay {
    /// Lay out a bubble in the container
    pub fn mount<R: Rng + ?Sized>(
        bubble: Bubble,
        container: Container,
        settings: &EngineSettings,
        rng: &mut R,
    ) -> Result<Self> {
        if container.is_degenerate() {
            return Err(Error::DegenerateContainer {
                width: container.width,
                height: container.height,
            });
        }
        let layout = &settings.layout;

        let statement_center = clamp_to_container(
            container.at_fraction(layout.statement_anchor),
            layout.statement_size / 2.0,
            container,
        );
        let statement = DragController::new(
            STATEMENT_SLOT,
            DragObject::statement(bubble.prompt.clone(), statement_center, layout.statement_size),
        );

        // Cosmetic 50/50 shuffle of which option sits on which anchor
        let order = if rng.random_bool(0.5) { [1, 0] } else { [0, 1] };
        let answers: [DragController; OPTION_COUNT] = std::array::from_fn(|slot| {
            let option_index = order[slot];
            let center = clamp_to_container(
                container.at_fraction(layout.answer_anchors[slot]),
                layout.answer_size / 2.0,
                container,
            );
            DragController::new(
                slot,
                DragObject::answer(
                    option_index,
                    bubble.options[option_index].clone(),
                    center,
                    layout.answer_size,
                ),
            )
        });

        log::info!(
            "Mounted bubble {} ({:?} on left anchor)",
            bubble.id,
            bubble.options[order[0]]
        );
        Ok(Self {
            evaluator: ResolutionEvaluator::new(&bubble, settings),
            bubble,
            statement,
            answers,
            frames: FrameLoop::new(),
            mounted: true,
        })
    }

    pub fn bubble(&self) -> &Bubble {
        &self.bubble
    }

    pub fn statement(&self) -> &DragObject {
        self.statement.object()
    }

    pub fn answer(&self, slot: usize) -> Option<&DragObject> {
        self.answers.get(slot).map(DragController::object)
    }

    /// Slot of the answer showing `option_index`
    pub fn slot_of_option(&self, option_index: usize) -> Option<usize> {
        self.answers
            .iter()
            .position(|a| a.object().option_index() == Some(option_index))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_resolved(&self) -> bool {
        !self.evaluator.is_open()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.pending()
    }

    /// Topmost answer under `point`
    pub fn hit_test(&self, point: Vec2) -> Option<usize> {
        self.answers.iter().rposition(|a| {
            let obj = a.object();
            point_in_circle(point, obj.center(), obj.radius())
        })
    }

    /// Route a pointer event to the drag controllers
    pub fn on_gesture<S: OverlaySurface + ?Sized>(
        &mut self,
        event: GestureEvent,
        surface: &mut S,
    ) -> Vec<OverlaySignal> {
        if !self.mounted {
            return Vec::new();
        }
        let container = surface.container();

        match event.kind {
            GestureKind::Start => {
                if let Some(slot) = self.hit_test(event.position) {
                    self.answers[slot].on_gesture_start(
                        event.pointer,
                        event.position,
                        event.time_ms,
                        surface,
                        &mut self.frames,
                    );
                }
                Vec::new()
            }
            GestureKind::Move => {
                for answer in &mut self.answers {
                    answer.on_gesture_move(event.pointer, event.position, container);
                }
                Vec::new()
            }
            GestureKind::End => {
                let Some(slot) = self
                    .answers
                    .iter()
                    .position(|a| a.pointer() == Some(event.pointer))
                else {
                    return Vec::new();
                };
                let released = self.answers[slot].on_gesture_end(
                    event.pointer,
                    event.position,
                    event.time_ms,
                    container,
                    surface,
                    &mut self.frames,
                );
                if released.is_none() {
                    return Vec::new();
                }

                let resolution = self.evaluator.evaluate(
                    slot,
                    self.answers[slot].object_mut(),
                    self.statement.object(),
                    event.time_ms,
                );
                match resolution {
                    Some(resolution) => {
                        for answer in &mut self.answers {
                            answer.lock(surface, &mut self.frames);
                        }
                        vec![OverlaySignal::Resolved(resolution)]
                    }
                    None => Vec::new(),
                }
            }
            GestureKind::Cancel => {
                for answer in &mut self.answers {
                    answer.on_gesture_cancel(event.pointer, surface);
                }
                Vec::new()
            }
        }
    }

    /// Run one animation frame: physics, resolution animation, timers
    pub fn on_frame(&mut self, now_ms: f64, container: Container) -> Vec<OverlaySignal> {
        if !self.mounted {
            return Vec::new();
        }

        for (_, slot) in self.frames.take() {
            if let Some(answer) = self.answers.get_mut(slot) {
                answer.step(container, &mut self.frames);
            }
        }

        if let Some(slot) = self.evaluator.animating_slot() {
            self.evaluator
                .animate(now_ms, self.answers[slot].object_mut());
        }

        self.evaluator
            .poll(now_ms)
            .into_iter()
            .map(|signal| match signal {
                ResolutionSignal::Outcome(resolution) => OverlaySignal::Outcome(resolution),
                ResolutionSignal::Close => OverlaySignal::Close,
            })
            .collect()
    }

    /// Tear down: cancel frames and timers, release pointer captures
    pub fn unmount<S: OverlaySurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.mounted {
            return;
        }
        self.evaluator.cancel();
        for answer in &mut self.answers {
            answer.release(surface, &mut self.frames);
        }
        self.frames.cancel_all();
        self.mounted = false;
        log::debug!("Unmounted bubble {}", self.bubble.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct TestSurface {
        container: Container,
        captured: Vec<PointerId>,
    }

    impl TestSurface {
        fn new() -> Self {
            Self {
                container: Container::new(800.0, 600.0),
                captured: Vec::new(),
            }
        }
    }

    impl OverlaySurface for TestSurface {
        fn container(&self) -> Container {
            self.container
        }
        fn capture_pointer(&mut self, pointer: PointerId) -> std::result::Result<(), HostError> {
            self.captured.push(pointer);
            Ok(())
        }
        fn release_pointer(&mut self, pointer: PointerId) -> std::result::Result<(), HostError> {
            self.captured.retain(|p| *p != pointer);
            Ok(())
        }
    }

    fn bubble() -> Bubble {
        Bubble {
            id: "a".into(),
            trigger_offset_ms: 5000,
            order: None,
            prompt: "Water boils at 100C at sea level".into(),
            options: ["True".into(), "False".into()],
            correct_answer_index: 0,
            explanation: None,
        }
    }

    fn mount(seed: u64) -> Overlay {
        let mut rng = Pcg32::seed_from_u64(seed);
        Overlay::mount(
            bubble(),
            Container::new(800.0, 600.0),
            &EngineSettings::default(),
            &mut rng,
        )
        .unwrap()
    }

    fn drag(overlay: &mut Overlay, surface: &mut TestSurface, slot: usize, to: Vec2, t0: f64) -> Vec<OverlaySignal> {
        let from = overlay.answer(slot).unwrap().center();
        overlay.on_gesture(GestureEvent::new(GestureKind::Start, 1, from, t0), surface);
        overlay.on_gesture(GestureEvent::new(GestureKind::Move, 1, to, t0 + 200.0), surface);
        overlay.on_gesture(GestureEvent::new(GestureKind::End, 1, to, t0 + 2000.0), surface)
    }

    #[test]
    fn test_layout_is_non_overlapping() {
        let overlay = mount(1);
        let a = overlay.answer(0).unwrap();
        let b = overlay.answer(1).unwrap();
        let s = overlay.statement();
        assert!(a.center().distance(b.center()) > a.radius() + b.radius());
        assert!(a.center().distance(s.center()) > a.radius() + s.radius());
        assert!(b.center().distance(s.center()) > b.radius() + s.radius());
    }

    #[test]
    fn test_shuffle_uses_both_assignments() {
        let mut seen = [false; 2];
        for seed in 0..64 {
            let overlay = mount(seed);
            let left = overlay.answer(0).unwrap().option_index().unwrap();
            seen[left] = true;
            // Label always matches the option it carries
            assert_eq!(overlay.answer(0).unwrap().label, bubble().options[left]);
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_degenerate_container_fails_mount() {
        let mut rng = Pcg32::seed_from_u64(0);
        let err = Overlay::mount(bubble(), Container::new(0.0, 600.0), &EngineSettings::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateContainer { .. }));
    }

    #[test]
    fn test_correct_drop_closes_after_delay() {
        let settings = EngineSettings::default();
        let mut surface = TestSurface::new();
        let mut overlay = mount(7);
        let slot = overlay.slot_of_option(0).unwrap();
        let target = overlay.statement().center();

        let signals = drag(&mut overlay, &mut surface, slot, target, 0.0);
        let [OverlaySignal::Resolved(res)] = signals.as_slice() else {
            panic!("expected a resolution, got {signals:?}");
        };
        assert!(res.is_correct);
        assert!(overlay.is_resolved());
        assert!(surface.captured.is_empty());

        // Further gestures are ignored
        let other = 1 - slot;
        assert!(drag(&mut overlay, &mut surface, other, target, 2100.0).is_empty());

        let resolved_at = res.resolved_at_ms;
        assert!(overlay.on_frame(resolved_at + 10.0, surface.container).is_empty());
        let signals = overlay.on_frame(resolved_at + settings.correct_close_delay_ms, surface.container);
        assert_eq!(signals.len(), 2);
        assert!(matches!(&signals[0], OverlaySignal::Outcome(r) if r.is_correct));
        assert_eq!(signals[1], OverlaySignal::Close);
    }

    #[test]
    fn test_wrong_option_is_incorrect() {
        let mut surface = TestSurface::new();
        let mut overlay = mount(3);
        let slot = overlay.slot_of_option(1).unwrap();
        let target = overlay.statement().center();

        let signals = drag(&mut overlay, &mut surface, slot, target, 0.0);
        assert!(matches!(signals.as_slice(), [OverlaySignal::Resolved(r)] if !r.is_correct));
    }

    #[test]
    fn test_miss_keeps_bubble_open_and_moving() {
        let mut surface = TestSurface::new();
        let mut overlay = mount(5);
        let from = overlay.answer(0).unwrap().center();

        overlay.on_gesture(GestureEvent::new(GestureKind::Start, 4, from, 0.0), &mut surface);
        let to = from + Vec2::new(60.0, 0.0);
        overlay.on_gesture(GestureEvent::new(GestureKind::Move, 4, to, 40.0), &mut surface);
        let signals = overlay.on_gesture(GestureEvent::new(GestureKind::End, 4, to, 40.0), &mut surface);
        assert!(signals.is_empty());
        assert!(!overlay.is_resolved());
        assert!(overlay.answer(0).unwrap().body.is_moving);
        assert_eq!(overlay.pending_frames(), 1);

        let before = overlay.answer(0).unwrap().center();
        overlay.on_frame(56.0, surface.container);
        assert!(overlay.answer(0).unwrap().center().x > before.x);
    }

    #[test]
    fn test_unmount_cancels_everything() {
        let mut surface = TestSurface::new();
        let mut overlay = mount(9);
        let slot = overlay.slot_of_option(0).unwrap();
        let target = overlay.statement().center();
        drag(&mut overlay, &mut surface, slot, target, 0.0);

        overlay.unmount(&mut surface);
        assert!(!overlay.is_mounted());
        assert_eq!(overlay.pending_frames(), 0);
        assert!(surface.captured.is_empty());
        assert!(overlay.on_frame(1.0e9, surface.container).is_empty());
    }

    #[test]
    fn test_unmount_releases_active_capture() {
        let mut surface = TestSurface::new();
        let mut overlay = mount(11);
        let from = overlay.answer(1).unwrap().center();
        overlay.on_gesture(GestureEvent::new(GestureKind::Start, 3, from, 0.0), &mut surface);
        assert_eq!(surface.captured, vec![3]);
        overlay.unmount(&mut surface);
        assert!(surface.captured.is_empty());
    }
}
