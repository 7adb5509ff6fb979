//! Bubble Timeline entry point
//!
//! Native: headless playback of a video file. Every presented bubble is
//! answered by dragging a random option onto the statement.
//!
//! Web: binds the engine to the page's `<video>` and overlay element.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, EventTarget, HtmlMediaElement, PointerEvent};

    use bubble_timeline::overlay::{GestureEvent, GestureKind};
    use bubble_timeline::platform::web::{
        ElementSurface, HtmlAudioSink, MediaElementPlayer, OverlayView,
    };
    use bubble_timeline::{EngineEvent, EngineSettings, TimelineEngine, Video};

    /// Page elements the app binds to
    const MEDIA_ID: &str = "player";
    const OVERLAY_ID: &str = "bubble-overlay";
    const VIDEO_DATA_ID: &str = "bubble-video";
    const SETTINGS_DATA_ID: &str = "bubble-settings";
    const SCORE_ID: &str = "bubble-score";

    type WebEngine = TimelineEngine<MediaElementPlayer, ElementSurface, HtmlAudioSink>;

    struct App {
        engine: WebEngine,
        view: OverlayView,
        score: Option<Element>,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            if self.engine.overlay().is_some() {
                self.engine.on_frame(time);
            }
            self.render();
        }

        fn render(&mut self) {
            if let Err(e) = self.view.sync(self.engine.overlay()) {
                log::warn!("Overlay render failed: {:?}", e);
            }
            for event in self.engine.drain_events() {
                match event {
                    EngineEvent::BubblePresented { bubble_id } => {
                        log::info!("Presented {}", bubble_id)
                    }
                    EngineEvent::BubbleAnswered {
                        bubble_id,
                        is_correct,
                    } => log::info!("Answered {}: {}", bubble_id, is_correct),
                    EngineEvent::Completed { video_id } => log::info!("Completed {}", video_id),
                    EngineEvent::SessionRestarted => log::info!("Session restarted"),
                }
            }
            if let Some(el) = &self.score {
                let score = self.engine.score();
                el.set_text_content(Some(&format!("{} / {}", score.correct, score.answered)));
            }
        }
    }

    fn element(document: &Document, id: &str) -> Result<Element, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
    }

    /// JSON embedded in a `<script type="application/json">` block
    fn embedded_json(document: &Document, id: &str) -> Option<String> {
        document.get_element_by_id(id)?.text_content()
    }

    fn to_js(e: bubble_timeline::Error) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    pub fn run() -> Result<(), JsValue> {
        bubble_timeline::platform::init_logging();
        log::info!("Bubble Timeline (web) starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let video_json = embedded_json(&document, VIDEO_DATA_ID)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{VIDEO_DATA_ID}")))?;
        let video = Video::from_json(&video_json).map_err(to_js)?;
        let settings = match embedded_json(&document, SETTINGS_DATA_ID) {
            Some(json) => EngineSettings::from_json(&json).map_err(to_js)?,
            None => EngineSettings::default(),
        };

        let media: HtmlMediaElement = element(&document, MEDIA_ID)?.dyn_into()?;
        let overlay_el = element(&document, OVERLAY_ID)?;

        let engine = TimelineEngine::new(
            video,
            settings,
            MediaElementPlayer::new(media.clone()),
            ElementSurface::new(overlay_el.clone()),
            HtmlAudioSink,
        );
        let app = Rc::new(RefCell::new(App {
            engine,
            view: OverlayView::new(document.clone(), overlay_el.clone()),
            score: document.get_element_by_id(SCORE_ID),
        }));

        setup_media_handlers(&media, app.clone())?;
        setup_pointer_handlers(&overlay_el, app.clone())?;

        // Navigation away: cancel timers and frames, release captures
        {
            let app = app.clone();
            listen(&window, "pagehide", move |_| {
                if let Ok(mut a) = app.try_borrow_mut() {
                    a.engine.teardown();
                }
            })?;
        }

        request_frame(app)?;
        log::info!("Bubble Timeline running!");
        Ok(())
    }

    fn listen(
        target: &EventTarget,
        kind: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_media_handlers(media: &HtmlMediaElement, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        {
            let app = app.clone();
            listen(media, "timeupdate", move |_| {
                if let Ok(mut a) = app.try_borrow_mut() {
                    a.engine.poll_clock();
                    a.render();
                }
            })?;
        }
        listen(media, "ended", move |_| {
            if let Ok(mut a) = app.try_borrow_mut() {
                a.engine.on_ended();
                a.render();
            }
        })
    }

    fn setup_pointer_handlers(overlay: &Element, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let kinds = [
            ("pointerdown", GestureKind::Start),
            ("pointermove", GestureKind::Move),
            ("pointerup", GestureKind::End),
            ("pointercancel", GestureKind::Cancel),
        ];
        for (name, kind) in kinds {
            let app = app.clone();
            let target = overlay.clone();
            listen(overlay, name, move |event| {
                let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let Ok(mut a) = app.try_borrow_mut() else {
                    return;
                };
                if a.engine.overlay().is_none() {
                    return;
                }
                if kind == GestureKind::Start {
                    event.prevent_default();
                }
                let rect = target.get_bounding_client_rect();
                let position = glam::Vec2::new(
                    (pointer.client_x() as f64 - rect.left()) as f32,
                    (pointer.client_y() as f64 - rect.top()) as f32,
                );
                a.engine.on_gesture(GestureEvent::new(
                    kind,
                    pointer.pointer_id(),
                    position,
                    event.time_stamp(),
                ));
            })?;
        }
        Ok(())
    }

    fn request_frame(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::once(move |time: f64| frame_loop(app, time));
        window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        if let Ok(mut a) = app.try_borrow_mut() {
            a.frame(time);
        }
        if let Err(e) = request_frame(app) {
            log::error!("Frame loop stopped: {:?}", e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_app::run() {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use bubble_timeline::audio::SilentSink;
    use bubble_timeline::consts::FRAME_MS;
    use bubble_timeline::host::{HostPlayer, OverlaySurface, PointerId};
    use bubble_timeline::model::OPTION_COUNT;
    use bubble_timeline::overlay::{GestureEvent, GestureKind};
    use bubble_timeline::sim::Container;
    use bubble_timeline::{
        EngineEvent, EngineSettings, HostError, Result, SessionScore, TimelineEngine, Video,
    };
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Host time update interval (ms)
    const TICK_MS: u64 = 250;
    /// Give up after this many loop iterations
    const MAX_ITERATIONS: u64 = 10_000_000;

    /// Simulated media element
    struct SimPlayer {
        time_ms: u64,
        playing: bool,
    }

    impl HostPlayer for SimPlayer {
        fn pause(&mut self) -> std::result::Result<(), HostError> {
            self.playing = false;
            Ok(())
        }
        fn play(&mut self) -> std::result::Result<(), HostError> {
            self.playing = true;
            Ok(())
        }
        fn current_time_ms(&self) -> u64 {
            self.time_ms
        }
        fn seek_to(&mut self, ms: u64) -> std::result::Result<(), HostError> {
            self.time_ms = ms;
            Ok(())
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    struct SimSurface;

    impl OverlaySurface for SimSurface {
        fn container(&self) -> Container {
            Container::new(800.0, 600.0)
        }
        fn capture_pointer(&mut self, _pointer: PointerId) -> std::result::Result<(), HostError> {
            Ok(())
        }
        fn release_pointer(&mut self, _pointer: PointerId) -> std::result::Result<(), HostError> {
            Ok(())
        }
    }

    pub fn run(video_path: &str, settings_path: Option<&str>) -> Result<SessionScore> {
        let video = Video::load(video_path)?;
        let settings = match settings_path {
            Some(path) => EngineSettings::load(path)?,
            None => EngineSettings::default(),
        };
        let duration = video.duration_ms;
        let mut answers = Pcg32::seed_from_u64(settings.rng_seed.unwrap_or(0));

        let player = SimPlayer {
            time_ms: 0,
            playing: true,
        };
        let mut engine = TimelineEngine::new(video, settings, player, SimSurface, SilentSink);
        let mut score = SessionScore::default();
        let mut now = 0.0_f64;

        for _ in 0..MAX_ITERATIONS {
            if let Some(overlay) = engine.overlay() {
                if !overlay.is_resolved() {
                    let option = answers.random_range(0..OPTION_COUNT);
                    let slot = overlay.slot_of_option(option).unwrap_or(0);
                    let from = overlay.answer(slot).map(|a| a.center()).unwrap_or_default();
                    let to = overlay.statement().center();
                    engine.on_gesture(GestureEvent::new(GestureKind::Start, 1, from, now));
                    engine.on_gesture(GestureEvent::new(GestureKind::Move, 1, to, now + 150.0));
                    engine.on_gesture(GestureEvent::new(GestureKind::End, 1, to, now + 300.0));
                    now += 300.0;
                }
                now += FRAME_MS as f64;
                engine.on_frame(now);
            } else if engine.player().is_playing() {
                let next = (engine.player().current_time_ms() + TICK_MS).min(duration);
                engine.player_mut().time_ms = next;
                engine.poll_clock();
                now += TICK_MS as f64;
                if next >= duration && engine.overlay().is_none() {
                    score = engine.score();
                    engine.on_ended();
                }
            } else {
                break;
            }

            for event in engine.drain_events() {
                match event {
                    EngineEvent::BubblePresented { bubble_id } => {
                        log::info!("Presented {}", bubble_id)
                    }
                    EngineEvent::BubbleAnswered {
                        bubble_id,
                        is_correct,
                    } => log::info!(
                        "Answered {}: {}",
                        bubble_id,
                        if is_correct { "correct" } else { "incorrect" }
                    ),
                    EngineEvent::Completed { video_id } => {
                        log::info!("Completed {}", video_id);
                        engine.teardown();
                        return Ok(score);
                    }
                    EngineEvent::SessionRestarted => log::info!("Session restarted"),
                }
            }
        }

        log::warn!("Stopped before the video completed");
        engine.teardown();
        Ok(engine.score())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    bubble_timeline::platform::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(video_path) = args.first() else {
        eprintln!("usage: bubble-timeline <video.json> [settings.json]");
        std::process::exit(2);
    };

    match headless::run(video_path, args.get(1).map(String::as_str)) {
        Ok(score) => println!("Answered {} bubble(s), {} correct", score.answered, score.correct),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}
