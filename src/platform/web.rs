//! Browser adapters over `web-sys`

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Element, HtmlAudioElement, HtmlElement, HtmlMediaElement};

use crate::audio::AudioSink;
use crate::drag::{DragObject, DragRole, VisualState};
use crate::error::HostError;
use crate::host::{HostPlayer, OverlaySurface, PointerId};
use crate::model::OPTION_COUNT;
use crate::overlay::Overlay;
use crate::sim::Container;

fn js_err(e: JsValue) -> HostError {
    HostError::Rejected(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

/// Let a play() promise settle in the background; rejections are only logged
fn detach(promise: js_sys::Promise, what: &'static str) {
    spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("{} rejected: {:?}", what, e);
        }
    });
}

/// `<video>` / `<audio>` element as the host player
pub struct MediaElementPlayer {
    media: HtmlMediaElement,
}

impl MediaElementPlayer {
    pub fn new(media: HtmlMediaElement) -> Self {
        Self { media }
    }
}

impl HostPlayer for MediaElementPlayer {
    fn pause(&mut self) -> Result<(), HostError> {
        self.media.pause().map_err(js_err)
    }

    fn play(&mut self) -> Result<(), HostError> {
        let promise = self.media.play().map_err(js_err)?;
        detach(promise, "Media play");
        Ok(())
    }

    fn current_time_ms(&self) -> u64 {
        (self.media.current_time() * 1000.0).max(0.0) as u64
    }

    fn seek_to(&mut self, ms: u64) -> Result<(), HostError> {
        self.media.set_current_time(ms as f64 / 1000.0);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        !self.media.paused() && !self.media.ended()
    }
}

/// Overlay element: bounds and pointer capture
pub struct ElementSurface {
    element: Element,
}

impl ElementSurface {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl OverlaySurface for ElementSurface {
    fn container(&self) -> Container {
        let rect = self.element.get_bounding_client_rect();
        Container::new(rect.width() as f32, rect.height() as f32)
    }

    fn capture_pointer(&mut self, pointer: PointerId) -> Result<(), HostError> {
        self.element.set_pointer_capture(pointer).map_err(js_err)
    }

    fn release_pointer(&mut self, pointer: PointerId) -> Result<(), HostError> {
        self.element.release_pointer_capture(pointer).map_err(js_err)
    }
}

/// Plays feedback sounds through fresh `<audio>` elements
#[derive(Debug, Default)]
pub struct HtmlAudioSink;

impl AudioSink for HtmlAudioSink {
    fn play(&mut self, url: &str, volume: f32) -> Result<(), HostError> {
        let audio = HtmlAudioElement::new_with_src(url).map_err(js_err)?;
        audio.set_volume(volume as f64);
        let promise = audio.play().map_err(js_err)?;
        detach(promise, "Feedback sound");
        Ok(())
    }
}

/// Mirrors the mounted overlay into absolutely positioned `<div>`s
pub struct OverlayView {
    document: Document,
    root: Element,
    /// Statement first, then answers by slot
    nodes: Vec<HtmlElement>,
    bubble_id: Option<String>,
}

impl OverlayView {
    pub fn new(document: Document, root: Element) -> Self {
        Self {
            document,
            root,
            nodes: Vec::new(),
            bubble_id: None,
        }
    }

    /// Bring the DOM in line with the engine's overlay (or its absence)
    pub fn sync(&mut self, overlay: Option<&Overlay>) -> Result<(), JsValue> {
        let Some(overlay) = overlay else {
            if self.bubble_id.take().is_some() {
                self.clear();
                self.root.remove_attribute("data-active")?;
            }
            return Ok(());
        };

        if self.bubble_id.as_deref() != Some(overlay.bubble().id.as_str()) {
            self.clear();
            self.build(overlay)?;
            self.root.set_attribute("data-active", "true")?;
            self.bubble_id = Some(overlay.bubble().id.clone());
        }

        let objects = std::iter::once(overlay.statement())
            .chain((0..OPTION_COUNT).filter_map(|slot| overlay.answer(slot)));
        for (node, object) in self.nodes.iter().zip(objects) {
            place(node, object)?;
        }
        Ok(())
    }

    fn build(&mut self, overlay: &Overlay) -> Result<(), JsValue> {
        let objects = std::iter::once(overlay.statement())
            .chain((0..OPTION_COUNT).filter_map(|slot| overlay.answer(slot)));
        for object in objects {
            let node: HtmlElement = self.document.create_element("div")?.dyn_into()?;
            node.set_text_content(Some(&object.label));
            self.root.append_child(&node)?;
            self.nodes.push(node);
        }
        Ok(())
    }

    fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            node.remove();
        }
    }
}

fn place(node: &HtmlElement, object: &DragObject) -> Result<(), JsValue> {
    let role = match object.role {
        DragRole::Statement => "statement",
        DragRole::Answer { .. } => "answer",
    };
    let visual = match object.visual {
        VisualState::Resting => "",
        VisualState::Dragging => " dragging",
        VisualState::Absorbing => " absorbing",
        VisualState::Shaking => " shaking",
    };
    node.set_class_name(&format!("bubble {role}{visual}"));

    let r = object.radius();
    let pos = object.center();
    let style = node.style();
    style.set_property("position", "absolute")?;
    style.set_property("width", &format!("{}px", object.size))?;
    style.set_property("height", &format!("{}px", object.size))?;
    style.set_property("left", &format!("{}px", pos.x - r))?;
    style.set_property("top", &format!("{}px", pos.y - r))?;
    style.set_property("transform", &format!("scale({})", object.scale))?;
    Ok(())
}
