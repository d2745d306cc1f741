//! WASM API exports for JavaScript interop
//!
//! Binds the dispatcher to the window's `load`, `resize` and `message`
//! events and draws through the page's global `Plotly` object. Only
//! compiled when targeting wasm32.

#![cfg(target_arch = "wasm32")]

use std::rc::Rc;

use error_stack::Report;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::controller::{Controller, Event, EventKind, Surface};
use crate::dispatch::Dispatcher;
use crate::frame::Envelope;
use crate::style::PlotStyle;
use crate::trace::ScatterTrace;
use crate::{Result, VizError};

/// Element id the host page gives the plot container.
pub const DEFAULT_SURFACE_ID: &str = "plotly_div";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Plotly, js_name = newPlot, catch)]
    fn plotly_new_plot(
        id: &str,
        data: JsValue,
        layout: JsValue,
        config: JsValue,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["Plotly", "Plots"], js_name = resize, catch)]
    fn plotly_resize(id: &str) -> std::result::Result<JsValue, JsValue>;
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    crate::console::init(tracing::Level::DEBUG);
}

fn js_error(err: JsValue) -> Report<VizError> {
    let detail = err
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(&err)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| "unknown javascript error".to_string());
    Report::new(VizError::Surface).attach(detail)
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue> {
    let json = serde_json::to_string(value)
        .map_err(|e| Report::new(VizError::Surface).attach(e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(js_error)
}

fn report_to_js(report: Report<VizError>) -> JsValue {
    JsValue::from_str(&format!("{:?}", report))
}

/// Draws into a named element through `Plotly.newPlot`.
pub struct PlotlySurface {
    element_id: String,
}

impl PlotlySurface {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
        }
    }
}

impl Surface for PlotlySurface {
    fn init(&mut self) -> Result<()> {
        plotly_new_plot(
            &self.element_id,
            js_sys::Array::new().into(),
            JsValue::UNDEFINED,
            JsValue::UNDEFINED,
        )
        .map_err(js_error)?;
        Ok(())
    }

    fn draw(&mut self, trace: &ScatterTrace, style: Option<&PlotStyle>) -> Result<()> {
        let data = js_sys::Array::of1(&to_js(trace)?);
        let (layout, config) = match style {
            Some(style) => (to_js(&style.layout)?, to_js(&style.config)?),
            None => (JsValue::UNDEFINED, JsValue::UNDEFINED),
        };
        plotly_new_plot(&self.element_id, data.into(), layout, config).map_err(js_error)?;
        Ok(())
    }

    fn resize(&mut self) -> Result<()> {
        plotly_resize(&self.element_id).map_err(js_error)?;
        Ok(())
    }
}

/// Read the `data` field of a posted message into an envelope.
fn envelope_from(payload: &JsValue) -> Envelope {
    if payload.is_undefined() || payload.is_null() {
        return Envelope::default();
    }
    let data = match js_sys::Reflect::get(payload, &JsValue::from_str("data")) {
        Ok(data) => data,
        Err(_) => return Envelope::default(),
    };
    if let Some(text) = data.as_string() {
        return Envelope::with_text(text);
    }
    if data.is_undefined() || data.is_null() {
        return Envelope::default();
    }
    let value = js_sys::JSON::stringify(&data)
        .ok()
        .and_then(|s| s.as_string())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Bool(true));
    Envelope { data: Some(value) }
}

/// JavaScript handle for an embedded scatter view
#[wasm_bindgen]
pub struct ScatterEmbed {
    dispatcher: Rc<Dispatcher<PlotlySurface>>,
    attached: bool,
}

#[wasm_bindgen]
impl ScatterEmbed {
    /// Create a view drawing into the element `surface_id`
    ///
    /// # Arguments
    /// * `surface_id` - id of the plot container (defaults to `plotly_div`)
    /// * `style_json` - optional layout/config JSON; `"styled"` selects the built-in theme
    #[wasm_bindgen(constructor)]
    pub fn new(surface_id: Option<String>, style_json: Option<String>) -> std::result::Result<ScatterEmbed, JsValue> {
        let style = match style_json.as_deref() {
            None | Some("") => None,
            Some("styled") => Some(PlotStyle::styled()),
            Some(json) => Some(PlotStyle::from_json(json).map_err(report_to_js)?),
        };
        let surface =
            PlotlySurface::new(surface_id.unwrap_or_else(|| DEFAULT_SURFACE_ID.to_string()));
        let controller = Controller::new(surface).with_style(style);

        Ok(ScatterEmbed {
            dispatcher: Rc::new(Dispatcher::new(controller)),
            attached: false,
        })
    }

    /// Register window listeners for every host event
    ///
    /// If the page has already finished loading, the ready event is
    /// delivered immediately.
    #[wasm_bindgen]
    pub fn attach(&mut self) -> std::result::Result<(), JsValue> {
        if self.attached {
            web_sys::console::warn_1(&"ScatterEmbed already attached".into());
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        for kind in EventKind::ALL {
            let dispatcher = Rc::clone(&self.dispatcher);
            let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |evt: web_sys::Event| {
                let event = match kind {
                    EventKind::Ready => Event::Ready,
                    EventKind::Resize => Event::Resize,
                    EventKind::Message => match evt.dyn_ref::<web_sys::MessageEvent>() {
                        Some(msg) => Event::Message(envelope_from(&msg.data())),
                        None => return,
                    },
                };
                dispatcher.post(event);
            });
            window.add_event_listener_with_callback(
                kind.dom_event(),
                listener.as_ref().unchecked_ref(),
            )?;
            listener.forget();
        }
        self.attached = true;

        let loaded = window
            .document()
            .map(|doc| doc.ready_state() == "complete")
            .unwrap_or(false);
        if loaded {
            self.dispatcher.post(Event::Ready);
        }
        Ok(())
    }

    /// Draw a frame given as `{header, data}` JSON, bypassing the message channel
    #[wasm_bindgen(js_name = postFrame)]
    pub fn post_frame(&self, json: &str) -> std::result::Result<(), JsValue> {
        self.post(Event::frame_text(json))
    }

    /// Deliver the ready event by hand (for pages that call this after load)
    #[wasm_bindgen]
    pub fn ready(&self) -> std::result::Result<(), JsValue> {
        self.post(Event::Ready)
    }

    #[wasm_bindgen]
    pub fn resize(&self) -> std::result::Result<(), JsValue> {
        self.post(Event::Resize)
    }

    /// The most recently drawn trace as JSON
    #[wasm_bindgen(js_name = lastTraceJson)]
    pub fn last_trace_json(&self) -> Option<String> {
        self.dispatcher
            .with_controller(|c| c.last_trace().and_then(|t| serde_json::to_string(t).ok()))
            .flatten()
    }

    #[wasm_bindgen(getter, js_name = framesDrawn)]
    pub fn frames_drawn(&self) -> f64 {
        self.dispatcher
            .with_controller(|c| c.frames_drawn() as f64)
            .unwrap_or(0.0)
    }

    fn post(&self, event: Event) -> std::result::Result<(), JsValue> {
        match self.dispatcher.post(event).into_iter().find_map(|r| r.err()) {
            Some(report) => Err(report_to_js(report)),
            None => Ok(()),
        }
    }
}
