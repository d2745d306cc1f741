//! Render controller: owns the surface handle and turns host events into
//! surface calls.

use error_stack::{Report, ResultExt};
use tracing::{debug, info, warn};

use crate::frame::{Envelope, Frame};
use crate::style::PlotStyle;
use crate::trace::{ScatterTrace, TraceOptions};
use crate::{Result, VizError};

/// Something the charting library can draw into.
pub trait Surface {
    /// Prepare the empty plot. Called once, on [`Event::Ready`].
    fn init(&mut self) -> Result<()>;

    /// Replace everything on the surface with `trace`.
    fn draw(&mut self, trace: &ScatterTrace, style: Option<&PlotStyle>) -> Result<()>;

    /// Re-layout to the current viewport size.
    fn resize(&mut self) -> Result<()>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn draw(&mut self, trace: &ScatterTrace, style: Option<&PlotStyle>) -> Result<()> {
        (**self).draw(trace, style)
    }

    fn resize(&mut self) -> Result<()> {
        (**self).resize()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Resize,
    Message,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Ready, EventKind::Resize, EventKind::Message];

    /// Name of the window event that delivers this kind.
    pub const fn dom_event(self) -> &'static str {
        match self {
            EventKind::Ready => "load",
            EventKind::Resize => "resize",
            EventKind::Message => "message",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    Ready,
    Resize,
    Message(Envelope),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready => EventKind::Ready,
            Event::Resize => EventKind::Resize,
            Event::Message(_) => EventKind::Message,
        }
    }

    /// A message whose `data` field holds `text`.
    pub fn frame_text(text: impl Into<String>) -> Self {
        Event::Message(Envelope::with_text(text))
    }
}

/// What handling an event did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Initialized,
    Resized,
    Drawn { points: usize },
    /// The event needed nothing from us.
    Ignored,
}

pub struct Controller<S> {
    surface: S,
    ready: bool,
    style: Option<PlotStyle>,
    options: TraceOptions,
    last_trace: Option<ScatterTrace>,
    frames_drawn: u64,
}

impl<S: Surface> Controller<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            ready: false,
            style: None,
            options: TraceOptions::default(),
            last_trace: None,
            frames_drawn: 0,
        }
    }

    pub fn with_style(mut self, style: impl Into<Option<PlotStyle>>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_options(mut self, options: TraceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn handle(&mut self, event: Event) -> Result<Outcome> {
        match event {
            Event::Ready => self.on_ready(),
            Event::Resize => self.on_resize(),
            Event::Message(envelope) => self.on_message(&envelope),
        }
    }

    fn on_ready(&mut self) -> Result<Outcome> {
        if self.ready {
            warn!("surface already initialized, ignoring ready event");
            return Ok(Outcome::Ignored);
        }
        self.surface.init().attach("initializing surface")?;
        self.ready = true;
        info!("surface ready");
        Ok(Outcome::Initialized)
    }

    fn on_resize(&mut self) -> Result<Outcome> {
        if !self.ready {
            debug!("resize before surface is ready, nothing to lay out");
            return Ok(Outcome::Ignored);
        }
        self.surface.resize().attach("resizing surface")?;
        Ok(Outcome::Resized)
    }

    fn on_message(&mut self, envelope: &Envelope) -> Result<Outcome> {
        let text = match envelope.frame_text() {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("message without frame data, ignoring");
                return Ok(Outcome::Ignored);
            }
            Err(e) => {
                return Err(Report::new(e).change_context(VizError::MalformedPayload));
            }
        };

        if !self.ready {
            return Err(Report::new(VizError::SurfaceNotReady)
                .attach("frame received before the surface was initialized"));
        }

        let frame = Frame::decode(text).change_context(VizError::MalformedPayload)?;
        self.draw_frame(&frame)
    }

    /// Build and draw a trace for an already decoded frame.
    pub fn draw_frame(&mut self, frame: &Frame) -> Result<Outcome> {
        if !self.ready {
            return Err(Report::new(VizError::SurfaceNotReady));
        }

        let (trace, notes) = ScatterTrace::build(frame, &self.options);
        if !notes.unrecognized.is_empty() {
            debug!(columns = ?notes.unrecognized, "ignoring unrecognized columns");
        }
        if notes.rows_with_blank_color > 0 {
            warn!(
                rows = notes.rows_with_blank_color,
                "blank colour components formatted verbatim"
            );
        }

        self.surface
            .draw(&trace, self.style.as_ref())
            .attach("drawing trace")?;

        let points = trace.len();
        self.frames_drawn += 1;
        self.last_trace = Some(trace);
        debug!(points, frame = self.frames_drawn, "trace drawn");
        Ok(Outcome::Drawn { points })
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn last_trace(&self) -> Option<&ScatterTrace> {
        self.last_trace.as_ref()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn style(&self) -> Option<&PlotStyle> {
        self.style.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
