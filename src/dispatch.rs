//! Event dispatch over the fixed set of host events.
//!
//! Events run one at a time in arrival order. Posting from inside a handler
//! queues the event behind the one being handled instead of re-entering the
//! controller.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::Result;
use crate::controller::{Controller, Event, EventKind, Outcome, Surface};

type Handler = Box<dyn FnMut(&Result<Outcome>)>;

struct Inner<S> {
    controller: Controller<S>,
    handlers: Vec<(EventKind, Handler)>,
}

pub struct Dispatcher<S> {
    inner: Mutex<Inner<S>>,
    pending: Mutex<VecDeque<Event>>,
}

impl<S: Surface> Dispatcher<S> {
    pub fn new(controller: Controller<S>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                controller,
                handlers: Vec::new(),
            }),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Register `handler` to observe the result of every `kind` event.
    pub fn on<F>(self, kind: EventKind, handler: F) -> Self
    where
        F: FnMut(&Result<Outcome>) + 'static,
    {
        self.inner.lock().handlers.push((kind, Box::new(handler)));
        self
    }

    /// Queue `event` and run everything pending.
    ///
    /// Returns the results of the events this call ran. A call made while
    /// another is running returns nothing; its event runs in the outer call.
    pub fn post(&self, event: Event) -> Vec<Result<Outcome>> {
        self.pending.lock().push_back(event);

        let mut results = Vec::new();
        loop {
            let Some(mut inner) = self.inner.try_lock() else {
                debug!("dispatch in progress, event queued");
                break;
            };

            loop {
                let Some(event) = self.pending.lock().pop_front() else {
                    break;
                };
                let kind = event.kind();
                let result = inner.controller.handle(event);
                if let Err(report) = &result {
                    error!(?kind, "event failed: {:?}", report);
                }
                for (_, handler) in inner.handlers.iter_mut().filter(|(k, _)| *k == kind) {
                    handler(&result);
                }
                results.push(result);
            }
            drop(inner);

            if self.pending.lock().is_empty() {
                break;
            }
        }
        results
    }

    /// Run `f` against the controller. `None` while an event is being handled.
    pub fn with_controller<R>(&self, f: impl FnOnce(&Controller<S>) -> R) -> Option<R> {
        self.inner.try_lock().map(|inner| f(&inner.controller))
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}
