// File: rhtmx-validity/core/src/config.rs
// Purpose: Construction-time observer configuration and per-call options

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::host::Host;
use crate::messages::ErrorMessages;
use crate::sink::{render_markup, ErrorSink, Renderer};

/// Plain observer options, deserializable from a JS object or a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverOptions {
    /// Event types that trigger validation; empty means manual validation only
    #[serde(default)]
    pub events: Vec<String>,

    /// Listen during the capture phase instead of the bubble phase
    #[serde(default)]
    pub use_event_capture: bool,

    /// Event type that re-validates fields already marked for revalidation
    #[serde(default)]
    pub revalidate_on: Option<String>,

    /// Render flag for literal and dynamic messages
    #[serde(default)]
    pub render_by_default: bool,
}

impl ObserverOptions {
    /// Every event type a listener is needed for, without duplicates
    pub fn listened_events(&self) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for event in self.events.iter().chain(self.revalidate_on.iter()) {
            if !events.contains(event) {
                events.push(event.clone());
            }
        }
        events
    }
}

/// Options accepted by `validate_field` and `validate_fields`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOptions {
    /// Focus and scroll to the (first) failing field
    #[serde(default)]
    pub focus: bool,

    /// Re-validate the field on the `revalidate_on` event from now on
    #[serde(default)]
    pub enforce_revalidation: bool,
}

impl ValidateOptions {
    pub fn focused() -> Self {
        Self {
            focus: true,
            ..Self::default()
        }
    }
}

/// Brings a failing field (or radio group container) into view
pub type Scroller<H> = Rc<dyn Fn(&H, &<H as Host>::Node)>;

/// Default scroller
pub fn scroll_into_view<H: Host>(host: &H, node: &H::Node) {
    host.scroll_into_view(node);
}

/// Full observer configuration
pub struct ValidityConfig<H: Host> {
    pub options: ObserverOptions,
    pub default_errors: ErrorMessages<H>,
    pub renderer: Renderer<H>,
    pub scroller: Scroller<H>,
    /// Replaces the document-writing sink, e.g. with a recorder in tests
    pub sink: Option<Rc<dyn ErrorSink<H>>>,
}

impl<H: Host> ValidityConfig<H> {
    pub fn new() -> Self {
        Self::from_options(ObserverOptions::default())
    }

    pub fn from_options(options: ObserverOptions) -> Self {
        Self {
            options,
            default_errors: ErrorMessages::new(),
            renderer: Rc::new(render_markup::<H>),
            scroller: Rc::new(scroll_into_view::<H>),
            sink: None,
        }
    }

    /// Validate automatically on these event types
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_event_capture(mut self, capture: bool) -> Self {
        self.options.use_event_capture = capture;
        self
    }

    pub fn with_revalidate_on(mut self, event: impl Into<String>) -> Self {
        self.options.revalidate_on = Some(event.into());
        self
    }

    pub fn with_render_by_default(mut self, render: bool) -> Self {
        self.options.render_by_default = render;
        self
    }

    /// Observer-wide messages used when a field has none for a constraint
    pub fn with_default_errors(mut self, errors: ErrorMessages<H>) -> Self {
        self.default_errors = errors;
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&H, &H::Node, &H::Payload) + 'static,
    {
        self.renderer = Rc::new(renderer);
        self
    }

    pub fn with_scroller<F>(mut self, scroller: F) -> Self
    where
        F: Fn(&H, &H::Node) + 'static,
    {
        self.scroller = Rc::new(scroller);
        self
    }

    pub fn with_sink(mut self, sink: Rc<dyn ErrorSink<H>>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl<H: Host> Default for ValidityConfig<H> {
    fn default() -> Self {
        Self::new()
    }
}
