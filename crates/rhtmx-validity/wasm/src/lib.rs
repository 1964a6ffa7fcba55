//! RHTMX Validity WASM
//!
//! WebAssembly bindings for the RHTMX validity observer.
//! Wires the core engine to the live DOM and exposes a `FormValidityObserver`
//! class to JavaScript.

use std::cell::RefCell;

use js_sys::Function;
use rhtmx_validity_core::{ObserverOptions, Outcome, ValidateOptions, ValidityConfig, ValidityObserver};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Element, Event};

pub mod convert;
pub mod host;

pub use host::{JsPayload, WebHost};

use convert::{describe, to_js_error};

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse_options<T: for<'de> Deserialize<'de> + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))
}

/// Hand an outcome to JavaScript: a boolean, or a Promise of one
fn outcome_to_js(outcome: Outcome) -> JsValue {
    match outcome {
        Outcome::Ready(valid) => JsValue::from_bool(valid),
        Outcome::Pending(pending) => future_to_promise(async move {
            pending.await.map(JsValue::from_bool).map_err(to_js_error)
        })
        .into(),
    }
}

struct Listener {
    event: String,
    callback: Closure<dyn FnMut(Event)>,
}

/// Observes a form and validates its fields
///
/// # Example (JavaScript)
/// ```javascript
/// const observer = new FormValidityObserver('focusout', { revalidateOn: 'input' });
/// observer.observe(document.querySelector('form'));
/// observer.configure('age', { min: 'You must be 18 or older' });
/// const valid = await observer.validateFields(null, { focus: true });
/// ```
#[wasm_bindgen]
pub struct FormValidityObserver {
    inner: ValidityObserver<WebHost>,
    listeners: RefCell<Vec<Listener>>,
    observed: RefCell<Option<Element>>,
}

#[wasm_bindgen]
impl FormValidityObserver {
    /// `types`: event type(s) that trigger validation, or `null` for manual mode.
    /// `options`: `{ useEventCapture, revalidateOn, renderByDefault, renderer, scroller, defaultErrors }`
    #[wasm_bindgen(constructor)]
    pub fn new(types: JsValue, options: JsValue) -> Result<FormValidityObserver, JsValue> {
        let plain = convert::plain_object(&options, &["useEventCapture", "revalidateOn", "renderByDefault"]);
        let mut observer_options: ObserverOptions = parse_options(plain)?;
        observer_options.events = convert::event_types(types)?;

        let mut config = ValidityConfig::from_options(observer_options)
            .with_default_errors(convert::error_messages(
                &convert::property(&options, "defaultErrors").unwrap_or(JsValue::UNDEFINED),
            )?);

        if let Some(renderer) = convert::property(&options, "renderer") {
            let renderer = renderer
                .dyn_into::<Function>()
                .map_err(|_| JsValue::from_str("`renderer` must be a function"))?;
            config.renderer = convert::js_renderer(renderer);
        }
        if let Some(scroller) = convert::property(&options, "scroller") {
            let scroller = scroller
                .dyn_into::<Function>()
                .map_err(|_| JsValue::from_str("`scroller` must be a function"))?;
            config = config.with_scroller(convert::js_scroller(scroller));
        }

        Ok(FormValidityObserver {
            inner: ValidityObserver::new(WebHost::from_window()?, config),
            listeners: RefCell::new(Vec::new()),
            observed: RefCell::new(None),
        })
    }

    /// Start observing `form`; `false` if it already was
    pub fn observe(&self, form: Element) -> Result<bool, JsValue> {
        if !self.inner.observe(form.clone()).map_err(to_js_error)? {
            return Ok(false);
        }

        *self.observed.borrow_mut() = Some(form.clone());

        let capture = self.inner.options().use_event_capture;
        let mut listeners = self.listeners.borrow_mut();
        for event in self.inner.options().listened_events() {
            let observer = self.inner.clone();
            let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let Some(target) = event.target().and_then(|target| target.dyn_into::<Element>().ok()) else {
                    return;
                };

                match observer.handle_event(&event.type_(), &target) {
                    Ok(Some(outcome)) if outcome.is_pending() => spawn_local(async move {
                        if let Err(err) = outcome.await {
                            tracing::warn!(error = %err, "event-driven validation rejected");
                        }
                    }),
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %err, "event-driven validation failed"),
                }
            });

            form.add_event_listener_with_callback_and_bool(&event, callback.as_ref().unchecked_ref(), capture)?;
            listeners.push(Listener { event, callback });
        }
        Ok(true)
    }

    /// Stop observing `form`; `false` if it was not the observed form
    pub fn unobserve(&self, form: Element) -> bool {
        if !self.inner.unobserve(&form) {
            return false;
        }
        self.remove_listeners();
        true
    }

    /// Stop observing whatever form is observed
    pub fn disconnect(&self) {
        self.inner.disconnect();
        self.remove_listeners();
    }

    /// Register error messages and an optional `validate` function for a field
    pub fn configure(&self, name: &str, errors: JsValue) -> Result<(), JsValue> {
        let errors = convert::error_messages(&errors)?;
        self.inner.configure(name, errors);
        Ok(())
    }

    /// Returns a boolean, or a Promise of one when a validator is asynchronous
    #[wasm_bindgen(js_name = validateField)]
    pub fn validate_field(&self, name: &str, options: JsValue) -> Result<JsValue, JsValue> {
        let options: ValidateOptions = parse_options(options)?;
        let outcome = self.inner.validate_field(name, options).map_err(to_js_error)?;
        Ok(outcome_to_js(outcome))
    }

    /// `validateFields(names?, { focus?, enforceRevalidation? })`
    ///
    /// `names` restricts validation to those fields; `null` or `undefined`
    /// validates every named field. Returns a boolean, or a Promise of one
    /// when any validator is asynchronous.
    #[wasm_bindgen(js_name = validateFields)]
    pub fn validate_fields(&self, names: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
        let names: Option<Vec<String>> = parse_options(names)?;
        let options: ValidateOptions = parse_options(options)?;
        let names: Option<Vec<&str>> = names
            .as_ref()
            .map(|names| names.iter().map(String::as_str).collect());

        let outcome = self
            .inner
            .validate_fields(names.as_deref(), options)
            .map_err(to_js_error)?;
        Ok(outcome_to_js(outcome))
    }

    /// `message`: a string, any value to render, or a function of the field element
    #[wasm_bindgen(js_name = setFieldError)]
    pub fn set_field_error(&self, name: &str, message: JsValue, render: Option<bool>) -> Result<(), JsValue> {
        self.inner
            .set_field_error(name, convert::message(message), render.unwrap_or(false))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = clearFieldError)]
    pub fn clear_field_error(&self, name: &str) -> Result<(), JsValue> {
        self.inner.clear_field_error(name).map_err(to_js_error)
    }
}

impl FormValidityObserver {
    fn remove_listeners(&self) {
        let Some(form) = self.observed.borrow_mut().take() else {
            return;
        };

        let capture = self.inner.options().use_event_capture;
        for listener in self.listeners.borrow_mut().drain(..) {
            let callback: &Function = listener.callback.as_ref().unchecked_ref();
            if let Err(err) = form.remove_event_listener_with_callback_and_bool(&listener.event, callback, capture) {
                tracing::warn!(event = %listener.event, error = %describe(&err), "failed to remove listener");
            }
        }
    }
}

impl Drop for FormValidityObserver {
    fn drop(&mut self) {
        self.remove_listeners();
    }
}
