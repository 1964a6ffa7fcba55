// File: rhtmx-validity/wasm/src/convert.rs
// Purpose: Turn JS values (strings, functions, objects, Promises) into typed messages and verdicts

use js_sys::{Function, Object, Promise, Reflect};
use rhtmx_validity_core::sink::{renderer, Renderer};
use rhtmx_validity_core::{Constraint, ErrorMessage, ErrorMessages, Field, Message, ValidityError, Verdict};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Element;

use crate::host::{JsPayload, WebHost};

/// Event types passed to the constructor: one string, a list, or nothing
#[derive(Deserialize)]
#[serde(untagged)]
enum EventTypes {
    One(String),
    Many(Vec<String>),
}

pub fn event_types(value: JsValue) -> Result<Vec<String>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Vec::new());
    }

    let types: EventTypes = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse event types: {}", e)))?;
    Ok(match types {
        EventTypes::One(event) => vec![event],
        EventTypes::Many(events) => events,
    })
}

/// Property of a JS object, `None` when absent
pub fn property(target: &JsValue, key: &str) -> Option<JsValue> {
    if !target.is_object() {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// Copy the plain (serde-readable) keys of `source` into a fresh object
pub fn plain_object(source: &JsValue, keys: &[&str]) -> JsValue {
    let plain = Object::new();
    for key in keys {
        if let Some(value) = property(source, key) {
            // Setting a property on a fresh object cannot fail
            let _ = Reflect::set(&plain, &JsValue::from_str(key), &value);
        }
    }
    plain.into()
}

/// Text of a thrown value or rejection reason
pub fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|err| String::from(err.message())))
        .unwrap_or_else(|| format!("{:?}", value))
}

pub fn to_js_error(err: ValidityError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn call_with_field(function: &Function, field: &Field<'_, WebHost>) -> anyhow::Result<JsPayload> {
    function
        .call1(&JsValue::NULL, field.node().as_ref())
        .map(JsPayload)
        .map_err(|thrown| anyhow::anyhow!(describe(&thrown)))
}

/// A static value, or a function of the field element
pub fn message(value: JsValue) -> Message<WebHost> {
    match value.dyn_into::<Function>() {
        Ok(function) => Message::try_computed(move |field| call_with_field(&function, field)),
        Err(value) => Message::Static(JsPayload(value)),
    }
}

/// `string | (field) => any | { message, render? }`
///
/// A missing `render` defers to the observer's `renderByDefault`.
pub fn error_message(value: JsValue) -> ErrorMessage<WebHost> {
    if let Some(function) = value.dyn_ref::<Function>() {
        let function = function.clone();
        return ErrorMessage::try_dynamic(move |field| call_with_field(&function, field));
    }

    if value.is_object() && Reflect::has(&value, &JsValue::from_str("message")).unwrap_or(false) {
        let inner = property(&value, "message").unwrap_or(JsValue::UNDEFINED);
        return ErrorMessage::Detailed {
            message: message(inner),
            render: property(&value, "render").and_then(|render| render.as_bool()),
        };
    }

    ErrorMessage::Literal(JsPayload(value))
}

/// A validator's return value: anything falsy passes, anything else fails
fn settled_message(value: JsValue) -> Option<ErrorMessage<WebHost>> {
    if !value.is_truthy() {
        None
    } else {
        Some(error_message(value))
    }
}

fn verdict(function: &Function, field: &Field<'_, WebHost>) -> Verdict<WebHost> {
    let returned = match function.call1(&JsValue::NULL, field.node().as_ref()) {
        Ok(returned) => returned,
        Err(thrown) => {
            let reason = describe(&thrown);
            return Verdict::pending(async move { Err(anyhow::anyhow!(reason)) });
        }
    };

    match returned.dyn_into::<Promise>() {
        Ok(promise) => Verdict::pending(async move {
            match JsFuture::from(promise).await {
                Ok(value) => Ok(settled_message(value)),
                Err(reason) => Err(anyhow::anyhow!(describe(&reason))),
            }
        }),
        Err(value) => Verdict::from(settled_message(value)),
    }
}

/// `{ required?, minlength?, ..., badinput?, validate? }`
pub fn error_messages(value: &JsValue) -> Result<ErrorMessages<WebHost>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ErrorMessages::new());
    }
    if !value.is_object() {
        return Err(JsValue::from_str("Error configuration must be an object"));
    }

    let mut errors = Constraint::PRIORITY
        .iter()
        .fold(ErrorMessages::new(), |errors, constraint| {
            match property(value, constraint.as_str()) {
                Some(spec) => errors.with(*constraint, error_message(spec)),
                None => errors,
            }
        });

    if let Some(validate) = property(value, "validate") {
        let function = validate
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from_str("`validate` must be a function"))?;
        errors = errors.validate(move |field| verdict(&function, field));
    }

    Ok(errors)
}

/// `(container, payload) => void`
pub fn js_renderer(function: Function) -> Renderer<WebHost> {
    renderer::<WebHost, _>(move |_, container: &Element, payload: &JsPayload| {
        if let Err(thrown) = function.call2(&JsValue::NULL, container.as_ref(), &payload.0) {
            tracing::warn!(error = %describe(&thrown), "renderer threw");
        }
    })
}

/// `(element) => void`
pub fn js_scroller(function: Function) -> impl Fn(&WebHost, &Element) + 'static {
    move |_: &WebHost, element: &Element| {
        if let Err(thrown) = function.call1(&JsValue::NULL, element.as_ref()) {
            tracing::warn!(error = %describe(&thrown), "scroller threw");
        }
    }
}
