// File: rhtmx-validity/wasm/src/host.rs
// Purpose: web-sys implementation of the validity Host

use rhtmx_validity_core::{Host, Payload, ValidityFlags};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, ValidityState,
};

/// Any JS value used as an error message
#[derive(Debug, Clone, PartialEq)]
pub struct JsPayload(pub JsValue);

impl From<String> for JsPayload {
    fn from(text: String) -> Self {
        JsPayload(JsValue::from_str(&text))
    }
}

impl Payload for JsPayload {
    fn as_text(&self) -> Option<String> {
        self.0.as_string()
    }
}

/// Constraint-validation capable element
enum Control {
    Input(HtmlInputElement),
    Select(HtmlSelectElement),
    TextArea(HtmlTextAreaElement),
    Button(HtmlButtonElement),
}

impl Control {
    fn of(element: &Element) -> Option<Self> {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return Some(Control::Input(input.clone()));
        }
        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            return Some(Control::Select(select.clone()));
        }
        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            return Some(Control::TextArea(textarea.clone()));
        }
        element
            .dyn_ref::<HtmlButtonElement>()
            .map(|button| Control::Button(button.clone()))
    }

    fn value(&self) -> String {
        match self {
            Control::Input(el) => el.value(),
            Control::Select(el) => el.value(),
            Control::TextArea(el) => el.value(),
            Control::Button(el) => el.value(),
        }
    }

    fn will_validate(&self) -> bool {
        match self {
            Control::Input(el) => el.will_validate(),
            Control::Select(el) => el.will_validate(),
            Control::TextArea(el) => el.will_validate(),
            Control::Button(el) => el.will_validate(),
        }
    }

    fn validity(&self) -> ValidityState {
        match self {
            Control::Input(el) => el.validity(),
            Control::Select(el) => el.validity(),
            Control::TextArea(el) => el.validity(),
            Control::Button(el) => el.validity(),
        }
    }

    fn validation_message(&self) -> Result<String, JsValue> {
        match self {
            Control::Input(el) => el.validation_message(),
            Control::Select(el) => el.validation_message(),
            Control::TextArea(el) => el.validation_message(),
            Control::Button(el) => el.validation_message(),
        }
    }

    fn set_custom_validity(&self, message: &str) {
        match self {
            Control::Input(el) => el.set_custom_validity(message),
            Control::Select(el) => el.set_custom_validity(message),
            Control::TextArea(el) => el.set_custom_validity(message),
            Control::Button(el) => el.set_custom_validity(message),
        }
    }
}

/// The live browser document
#[derive(Debug, Clone)]
pub struct WebHost {
    document: Document,
}

impl WebHost {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Host for `window.document`
    pub fn from_window() -> Result<Self, JsValue> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
            .ok_or_else(|| JsValue::from_str("No document available"))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Host for WebHost {
    type Node = Element;
    type Payload = JsPayload;

    fn controls(&self, form: &Element) -> Vec<Element> {
        let Some(form) = form.dyn_ref::<HtmlFormElement>() else {
            tracing::debug!("observed element is not a form; it has no controls");
            return Vec::new();
        };

        let elements = form.elements();
        (0..elements.length())
            .filter_map(|index| elements.item(index))
            .collect()
    }

    fn name(&self, node: &Element) -> Option<String> {
        node.get_attribute("name")
    }

    fn is_radio(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(|input| input.type_().eq_ignore_ascii_case("radio"))
    }

    fn will_validate(&self, node: &Element) -> bool {
        Control::of(node).is_some_and(|control| control.will_validate())
    }

    fn value(&self, node: &Element) -> String {
        Control::of(node).map(|control| control.value()).unwrap_or_default()
    }

    fn validity(&self, node: &Element) -> ValidityFlags {
        let Some(state) = Control::of(node).map(|control| control.validity()) else {
            return ValidityFlags::default();
        };

        ValidityFlags {
            value_missing: state.value_missing(),
            too_short: state.too_short(),
            range_underflow: state.range_underflow(),
            too_long: state.too_long(),
            range_overflow: state.range_overflow(),
            step_mismatch: state.step_mismatch(),
            type_mismatch: state.type_mismatch(),
            pattern_mismatch: state.pattern_mismatch(),
            bad_input: state.bad_input(),
            custom_error: state.custom_error(),
        }
    }

    fn validation_message(&self, node: &Element) -> String {
        match Control::of(node).map(|control| control.validation_message()) {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                tracing::debug!(?err, "validationMessage unavailable");
                String::new()
            }
            None => String::new(),
        }
    }

    fn set_custom_validity(&self, node: &Element, message: &str) {
        if let Some(control) = Control::of(node) {
            control.set_custom_validity(message);
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(err) = node.set_attribute(name, value) {
            tracing::warn!(attribute = name, ?err, "failed to set attribute");
        }
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn focus(&self, node: &Element) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(err) = element.focus() {
            tracing::debug!(?err, "element refused focus");
        }
    }

    fn scroll_into_view(&self, node: &Element) {
        node.scroll_into_view();
    }
}
