// File: rhtmx-validity/core/src/host.rs
// Purpose: The DOM capabilities the validity engine relies on

use std::fmt;

use crate::constraint::ValidityFlags;

/// Error payload handed to error containers
///
/// Plain-text messages must be representable as text; anything else can only
/// be painted by a renderer.
pub trait Payload: Clone + fmt::Debug + From<String> + 'static {
    /// Text form of the payload, if it has one
    fn as_text(&self) -> Option<String>;
}

impl Payload for String {
    fn as_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Payload for serde_json::Value {
    fn as_text(&self) -> Option<String> {
        match self {
            serde_json::Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }
}

/// Document backend the observer reads from and writes to
///
/// Implemented by `web-sys` in the browser and by
/// [`MemoryDocument`](crate::memory::MemoryDocument) for headless use.
pub trait Host: 'static {
    /// Element handle
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Error message payload
    type Payload: Payload;

    /// Listed controls of a form, in document order
    fn controls(&self, form: &Self::Node) -> Vec<Self::Node>;

    /// The control's `name`, if any
    fn name(&self, node: &Self::Node) -> Option<String>;

    /// Whether the control is an `<input type="radio">`
    fn is_radio(&self, node: &Self::Node) -> bool;

    /// Whether the control takes part in constraint validation
    fn will_validate(&self, node: &Self::Node) -> bool;

    fn value(&self, node: &Self::Node) -> String;

    /// Live constraint-violation flags
    fn validity(&self, node: &Self::Node) -> ValidityFlags;

    /// The platform's message for the current violation
    fn validation_message(&self, node: &Self::Node) -> String;

    /// Native custom validity; an empty message clears it
    fn set_custom_validity(&self, node: &Self::Node, message: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn set_text_content(&self, node: &Self::Node, text: &str);

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    fn focus(&self, node: &Self::Node);

    fn scroll_into_view(&self, node: &Self::Node);
}

/// Read-only view of a field, passed to dynamic messages and custom validators
pub struct Field<'a, H: Host> {
    host: &'a H,
    node: &'a H::Node,
    name: &'a str,
}

impl<'a, H: Host> Field<'a, H> {
    pub fn new(host: &'a H, node: &'a H::Node, name: &'a str) -> Self {
        Self { host, node, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// The underlying control (the first member for radio groups)
    pub fn node(&self) -> &H::Node {
        self.node
    }

    pub fn host(&self) -> &H {
        self.host
    }

    pub fn value(&self) -> String {
        self.host.value(self.node)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.host.attribute(self.node, name)
    }

    pub fn validity(&self) -> ValidityFlags {
        self.host.validity(self.node)
    }

    pub fn validation_message(&self) -> String {
        self.host.validation_message(self.node)
    }
}

impl<H: Host> fmt::Debug for Field<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("node", self.node)
            .finish()
    }
}
