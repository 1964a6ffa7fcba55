// File: rhtmx-validity/core/src/sink.rs
// Purpose: The only writer of aria-invalid, error containers and native validity

use std::rc::Rc;

use crate::host::{Host, Payload};
use crate::messages::ErrorDisplay;
use crate::resolver::FieldTarget;

/// Attribute naming the accessible error container
pub const DESCRIBEDBY_ATTR: &str = "aria-describedby";
pub const INVALID_ATTR: &str = "aria-invalid";

/// Validation outcome for one field
#[derive(Debug, Clone, PartialEq)]
pub enum Report<P> {
    Pass,
    Fail(ErrorDisplay<P>),
}

impl<P> Report<P> {
    pub fn is_pass(&self) -> bool {
        matches!(self, Report::Pass)
    }
}

/// Paints a rendered payload into an error container
pub type Renderer<H> = Rc<dyn Fn(&H, &<H as Host>::Node, &<H as Host>::Payload)>;

/// Wrap a closure as a [`Renderer`]
pub fn renderer<H, F>(f: F) -> Renderer<H>
where
    H: Host,
    F: Fn(&H, &H::Node, &H::Payload) + 'static,
{
    Rc::new(f)
}

/// Applies a report to the document
///
/// Implementations must be idempotent and must not fail.
pub trait ErrorSink<H: Host> {
    fn apply(&self, host: &H, target: &FieldTarget<H::Node>, report: &Report<H::Payload>);
}

/// Default renderer: the payload's text becomes the container's markup
pub fn render_markup<H: Host>(host: &H, container: &H::Node, payload: &H::Payload) {
    match payload.as_text() {
        Some(markup) => host.set_inner_html(container, &markup),
        None => tracing::debug!(?payload, "default renderer skipped a non-text payload"),
    }
}

/// Error container referenced by the anchor's `aria-describedby`
pub fn error_container<H: Host>(host: &H, anchor: &H::Node) -> Option<H::Node> {
    let ids = host.attribute(anchor, DESCRIBEDBY_ATTR)?;
    let id = ids.split_whitespace().next()?;
    host.element_by_id(id)
}

/// Writes reports straight into the document
pub struct DomSink<H: Host> {
    renderer: Renderer<H>,
}

impl<H: Host> DomSink<H> {
    pub fn new(renderer: Renderer<H>) -> Self {
        Self { renderer }
    }
}

impl<H: Host> Default for DomSink<H> {
    fn default() -> Self {
        Self::new(Rc::new(render_markup::<H>))
    }
}

impl<H: Host> ErrorSink<H> for DomSink<H> {
    fn apply(&self, host: &H, target: &FieldTarget<H::Node>, report: &Report<H::Payload>) {
        let anchor = target.anchor();
        let field = target.field();
        let container = error_container(host, anchor);

        match report {
            Report::Pass => {
                host.set_attribute(anchor, INVALID_ATTR, "false");
                if let Some(container) = &container {
                    host.set_text_content(container, "");
                }
                host.set_custom_validity(field, "");
            }
            Report::Fail(ErrorDisplay::Text(message)) => {
                host.set_attribute(anchor, INVALID_ATTR, "true");
                if let Some(container) = &container {
                    host.set_text_content(container, message);
                }
                host.set_custom_validity(field, message);
            }
            Report::Fail(ErrorDisplay::Rendered(payload)) => {
                host.set_attribute(anchor, INVALID_ATTR, "true");
                match &container {
                    Some(container) => (self.renderer)(host, container, payload),
                    None => tracing::debug!("rendered error has no container to render into"),
                }
                // Left empty so the native bubble never shows unrenderable content
                host.set_custom_validity(field, "");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;
    use serde_json::json;

    #[test]
    fn test_text_failure_writes_both_channels() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let input = doc.append(Some(form), "input", &[("name", "email"), ("aria-describedby", "email-error")]);
        let error = doc.append(Some(form), "div", &[("id", "email-error")]);

        let sink = DomSink::<MemoryDocument>::default();
        let report = Report::Fail(ErrorDisplay::Text("Bad email".to_string()));
        sink.apply(&doc, &FieldTarget::Single(input), &report);

        assert_eq!(doc.get_attribute(input, "aria-invalid").as_deref(), Some("true"));
        assert_eq!(doc.text_content(error), "Bad email");
        assert_eq!(doc.custom_validity(input), "Bad email");
    }

    #[test]
    fn test_rendered_failure_leaves_native_message_empty() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let input = doc.append(Some(form), "input", &[("name", "email"), ("aria-describedby", "email-error")]);
        let error = doc.append(Some(form), "div", &[("id", "email-error")]);

        let sink = DomSink::<MemoryDocument>::default();
        let report = Report::Fail(ErrorDisplay::Rendered(json!("<i>Bad</i>")));
        sink.apply(&doc, &FieldTarget::Single(input), &report);

        assert_eq!(doc.inner_html(error), "<i>Bad</i>");
        assert_eq!(doc.text_content(error), "Bad");
        assert_eq!(doc.custom_validity(input), "");
    }

    #[test]
    fn test_missing_container_is_not_an_error() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let input = doc.append(Some(form), "input", &[("name", "email"), ("aria-describedby", "ghost")]);

        let sink = DomSink::<MemoryDocument>::default();
        sink.apply(
            &doc,
            &FieldTarget::Single(input),
            &Report::Fail(ErrorDisplay::Rendered(json!({"x": 1}))),
        );
        assert_eq!(doc.get_attribute(input, "aria-invalid").as_deref(), Some("true"));

        sink.apply(&doc, &FieldTarget::Single(input), &Report::Pass);
        assert_eq!(doc.get_attribute(input, "aria-invalid").as_deref(), Some("false"));
    }

    #[test]
    fn test_group_writes_container_and_first_member_only() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let group = doc.append(
            Some(form),
            "fieldset",
            &[("role", "radiogroup"), ("aria-describedby", "plan-error")],
        );
        let a = doc.append(Some(group), "input", &[("type", "radio"), ("name", "plan")]);
        let b = doc.append(Some(group), "input", &[("type", "radio"), ("name", "plan")]);
        let error = doc.append(Some(form), "div", &[("id", "plan-error")]);

        let target = FieldTarget::Group {
            container: group,
            members: vec![a, b],
        };
        DomSink::<MemoryDocument>::default().apply(
            &doc,
            &target,
            &Report::Fail(ErrorDisplay::Text("Pick a plan".to_string())),
        );

        assert_eq!(doc.get_attribute(group, "aria-invalid").as_deref(), Some("true"));
        assert_eq!(doc.get_attribute(a, "aria-invalid"), None);
        assert_eq!(doc.custom_validity(a), "Pick a plan");
        assert_eq!(doc.custom_validity(b), "");
        assert_eq!(doc.text_content(error), "Pick a plan");
    }

    #[test]
    fn test_custom_renderer_receives_raw_payload() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let input = doc.append(Some(form), "input", &[("name", "email"), ("aria-describedby", "email-error")]);
        let error = doc.append(Some(form), "div", &[("id", "email-error")]);

        let sink = DomSink::new(renderer::<MemoryDocument, _>(|host, container, payload| {
            host.set_text_content(container, &format!("rendered:{}", payload));
        }));
        sink.apply(
            &doc,
            &FieldTarget::Single(input),
            &Report::Fail(ErrorDisplay::Rendered(json!({"code": 7}))),
        );

        assert_eq!(doc.text_content(error), "rendered:{\"code\":7}");
    }
}
