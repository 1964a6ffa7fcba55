//! Shared fixtures for the observer integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rhtmx_validity_core::*;
use serde_json::Value;

pub type Errors = ErrorMessages<MemoryDocument>;

/// Forwards to the document sink and remembers every report
#[derive(Default)]
pub struct RecordingSink {
    inner: DomSink<MemoryDocument>,
    applied: RefCell<Vec<(NodeId, Report<Value>)>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.applied.borrow().len()
    }

    /// Anchors reported on, oldest first
    pub fn anchors(&self) -> Vec<NodeId> {
        self.applied.borrow().iter().map(|(anchor, _)| *anchor).collect()
    }

    pub fn last(&self) -> Option<Report<Value>> {
        self.applied.borrow().last().map(|(_, report)| report.clone())
    }
}

impl ErrorSink<MemoryDocument> for RecordingSink {
    fn apply(&self, host: &MemoryDocument, target: &FieldTarget<NodeId>, report: &Report<Value>) {
        self.applied.borrow_mut().push((*target.anchor(), report.clone()));
        self.inner.apply(host, target, report);
    }
}

/// Route tracing output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Observer bound to a fresh, empty form
pub fn observed(config: ValidityConfig<MemoryDocument>) -> (ValidityObserver<MemoryDocument>, NodeId) {
    init_tracing();
    let observer = ValidityObserver::new(MemoryDocument::new(), config);
    let form = observer.host().append(None, "form", &[]);
    assert!(observer.observe(form).unwrap());
    (observer, form)
}

/// Observer whose reports are recorded
pub fn recording(
    config: ValidityConfig<MemoryDocument>,
) -> (ValidityObserver<MemoryDocument>, NodeId, Rc<RecordingSink>) {
    let sink = Rc::new(RecordingSink::default());
    let (observer, form) = observed(config.with_sink(sink.clone()));
    (observer, form, sink)
}

/// A control wired to its own error container (`<name>-error`)
pub fn control(
    doc: &MemoryDocument,
    parent: NodeId,
    tag: &str,
    name: &str,
    attributes: &[(&str, &str)],
) -> (NodeId, NodeId) {
    let error_id = format!("{}-error", name);
    let mut attrs = vec![("name", name), ("aria-describedby", error_id.as_str())];
    attrs.extend_from_slice(attributes);

    let node = doc.append(Some(parent), tag, &attrs);
    let error = doc.append(Some(parent), "div", &[("id", error_id.as_str())]);
    (node, error)
}

pub fn input(doc: &MemoryDocument, parent: NodeId, name: &str, attributes: &[(&str, &str)]) -> (NodeId, NodeId) {
    control(doc, parent, "input", name, attributes)
}

/// `role="radiogroup"` fieldset holding one radio per value
pub fn radio_group(
    doc: &MemoryDocument,
    form: NodeId,
    name: &str,
    values: &[&str],
    required: bool,
) -> (NodeId, Vec<NodeId>, NodeId) {
    let error_id = format!("{}-error", name);
    let container = doc.append(
        Some(form),
        "fieldset",
        &[("role", "radiogroup"), ("aria-describedby", error_id.as_str())],
    );
    let error = doc.append(Some(form), "div", &[("id", error_id.as_str())]);
    let radios = values
        .iter()
        .map(|value| {
            let mut attrs = vec![("type", "radio"), ("name", name), ("value", *value)];
            if required {
                attrs.push(("required", ""));
            }
            doc.append(Some(container), "input", &attrs)
        })
        .collect();
    (container, radios, error)
}
