// File: rhtmx-validity/core/src/memory.rs
// Purpose: Headless document host that mimics browser constraint validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::constraint::ValidityFlags;
use crate::host::Host;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("valid url regex"));

/// Tags listed in `HTMLFormElement.elements`
const LISTED_TAGS: [&str; 7] = ["button", "fieldset", "input", "object", "output", "select", "textarea"];

/// Input types whose value is free text
const TEXT_TYPES: [&str; 6] = ["text", "search", "url", "tel", "email", "password"];

/// Element handle into a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Html(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: String,
    checked: bool,
    bad_input: bool,
    custom_validity: String,
    content: Content,
    detached: bool,
}

/// In-memory document
///
/// Validity flags are computed from attributes and the current value the way
/// a browser would (length limits apply to any non-empty value, not only to
/// user edits). Focus and scroll requests are recorded.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<NodeData>>,
    focused: Cell<Option<NodeId>>,
    scrolled: RefCell<Vec<NodeId>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element, appending it to `parent` when given
    ///
    /// A `value` or `checked` attribute seeds the control's initial state.
    pub fn append(&self, parent: Option<NodeId>, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let attributes: BTreeMap<String, String> = attributes
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();

        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            value: attributes.get("value").cloned().unwrap_or_default(),
            checked: attributes.contains_key("checked"),
            attributes,
            parent,
            children: Vec::new(),
            bad_input: false,
            custom_validity: String::new(),
            content: Content::Text(String::new()),
            detached: false,
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        id
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[node.0].detached = true;
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.nodes.borrow_mut()[node.0].value = value.to_string();
    }

    /// Check a checkbox or radio; checking a radio unchecks its group
    pub fn set_checked(&self, node: NodeId, checked: bool) {
        if checked && self.is_radio_node(node) {
            for member in self.radio_group_of(node) {
                self.nodes.borrow_mut()[member.0].checked = false;
            }
        }
        self.nodes.borrow_mut()[node.0].checked = checked;
    }

    /// Simulate input the control could not parse
    pub fn set_bad_input(&self, node: NodeId, bad_input: bool) {
        self.nodes.borrow_mut()[node.0].bad_input = bad_input;
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[node.0]
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attr(&self, node: NodeId, name: &str) {
        self.nodes.borrow_mut()[node.0]
            .attributes
            .remove(&name.to_ascii_lowercase());
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0]
            .attributes
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.0].checked
    }

    /// Text content, with markup stripped if it was set as HTML
    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes.borrow()[node.0].content {
            Content::Text(text) => text.clone(),
            Content::Html(html) => TAG_RE.replace_all(html, "").into_owned(),
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        match &self.nodes.borrow()[node.0].content {
            Content::Text(text) => text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;"),
            Content::Html(html) => html.clone(),
        }
    }

    /// The message last passed to `set_custom_validity`
    pub fn custom_validity(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].custom_validity.clone()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    /// Every node scrolled into view, oldest first
    pub fn scrolled(&self) -> Vec<NodeId> {
        self.scrolled.borrow().clone()
    }

    fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    /// Lower-cased `type` of an input, defaulting to `text`
    fn input_type(&self, node: NodeId) -> String {
        self.get_attribute(node, "type")
            .map(|kind| kind.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    }

    fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.nodes.borrow()[node.0].attributes.contains_key(name)
    }

    fn is_radio_node(&self, node: NodeId) -> bool {
        self.tag(node) == "input" && self.input_type(node) == "radio"
    }

    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut ancestors = Vec::new();
        let mut current = nodes[node.0].parent;
        while let Some(parent) = current {
            ancestors.push(parent);
            current = nodes[parent.0].parent;
        }
        ancestors
    }

    fn ancestors_in(nodes: &[NodeData], node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(nodes[node.0].parent, move |current| nodes[current.0].parent)
    }

    fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .into_iter()
            .find(|ancestor| self.tag(*ancestor) == "form")
    }

    /// Descendants in document (pre-)order
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = nodes[root.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    /// Radios sharing `radio`'s name and form owner, `radio` included
    fn radio_group_of(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.get_attribute(radio, "name").filter(|name| !name.is_empty()) else {
            return vec![radio];
        };
        let Some(form) = self.form_owner(radio) else {
            return vec![radio];
        };

        self.descendants(form)
            .into_iter()
            .filter(|node| {
                self.is_radio_node(*node) && self.get_attribute(*node, "name").as_deref() == Some(name.as_str())
            })
            .collect()
    }

    fn is_disabled(&self, node: NodeId) -> bool {
        self.has_attr(node, "disabled")
            || self
                .ancestors(node)
                .into_iter()
                .any(|ancestor| self.tag(ancestor) == "fieldset" && self.has_attr(ancestor, "disabled"))
    }

    fn barred(&self, node: NodeId) -> bool {
        let tag = self.tag(node);
        let barred_by_kind = match tag.as_str() {
            "input" => {
                matches!(self.input_type(node).as_str(), "hidden" | "reset" | "button")
                    || self.has_attr(node, "readonly")
            }
            "textarea" => self.has_attr(node, "readonly"),
            "select" => false,
            "button" => matches!(
                self.get_attribute(node, "type").as_deref(),
                Some("button") | Some("reset")
            ),
            _ => true,
        };
        barred_by_kind || self.is_disabled(node)
    }

    fn compute_validity(&self, node: NodeId) -> ValidityFlags {
        let (value, checked, bad_input, custom_error) = {
            let nodes = self.nodes.borrow();
            let data = &nodes[node.0];
            (
                data.value.clone(),
                data.checked,
                data.bad_input,
                !data.custom_validity.is_empty(),
            )
        };

        let mut flags = ValidityFlags {
            custom_error,
            bad_input,
            ..ValidityFlags::default()
        };
        if self.barred(node) {
            return ValidityFlags::default();
        }

        let tag = self.tag(node);
        let kind = if tag == "input" {
            self.input_type(node)
        } else {
            tag.clone()
        };

        flags.value_missing = match kind.as_str() {
            "radio" => {
                let group = self.radio_group_of(node);
                group.iter().any(|member| self.has_attr(*member, "required"))
                    && !group.iter().any(|member| self.is_checked(*member))
            }
            "checkbox" => self.has_attr(node, "required") && !checked,
            _ => self.has_attr(node, "required") && value.is_empty() && !bad_input,
        };

        if value.is_empty() || matches!(kind.as_str(), "radio" | "checkbox") {
            return flags;
        }

        if TEXT_TYPES.contains(&kind.as_str()) || kind == "textarea" {
            let length = value.chars().count();
            if let Some(min) = self.numeric_attr(node, "minlength") {
                flags.too_short = (length as f64) < min;
            }
            if let Some(max) = self.numeric_attr(node, "maxlength") {
                flags.too_long = (length as f64) > max;
            }
        }

        if matches!(kind.as_str(), "number" | "range") {
            match value.trim().parse::<f64>() {
                Ok(number) => {
                    let min = self.numeric_attr(node, "min");
                    if let Some(min) = min {
                        flags.range_underflow = number < min;
                    }
                    if let Some(max) = self.numeric_attr(node, "max") {
                        flags.range_overflow = number > max;
                    }
                    if let Some(step) = self.step(node) {
                        let steps = (number - min.unwrap_or(0.0)) / step;
                        flags.step_mismatch = (steps - steps.round()).abs() > 1e-9;
                    }
                }
                Err(_) => flags.bad_input = true,
            }
        }

        flags.type_mismatch = match kind.as_str() {
            "email" => !EMAIL_RE.is_match(&value),
            "url" => !URL_RE.is_match(&value),
            _ => false,
        };

        if TEXT_TYPES.contains(&kind.as_str()) {
            if let Some(pattern) = self.get_attribute(node, "pattern") {
                if let Ok(re) = Regex::new(&format!("^(?:{})$", pattern)) {
                    flags.pattern_mismatch = !re.is_match(&value);
                }
            }
        }

        flags
    }

    fn numeric_attr(&self, node: NodeId, name: &str) -> Option<f64> {
        self.get_attribute(node, name)?.trim().parse().ok()
    }

    fn step(&self, node: NodeId) -> Option<f64> {
        match self.get_attribute(node, "step").as_deref() {
            Some(step) if step.eq_ignore_ascii_case("any") => None,
            Some(step) => step.trim().parse().ok().filter(|step: &f64| *step > 0.0).or(Some(1.0)),
            None => Some(1.0),
        }
    }

    /// Chromium's wording for the first violated constraint
    fn default_message(&self, node: NodeId, flags: &ValidityFlags) -> String {
        let tag = self.tag(node);
        let kind = if tag == "input" {
            self.input_type(node)
        } else {
            tag
        };
        let attr = |name: &str| self.get_attribute(node, name).unwrap_or_default();
        let length = self.nodes.borrow()[node.0].value.chars().count();

        if flags.value_missing {
            return match kind.as_str() {
                "checkbox" => "Please check this box if you want to proceed.".to_string(),
                "radio" => "Please select one of these options.".to_string(),
                "select" => "Please select an item in the list.".to_string(),
                _ => "Please fill out this field.".to_string(),
            };
        }
        if flags.too_short {
            return format!(
                "Please lengthen this text to {} characters or more (you are currently using {} characters).",
                attr("minlength"),
                length
            );
        }
        if flags.range_underflow {
            return format!("Value must be greater than or equal to {}.", attr("min"));
        }
        if flags.too_long {
            return format!(
                "Please shorten this text to {} characters or less (you are currently using {} characters).",
                attr("maxlength"),
                length
            );
        }
        if flags.range_overflow {
            return format!("Value must be less than or equal to {}.", attr("max"));
        }
        if flags.step_mismatch {
            return "Please enter a valid value.".to_string();
        }
        if flags.type_mismatch {
            return match kind.as_str() {
                "email" => "Please enter an email address.".to_string(),
                _ => "Please enter a URL.".to_string(),
            };
        }
        if flags.pattern_mismatch {
            return "Please match the requested format.".to_string();
        }
        if flags.bad_input {
            return match kind.as_str() {
                "number" | "range" => "Please enter a number.".to_string(),
                _ => "Please enter a valid value.".to_string(),
            };
        }
        String::new()
    }
}

impl Host for MemoryDocument {
    type Node = NodeId;
    type Payload = serde_json::Value;

    fn controls(&self, form: &NodeId) -> Vec<NodeId> {
        self.descendants(*form)
            .into_iter()
            .filter(|node| LISTED_TAGS.contains(&self.tag(*node).as_str()))
            .collect()
    }

    fn name(&self, node: &NodeId) -> Option<String> {
        self.get_attribute(*node, "name")
    }

    fn is_radio(&self, node: &NodeId) -> bool {
        self.is_radio_node(*node)
    }

    fn will_validate(&self, node: &NodeId) -> bool {
        !self.barred(*node)
    }

    fn value(&self, node: &NodeId) -> String {
        self.nodes.borrow()[node.0].value.clone()
    }

    fn validity(&self, node: &NodeId) -> ValidityFlags {
        self.compute_validity(*node)
    }

    fn validation_message(&self, node: &NodeId) -> String {
        if self.barred(*node) {
            return String::new();
        }
        let custom = self.custom_validity(*node);
        if !custom.is_empty() {
            return custom;
        }
        self.default_message(*node, &self.compute_validity(*node))
    }

    fn set_custom_validity(&self, node: &NodeId, message: &str) {
        self.nodes.borrow_mut()[node.0].custom_validity = message.to_string();
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.get_attribute(*node, name)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.set_attr(*node, name, value);
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        (0..nodes.len()).map(NodeId).find(|node| {
            nodes[node.0].attributes.get("id").map(String::as_str) == Some(id)
                && !nodes[node.0].detached
                && !Self::ancestors_in(&nodes, *node).any(|ancestor| nodes[ancestor.0].detached)
        })
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        self.nodes.borrow_mut()[node.0].content = Content::Text(text.to_string());
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        self.nodes.borrow_mut()[node.0].content = Content::Html(html.to_string());
    }

    fn focus(&self, node: &NodeId) {
        self.focused.set(Some(*node));
    }

    fn scroll_into_view(&self, node: &NodeId) {
        self.scrolled.borrow_mut().push(*node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{first_violation, Constraint};

    fn form() -> (MemoryDocument, NodeId) {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        (doc, form)
    }

    #[test]
    fn test_controls_in_document_order() {
        let (doc, form) = form();
        let a = doc.append(Some(form), "input", &[("name", "a")]);
        let group = doc.append(Some(form), "fieldset", &[]);
        let b = doc.append(Some(group), "select", &[("name", "b")]);
        doc.append(Some(form), "div", &[]);
        let c = doc.append(Some(form), "textarea", &[("name", "c")]);

        assert_eq!(doc.controls(&form), vec![a, group, b, c]);
    }

    #[test]
    fn test_required_text() {
        let (doc, form) = form();
        let input = doc.append(Some(form), "input", &[("name", "a"), ("required", "")]);

        assert_eq!(first_violation(&doc.validity(&input)), Some(Constraint::Required));
        assert_eq!(doc.validation_message(&input), "Please fill out this field.");

        doc.set_value(input, "x");
        assert!(doc.validity(&input).is_valid());
    }

    #[test]
    fn test_length_limits_count_characters() {
        let (doc, form) = form();
        let input = doc.append(
            Some(form),
            "input",
            &[("name", "a"), ("minlength", "3"), ("maxlength", "4")],
        );

        doc.set_value(input, "éé");
        assert!(doc.validity(&input).too_short);
        assert_eq!(
            doc.validation_message(&input),
            "Please lengthen this text to 3 characters or more (you are currently using 2 characters)."
        );

        doc.set_value(input, "ééééé");
        assert!(doc.validity(&input).too_long);
    }

    #[test]
    fn test_number_range_and_step() {
        let (doc, form) = form();
        let input = doc.append(
            Some(form),
            "input",
            &[("name", "n"), ("type", "number"), ("min", "2"), ("max", "10"), ("step", "2")],
        );

        doc.set_value(input, "1");
        let flags = doc.validity(&input);
        assert!(flags.range_underflow);
        assert!(flags.step_mismatch);

        doc.set_value(input, "5");
        assert_eq!(first_violation(&doc.validity(&input)), Some(Constraint::Step));

        doc.set_value(input, "12");
        assert_eq!(first_violation(&doc.validity(&input)), Some(Constraint::Max));

        doc.set_value(input, "abc");
        assert_eq!(first_violation(&doc.validity(&input)), Some(Constraint::BadInput));
        assert_eq!(doc.validation_message(&input), "Please enter a number.");
    }

    #[test]
    fn test_step_any_disables_step_checks() {
        let (doc, form) = form();
        let input = doc.append(Some(form), "input", &[("name", "n"), ("type", "number"), ("step", "any")]);
        doc.set_value(input, "1.25");
        assert!(doc.validity(&input).is_valid());
    }

    #[test]
    fn test_email_and_pattern() {
        let (doc, form) = form();
        let email = doc.append(Some(form), "input", &[("name", "e"), ("type", "email")]);
        let code = doc.append(Some(form), "input", &[("name", "c"), ("pattern", "[A-Z]{3}")]);

        doc.set_value(email, "nope");
        assert!(doc.validity(&email).type_mismatch);
        doc.set_value(email, "a@b.io");
        assert!(doc.validity(&email).is_valid());

        doc.set_value(code, "ABCD");
        assert!(doc.validity(&code).pattern_mismatch);
        doc.set_value(code, "ABC");
        assert!(doc.validity(&code).is_valid());
    }

    #[test]
    fn test_required_radio_group_shares_state() {
        let (doc, form) = form();
        let a = doc.append(Some(form), "input", &[("type", "radio"), ("name", "plan"), ("required", "")]);
        let b = doc.append(Some(form), "input", &[("type", "radio"), ("name", "plan")]);

        assert!(doc.validity(&b).value_missing);
        doc.set_checked(b, true);
        assert!(doc.validity(&a).is_valid());

        doc.set_checked(a, true);
        assert!(!doc.is_checked(b));
    }

    #[test]
    fn test_barred_controls_do_not_validate() {
        let (doc, form) = form();
        let hidden = doc.append(Some(form), "input", &[("type", "hidden"), ("name", "h"), ("required", "")]);
        let disabled = doc.append(Some(form), "input", &[("name", "d"), ("disabled", "")]);
        let group = doc.append(Some(form), "fieldset", &[("disabled", "")]);
        let nested = doc.append(Some(group), "input", &[("name", "n")]);
        let output = doc.append(Some(form), "output", &[("name", "o")]);

        for node in [hidden, disabled, group, nested, output] {
            assert!(!doc.will_validate(&node));
        }
        assert!(doc.validity(&hidden).is_valid());
    }

    #[test]
    fn test_custom_validity_takes_over_the_message() {
        let (doc, form) = form();
        let input = doc.append(Some(form), "input", &[("name", "a"), ("required", "")]);

        doc.set_custom_validity(&input, "Custom");
        assert!(doc.validity(&input).custom_error);
        assert_eq!(doc.validation_message(&input), "Custom");

        doc.set_custom_validity(&input, "");
        assert_eq!(doc.validation_message(&input), "Please fill out this field.");
    }

    #[test]
    fn test_element_by_id_ignores_detached_nodes() {
        let (doc, form) = form();
        let error = doc.append(Some(form), "div", &[("id", "err")]);
        assert_eq!(doc.element_by_id("err"), Some(error));

        doc.remove(error);
        assert_eq!(doc.element_by_id("err"), None);
    }
}
