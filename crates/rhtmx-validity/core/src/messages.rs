// File: rhtmx-validity/core/src/messages.rs
// Purpose: Error message specs and per-field error configuration

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::constraint::Constraint;
use crate::error::{Result, ValidityError};
use crate::host::{Field, Host, Payload};
use crate::validator::{ValidatorFn, Verdict};

/// Message computed from the field's current state; `Err` when the computation fails
pub type MessageFn<H> = Rc<dyn Fn(&Field<'_, H>) -> anyhow::Result<<H as Host>::Payload>>;

/// A message that is either fixed or computed on every lookup
pub enum Message<H: Host> {
    Static(H::Payload),
    Computed(MessageFn<H>),
}

impl<H: Host> Message<H> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Field<'_, H>) -> H::Payload + 'static,
    {
        Message::Computed(Rc::new(move |field: &Field<'_, H>| Ok::<_, anyhow::Error>(f(field))))
    }

    /// A computed message whose function may fail
    pub fn try_computed<F>(f: F) -> Self
    where
        F: Fn(&Field<'_, H>) -> anyhow::Result<H::Payload> + 'static,
    {
        Message::Computed(Rc::new(f))
    }

    pub fn evaluate(&self, field: &Field<'_, H>) -> anyhow::Result<H::Payload> {
        match self {
            Message::Static(payload) => Ok(payload.clone()),
            Message::Computed(f) => f(field),
        }
    }
}

impl<H: Host> Clone for Message<H> {
    fn clone(&self) -> Self {
        match self {
            Message::Static(payload) => Message::Static(payload.clone()),
            Message::Computed(f) => Message::Computed(Rc::clone(f)),
        }
    }
}

impl<H: Host> fmt::Debug for Message<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Static(payload) => f.debug_tuple("Static").field(payload).finish(),
            Message::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<H: Host> From<&str> for Message<H> {
    fn from(text: &str) -> Self {
        Message::Static(H::Payload::from(text.to_string()))
    }
}

impl<H: Host> From<String> for Message<H> {
    fn from(text: String) -> Self {
        Message::Static(H::Payload::from(text))
    }
}

/// How to report a violated constraint
///
/// `Literal`, `Dynamic` and a `Detailed` without a flag take the observer's
/// default render flag.
pub enum ErrorMessage<H: Host> {
    Literal(H::Payload),
    Dynamic(MessageFn<H>),
    Detailed { message: Message<H>, render: Option<bool> },
}

impl<H: Host> ErrorMessage<H> {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Field<'_, H>) -> H::Payload + 'static,
    {
        ErrorMessage::Dynamic(Rc::new(move |field: &Field<'_, H>| Ok::<_, anyhow::Error>(f(field))))
    }

    /// A dynamic message whose function may fail
    pub fn try_dynamic<F>(f: F) -> Self
    where
        F: Fn(&Field<'_, H>) -> anyhow::Result<H::Payload> + 'static,
    {
        ErrorMessage::Dynamic(Rc::new(f))
    }

    pub fn detailed(message: impl Into<Message<H>>, render: bool) -> Self {
        ErrorMessage::Detailed {
            message: message.into(),
            render: Some(render),
        }
    }

    /// Shorthand for a message painted by the renderer
    pub fn rendered(message: impl Into<Message<H>>) -> Self {
        Self::detailed(message, true)
    }

    /// Concrete payload and render flag for this lookup
    pub fn resolve(&self, field: &Field<'_, H>, default_render: bool) -> anyhow::Result<(H::Payload, bool)> {
        match self {
            ErrorMessage::Literal(payload) => Ok((payload.clone(), default_render)),
            ErrorMessage::Dynamic(f) => Ok((f(field)?, default_render)),
            ErrorMessage::Detailed { message, render } => {
                Ok((message.evaluate(field)?, render.unwrap_or(default_render)))
            }
        }
    }
}

impl<H: Host> Clone for ErrorMessage<H> {
    fn clone(&self) -> Self {
        match self {
            ErrorMessage::Literal(payload) => ErrorMessage::Literal(payload.clone()),
            ErrorMessage::Dynamic(f) => ErrorMessage::Dynamic(Rc::clone(f)),
            ErrorMessage::Detailed { message, render } => ErrorMessage::Detailed {
                message: message.clone(),
                render: *render,
            },
        }
    }
}

impl<H: Host> fmt::Debug for ErrorMessage<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Literal(payload) => f.debug_tuple("Literal").field(payload).finish(),
            ErrorMessage::Dynamic(_) => f.write_str("Dynamic(..)"),
            ErrorMessage::Detailed { message, render } => f
                .debug_struct("Detailed")
                .field("message", message)
                .field("render", render)
                .finish(),
        }
    }
}

impl<H: Host> From<&str> for ErrorMessage<H> {
    fn from(text: &str) -> Self {
        ErrorMessage::Literal(H::Payload::from(text.to_string()))
    }
}

impl<H: Host> From<String> for ErrorMessage<H> {
    fn from(text: String) -> Self {
        ErrorMessage::Literal(H::Payload::from(text))
    }
}

/// Error configuration for one field (or the observer-wide defaults)
pub struct ErrorMessages<H: Host> {
    constraints: HashMap<Constraint, ErrorMessage<H>>,
    validate: Option<ValidatorFn<H>>,
}

impl<H: Host> ErrorMessages<H> {
    pub fn new() -> Self {
        Self {
            constraints: HashMap::new(),
            validate: None,
        }
    }

    pub fn with(mut self, constraint: Constraint, message: impl Into<ErrorMessage<H>>) -> Self {
        self.constraints.insert(constraint, message.into());
        self
    }

    pub fn required(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Required, message)
    }

    pub fn min_length(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::MinLength, message)
    }

    pub fn min(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Min, message)
    }

    pub fn max_length(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::MaxLength, message)
    }

    pub fn max(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Max, message)
    }

    pub fn step(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Step, message)
    }

    pub fn type_mismatch(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Type, message)
    }

    pub fn pattern(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::Pattern, message)
    }

    pub fn bad_input(self, message: impl Into<ErrorMessage<H>>) -> Self {
        self.with(Constraint::BadInput, message)
    }

    /// Custom validator, run only after every standard constraint passes
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Field<'_, H>) -> Verdict<H> + 'static,
    {
        self.validate = Some(Rc::new(f));
        self
    }

    pub fn with_validator(mut self, validator: ValidatorFn<H>) -> Self {
        self.validate = Some(validator);
        self
    }

    pub fn get(&self, constraint: Constraint) -> Option<&ErrorMessage<H>> {
        self.constraints.get(&constraint)
    }

    pub fn validator(&self) -> Option<&ValidatorFn<H>> {
        self.validate.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.validate.is_none()
    }
}

impl<H: Host> Default for ErrorMessages<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> Clone for ErrorMessages<H> {
    fn clone(&self) -> Self {
        Self {
            constraints: self.constraints.clone(),
            validate: self.validate.clone(),
        }
    }
}

impl<H: Host> fmt::Debug for ErrorMessages<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMessages")
            .field("constraints", &self.constraints)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

/// A resolved message, ready for the error sink
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDisplay<P> {
    /// Written as text content and as the native validity message
    Text(String),
    /// Handed untouched to the renderer
    Rendered(P),
}

impl<P: Payload> ErrorDisplay<P> {
    /// Enforce the plain-text contract for unrendered messages
    pub fn new(field: &str, payload: P, render: bool) -> Result<Self> {
        if render {
            return Ok(ErrorDisplay::Rendered(payload));
        }

        payload
            .as_text()
            .map(ErrorDisplay::Text)
            .ok_or_else(|| ValidityError::NonTextMessage {
                field: field.to_string(),
            })
    }
}

/// Per-field message first, then the observer-wide default
pub fn lookup<'a, H: Host>(
    constraint: Constraint,
    field_errors: Option<&'a ErrorMessages<H>>,
    defaults: &'a ErrorMessages<H>,
) -> Option<&'a ErrorMessage<H>> {
    field_errors
        .and_then(|errors| errors.get(constraint))
        .or_else(|| defaults.get(constraint))
}

/// Message for a violated constraint
///
/// Falls back to the platform's own message when nothing is configured or the
/// configured text comes out empty, so a failure always carries a message.
pub fn resolve_constraint<H: Host>(
    field: &Field<'_, H>,
    configured: Option<&ErrorMessage<H>>,
    render_by_default: bool,
) -> Result<ErrorDisplay<H::Payload>> {
    let Some(spec) = configured else {
        return Ok(ErrorDisplay::Text(field.validation_message()));
    };

    let (payload, render) = spec
        .resolve(field, render_by_default)
        .map_err(|source| ValidityError::Message {
            field: field.name().to_string(),
            source,
        })?;
    match ErrorDisplay::new(field.name(), payload, render)? {
        ErrorDisplay::Text(text) if text.is_empty() => {
            Ok(ErrorDisplay::Text(field.validation_message()))
        }
        display => Ok(display),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, NodeId};
    use serde_json::{json, Value};

    fn age_field() -> (MemoryDocument, NodeId) {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let age = doc.append(
            Some(form),
            "input",
            &[("name", "age"), ("type", "number"), ("min", "18")],
        );
        doc.set_value(age, "10");
        (doc, age)
    }

    #[test]
    fn test_unconfigured_uses_platform_message() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");

        let display = resolve_constraint(&field, None, false).unwrap();
        assert_eq!(
            display,
            ErrorDisplay::Text("Value must be greater than or equal to 18.".to_string())
        );
    }

    #[test]
    fn test_field_spec_beats_default() {
        let field_errors = ErrorMessages::<MemoryDocument>::new().min("Too young");
        let defaults = ErrorMessages::<MemoryDocument>::new()
            .min("Default min")
            .required("Default required");

        let chosen = lookup(Constraint::Min, Some(&field_errors), &defaults);
        assert!(matches!(chosen, Some(ErrorMessage::Literal(Value::String(s))) if s == "Too young"));

        let fallback = lookup(Constraint::Required, Some(&field_errors), &defaults);
        assert!(matches!(fallback, Some(ErrorMessage::Literal(Value::String(s))) if s == "Default required"));

        assert!(lookup(Constraint::Pattern, Some(&field_errors), &defaults).is_none());
    }

    #[test]
    fn test_dynamic_message_reads_current_value() {
        let (doc, age) = age_field();
        let spec = ErrorMessage::<MemoryDocument>::dynamic(|field| {
            Value::String(format!("{} is under 18", field.value()))
        });

        let field = Field::new(&doc, &age, "age");
        let display = resolve_constraint(&field, Some(&spec), false).unwrap();
        assert_eq!(display, ErrorDisplay::Text("10 is under 18".to_string()));

        doc.set_value(age, "12");
        let display = resolve_constraint(&field, Some(&spec), false).unwrap();
        assert_eq!(display, ErrorDisplay::Text("12 is under 18".to_string()));
    }

    #[test]
    fn test_render_flag_defaults_from_observer() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::from("<b>Too young</b>");

        let display = resolve_constraint(&field, Some(&spec), true).unwrap();
        assert_eq!(display, ErrorDisplay::Rendered(json!("<b>Too young</b>")));
    }

    #[test]
    fn test_detailed_render_passes_structured_payload() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::detailed(
            Message::Static(json!({"component": "AgeError"})),
            true,
        );

        let display = resolve_constraint(&field, Some(&spec), false).unwrap();
        assert_eq!(display, ErrorDisplay::Rendered(json!({"component": "AgeError"})));
    }

    #[test]
    fn test_detailed_without_flag_follows_observer_default() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::Detailed {
            message: Message::from("<b>Too young</b>"),
            render: None,
        };

        let display = resolve_constraint(&field, Some(&spec), true).unwrap();
        assert_eq!(display, ErrorDisplay::Rendered(json!("<b>Too young</b>")));

        let display = resolve_constraint(&field, Some(&spec), false).unwrap();
        assert_eq!(display, ErrorDisplay::Text("<b>Too young</b>".to_string()));
    }

    #[test]
    fn test_failing_message_function_is_an_error() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::try_dynamic(|_| Err(anyhow::anyhow!("boom")));

        let err = resolve_constraint(&field, Some(&spec), false).unwrap_err();
        assert!(matches!(err, ValidityError::Message { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_unrendered_object_is_rejected() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::Literal(json!({"component": "AgeError"}));

        let err = resolve_constraint(&field, Some(&spec), false).unwrap_err();
        assert!(matches!(err, ValidityError::NonTextMessage { field } if field == "age"));
    }

    #[test]
    fn test_empty_configured_text_falls_back_to_platform() {
        let (doc, age) = age_field();
        let field = Field::new(&doc, &age, "age");
        let spec = ErrorMessage::<MemoryDocument>::from("");

        let display = resolve_constraint(&field, Some(&spec), false).unwrap();
        assert_eq!(
            display,
            ErrorDisplay::Text("Value must be greater than or equal to 18.".to_string())
        );
    }
}
