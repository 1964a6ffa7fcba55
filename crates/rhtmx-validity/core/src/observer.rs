// File: rhtmx-validity/core/src/observer.rs
// Purpose: Validation entry points, form binding and event-driven validation

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use futures::future::FutureExt;

use crate::config::{ObserverOptions, Scroller, ValidateOptions, ValidityConfig};
use crate::constraint;
use crate::error::{Result, ValidityError};
use crate::host::{Field, Host};
use crate::messages::{self, ErrorDisplay, ErrorMessages, Message};
use crate::outcome::{self, Outcome};
use crate::resolver::{self, FieldTarget, Resolution};
use crate::sink::{DomSink, ErrorSink, Report};
use crate::validator::{self, Run};

/// Observes one form at a time and validates its fields
///
/// Cheap to clone; clones share the binding and the field configuration.
pub struct ValidityObserver<H: Host> {
    shared: Rc<Shared<H>>,
}

struct Shared<H: Host> {
    host: H,
    options: ObserverOptions,
    default_errors: ErrorMessages<H>,
    scroller: Scroller<H>,
    sink: Rc<dyn ErrorSink<H>>,
    form: RefCell<Option<H::Node>>,
    fields: RefCell<HashMap<String, ErrorMessages<H>>>,
    revalidating: RefCell<HashSet<String>>,
}

/// Per-field bookkeeping for `validate_fields`
struct Entry<N> {
    /// Position of the field's first control in the form
    order: Option<usize>,
    anchor: Option<N>,
}

impl<H: Host> Clone for ValidityObserver<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H: Host> ValidityObserver<H> {
    pub fn new(host: H, config: ValidityConfig<H>) -> Self {
        let sink: Rc<dyn ErrorSink<H>> = match config.sink {
            Some(sink) => sink,
            None => Rc::new(DomSink::new(config.renderer)),
        };

        Self {
            shared: Rc::new(Shared {
                host,
                options: config.options,
                default_errors: config.default_errors,
                scroller: config.scroller,
                sink,
                form: RefCell::new(None),
                fields: RefCell::new(HashMap::new()),
                revalidating: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.shared.host
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.shared.options
    }

    /// The currently observed form
    pub fn form(&self) -> Option<H::Node> {
        self.shared.form.borrow().clone()
    }

    /// Bind a form
    ///
    /// Returns `Ok(false)` when the form is already observed. Binding a second
    /// form while one is bound is an error.
    pub fn observe(&self, form: H::Node) -> Result<bool> {
        let mut bound = self.shared.form.borrow_mut();
        match bound.as_ref() {
            Some(current) if *current == form => Ok(false),
            Some(_) => Err(ValidityError::AlreadyObserving),
            None => {
                tracing::debug!(?form, "observing form");
                *bound = Some(form);
                Ok(true)
            }
        }
    }

    /// Unbind `form`, discarding all field configuration
    ///
    /// Returns `false` when `form` was not the observed form.
    pub fn unobserve(&self, form: &H::Node) -> bool {
        if self.shared.form.borrow().as_ref() != Some(form) {
            return false;
        }
        self.disconnect();
        true
    }

    /// Unbind whatever form is observed
    pub fn disconnect(&self) {
        if let Some(form) = self.shared.form.borrow_mut().take() {
            tracing::debug!(?form, "stopped observing form");
        }
        self.shared.fields.borrow_mut().clear();
        self.shared.revalidating.borrow_mut().clear();
    }

    /// Register (or replace) the error configuration for a field
    pub fn configure(&self, name: impl Into<String>, errors: ErrorMessages<H>) {
        let name = name.into();
        tracing::trace!(field = %name, ?errors, "configured field");
        self.shared.fields.borrow_mut().insert(name, errors);
    }

    /// Validate one field
    ///
    /// A name that resolves to nothing fails without touching the document.
    /// Controls barred from constraint validation pass.
    pub fn validate_field(&self, name: &str, options: ValidateOptions) -> Result<Outcome> {
        let form = self.bound_form()?;
        let target = match resolver::resolve(&self.shared.host, &form, name) {
            Resolution::Found(target) => target,
            Resolution::Missing => {
                tracing::debug!(field = name, "no participating field by that name");
                return Ok(Outcome::Ready(false));
            }
            Resolution::Orphaned { .. } => {
                tracing::warn!(field = name, "radio group has no role=\"radiogroup\" container");
                return Ok(Outcome::Ready(false));
            }
        };

        if !self.shared.host.will_validate(target.field()) {
            return Ok(Outcome::Ready(true));
        }

        self.validate_target(name, target, options)
    }

    /// Validate several fields, or every named field when `names` is `None`
    ///
    /// Radio groups are validated once. The result is `Ready` only if every
    /// field validated synchronously; otherwise it settles after all of them
    /// have, counting rejections as failures.
    ///
    /// A usage error on one field does not stop the others: every field is
    /// still validated and every pending field still settles before the first
    /// usage error is returned.
    pub fn validate_fields(&self, names: Option<&[&str]>, options: ValidateOptions) -> Result<Outcome> {
        let form = self.bound_form()?;
        let host = &self.shared.host;
        let controls = host.controls(&form);

        let mut seen = HashSet::new();
        let names: Vec<String> = match names {
            Some(names) => names
                .iter()
                .filter(|name| seen.insert(name.to_string()))
                .map(|name| name.to_string())
                .collect(),
            None => controls
                .iter()
                .filter(|control| host.will_validate(control))
                .filter_map(|control| host.name(control))
                .filter(|name| !name.is_empty() && seen.insert(name.clone()))
                .collect(),
        };

        let per_field = ValidateOptions {
            focus: false,
            ..options
        };

        let mut entries = Vec::with_capacity(names.len());
        let mut outcomes = Vec::with_capacity(names.len());
        let mut usage_error = None;
        for name in &names {
            match resolver::resolve(host, &form, name) {
                Resolution::Found(target) => {
                    let order = controls.iter().position(|control| control == target.field());
                    let anchor = Some(target.anchor().clone());
                    let outcome = if host.will_validate(target.field()) {
                        match self.validate_target(name, target, per_field) {
                            Ok(outcome) => outcome,
                            Err(err) if err.is_usage() => {
                                usage_error.get_or_insert(err);
                                Outcome::Ready(false)
                            }
                            Err(err) => {
                                tracing::warn!(field = %name, error = %err, "validation failed");
                                Outcome::Ready(false)
                            }
                        }
                    } else {
                        Outcome::Ready(true)
                    };
                    entries.push(Entry { order, anchor });
                    outcomes.push(outcome);
                }
                Resolution::Missing | Resolution::Orphaned { .. } => {
                    tracing::debug!(field = %name, "field cannot be validated");
                    entries.push(Entry {
                        order: None,
                        anchor: None,
                    });
                    outcomes.push(Outcome::Ready(false));
                }
            }
        }

        if let Some(err) = usage_error {
            if outcomes.iter().all(Outcome::is_ready) {
                return Err(err);
            }
            let pending = async move {
                outcome::settle_all(outcomes).await;
                Err::<bool, _>(err)
            };
            return Ok(Outcome::Pending(pending.boxed_local()));
        }

        if outcomes.iter().all(Outcome::is_ready) {
            let results: Vec<bool> = outcomes.iter().filter_map(Outcome::ready).collect();
            let valid = results.iter().all(|valid| *valid);
            if !valid && options.focus {
                self.focus_first_failure(&entries, &results);
            }
            return Ok(Outcome::Ready(valid));
        }

        let observer = self.clone();
        let pending = async move {
            let results = outcome::settle_all(outcomes).await;
            let valid = results.iter().all(|valid| *valid);
            if !valid && options.focus {
                observer.focus_first_failure(&entries, &results);
            }
            Ok::<_, ValidityError>(valid)
        };
        Ok(Outcome::Pending(pending.boxed_local()))
    }

    /// Mark a field invalid with `message`
    ///
    /// Unknown names are ignored; a radio group without a container is an error.
    pub fn set_field_error(&self, name: &str, message: impl Into<Message<H>>, render: bool) -> Result<()> {
        let Some(target) = self.explicit_target(name)? else {
            return Ok(());
        };

        let message = message.into();
        let host = &self.shared.host;
        let payload = message
            .evaluate(&Field::new(host, target.field(), name))
            .map_err(|source| ValidityError::Message {
                field: name.to_string(),
                source,
            })?;
        let display = ErrorDisplay::new(name, payload, render)?;

        self.shared.sink.apply(host, &target, &Report::Fail(display));
        Ok(())
    }

    /// Mark a field valid and empty its error container
    pub fn clear_field_error(&self, name: &str) -> Result<()> {
        let Some(target) = self.explicit_target(name)? else {
            return Ok(());
        };

        self.shared.sink.apply(&self.shared.host, &target, &Report::Pass);
        Ok(())
    }

    /// React to a DOM event dispatched inside the observed form
    ///
    /// Returns `None` when the event does not lead to a validation.
    pub fn handle_event(&self, event_type: &str, target: &H::Node) -> Result<Option<Outcome>> {
        let Some(form) = self.form() else {
            return Ok(None);
        };

        let host = &self.shared.host;
        let Some(name) = host.name(target).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        if !host.controls(&form).contains(target) {
            return Ok(None);
        }

        let options = &self.shared.options;
        let triggers = options.events.iter().any(|event| event == event_type);
        let revalidates = options.revalidate_on.as_deref() == Some(event_type)
            && self.shared.revalidating.borrow().contains(&name);

        if !triggers && !revalidates {
            return Ok(None);
        }

        tracing::trace!(field = %name, event = event_type, "validating on event");
        self.validate_field(&name, ValidateOptions::default()).map(Some)
    }

    /// Whether the field re-validates on the `revalidate_on` event
    pub fn is_revalidating(&self, name: &str) -> bool {
        self.shared.revalidating.borrow().contains(name)
    }

    fn bound_form(&self) -> Result<H::Node> {
        self.form().ok_or(ValidityError::NotObserving)
    }

    fn explicit_target(&self, name: &str) -> Result<Option<FieldTarget<H::Node>>> {
        let form = self.bound_form()?;
        match resolver::resolve(&self.shared.host, &form, name) {
            Resolution::Found(target) => Ok(Some(target)),
            Resolution::Missing => Ok(None),
            Resolution::Orphaned { .. } => Err(ValidityError::MissingRadioGroup {
                field: name.to_string(),
            }),
        }
    }

    /// Standard constraints first, then the custom validator
    fn validate_target(
        &self,
        name: &str,
        target: FieldTarget<H::Node>,
        options: ValidateOptions,
    ) -> Result<Outcome> {
        let shared = &self.shared;
        if options.enforce_revalidation {
            shared.revalidating.borrow_mut().insert(name.to_string());
        }

        let host = &shared.host;
        host.set_custom_validity(target.field(), "");
        let field = Field::new(host, target.field(), name);

        if let Some(violated) = constraint::first_violation(&host.validity(target.field())) {
            let configured = {
                let fields = shared.fields.borrow();
                messages::lookup(violated, fields.get(name), &shared.default_errors).cloned()
            };
            let display = messages::resolve_constraint(
                &field,
                configured.as_ref(),
                shared.options.render_by_default,
            )?;

            tracing::trace!(field = name, constraint = %violated, "constraint violated");
            self.report(name, &target, Report::Fail(display), options.focus);
            return Ok(Outcome::Ready(false));
        }

        let custom = shared
            .fields
            .borrow()
            .get(name)
            .and_then(|errors| errors.validator().cloned());

        match validator::run(custom.as_ref(), &field) {
            Run::Ready(message) => {
                let report = validator::settle(&field, message)?.map_or(Report::Pass, Report::Fail);
                let valid = report.is_pass();
                self.report(name, &target, report, options.focus);
                Ok(Outcome::Ready(valid))
            }
            Run::Deferred(verdict) => {
                let observer = self.clone();
                let name = name.to_string();
                let pending = async move {
                    let message = verdict.await.map_err(|source| ValidityError::Validator {
                        field: name.clone(),
                        source,
                    })?;

                    let host = &observer.shared.host;
                    let field = Field::new(host, target.field(), &name);
                    let report = validator::settle(&field, message)?.map_or(Report::Pass, Report::Fail);
                    let valid = report.is_pass();
                    observer.report(&name, &target, report, options.focus);
                    Ok::<_, ValidityError>(valid)
                };
                Ok(Outcome::Pending(pending.boxed_local()))
            }
        }
    }

    fn report(&self, name: &str, target: &FieldTarget<H::Node>, report: Report<H::Payload>, focus: bool) {
        let failed = !report.is_pass();
        self.shared.sink.apply(&self.shared.host, target, &report);

        if failed {
            self.shared.revalidating.borrow_mut().insert(name.to_string());
            if focus {
                self.bring_into_view(target.anchor());
            }
        }
    }

    fn focus_first_failure(&self, entries: &[Entry<H::Node>], results: &[bool]) {
        let first = entries
            .iter()
            .zip(results)
            .filter(|(_, valid)| !**valid)
            .filter_map(|(entry, _)| Some((entry.order?, entry.anchor.as_ref()?)))
            .min_by_key(|(order, _)| *order);

        if let Some((_, anchor)) = first {
            self.bring_into_view(anchor);
        }
    }

    fn bring_into_view(&self, anchor: &H::Node) {
        self.shared.host.focus(anchor);
        (self.shared.scroller)(&self.shared.host, anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn observer() -> (ValidityObserver<MemoryDocument>, crate::memory::NodeId) {
        let observer = ValidityObserver::new(MemoryDocument::new(), ValidityConfig::new());
        let form = observer.host().append(None, "form", &[]);
        (observer, form)
    }

    #[test]
    fn test_observe_is_idempotent_for_the_same_form() {
        let (observer, form) = observer();
        assert!(observer.observe(form).unwrap());
        assert!(!observer.observe(form).unwrap());
        assert_eq!(observer.form(), Some(form));
    }

    #[test]
    fn test_second_form_is_rejected() {
        let (observer, form) = observer();
        let other = observer.host().append(None, "form", &[]);
        observer.observe(form).unwrap();

        assert!(matches!(observer.observe(other), Err(ValidityError::AlreadyObserving)));
        assert_eq!(observer.form(), Some(form));
    }

    #[test]
    fn test_unobserve_only_releases_the_bound_form() {
        let (observer, form) = observer();
        let other = observer.host().append(None, "form", &[]);
        observer.observe(form).unwrap();

        assert!(!observer.unobserve(&other));
        assert!(observer.unobserve(&form));
        assert_eq!(observer.form(), None);
        assert!(observer.observe(other).unwrap());
    }

    #[test]
    fn test_validation_requires_a_bound_form() {
        let (observer, _) = observer();

        assert!(matches!(
            observer.validate_field("email", ValidateOptions::default()),
            Err(ValidityError::NotObserving)
        ));
        assert!(matches!(
            observer.validate_fields(None, ValidateOptions::default()),
            Err(ValidityError::NotObserving)
        ));
        assert!(matches!(
            observer.set_field_error("email", "bad", false),
            Err(ValidityError::NotObserving)
        ));
        assert!(matches!(observer.clear_field_error("email"), Err(ValidityError::NotObserving)));
    }

    #[test]
    fn test_unbinding_discards_configuration() {
        let (observer, form) = observer();
        let doc = observer.host();
        let input = doc.append(Some(form), "input", &[("name", "email"), ("required", "")]);
        observer.observe(form).unwrap();
        observer.configure("email", ErrorMessages::new().required("Email please"));

        observer.validate_field("email", ValidateOptions::default()).unwrap();
        assert_eq!(doc.custom_validity(input), "Email please");

        observer.disconnect();
        observer.observe(form).unwrap();
        observer.validate_field("email", ValidateOptions::default()).unwrap();
        assert_eq!(doc.custom_validity(input), "Please fill out this field.");
    }
}
