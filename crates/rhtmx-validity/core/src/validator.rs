// File: rhtmx-validity/core/src/validator.rs
// Purpose: Running user-supplied validators, synchronous or deferred

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::{Result, ValidityError};
use crate::host::{Field, Host, Payload};
use crate::messages::{ErrorDisplay, ErrorMessage};

/// User-supplied validation function
pub type ValidatorFn<H> = Rc<dyn Fn(&Field<'_, H>) -> Verdict<H>>;

/// A validator's answer that is still being computed
///
/// `Ok(None)` passes, `Ok(Some(_))` fails, `Err(_)` rejects.
pub type PendingVerdict<H> = LocalBoxFuture<'static, anyhow::Result<Option<ErrorMessage<H>>>>;

/// What a custom validator returned
pub enum Verdict<H: Host> {
    Pass,
    /// `Literal` and `Dynamic` messages are plain text; `Detailed` chooses
    Fail(ErrorMessage<H>),
    Pending(PendingVerdict<H>),
}

impl<H: Host> Verdict<H> {
    pub fn fail(message: impl Into<ErrorMessage<H>>) -> Self {
        Verdict::Fail(message.into())
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Option<ErrorMessage<H>>>> + 'static,
    {
        Verdict::Pending(future.boxed_local())
    }
}

impl<H: Host> From<Option<ErrorMessage<H>>> for Verdict<H> {
    fn from(message: Option<ErrorMessage<H>>) -> Self {
        match message {
            Some(message) => Verdict::Fail(message),
            None => Verdict::Pass,
        }
    }
}

impl<H: Host> fmt::Debug for Verdict<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("Pass"),
            Verdict::Fail(message) => f.debug_tuple("Fail").field(message).finish(),
            Verdict::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Wrap a closure as a [`ValidatorFn`]
pub fn validator<H, F>(f: F) -> ValidatorFn<H>
where
    H: Host,
    F: Fn(&Field<'_, H>) -> Verdict<H> + 'static,
{
    Rc::new(f)
}

/// Result of invoking the validator
pub enum Run<H: Host> {
    Ready(Option<ErrorMessage<H>>),
    Deferred(PendingVerdict<H>),
}

/// Invoke the configured validator, if any
pub fn run<H: Host>(validator: Option<&ValidatorFn<H>>, field: &Field<'_, H>) -> Run<H> {
    let Some(validator) = validator else {
        return Run::Ready(None);
    };

    match validator(field) {
        Verdict::Pass => Run::Ready(None),
        Verdict::Fail(message) => Run::Ready(Some(message)),
        Verdict::Pending(future) => Run::Deferred(future),
    }
}

/// Normalize a settled verdict into pass (`None`) or a displayable failure
///
/// An empty text message counts as a pass. A message function that fails
/// rejects the validation instead.
pub fn settle<H: Host>(
    field: &Field<'_, H>,
    message: Option<ErrorMessage<H>>,
) -> Result<Option<ErrorDisplay<H::Payload>>> {
    let Some(message) = message else {
        return Ok(None);
    };

    let (payload, render) = message
        .resolve(field, false)
        .map_err(|source| ValidityError::Validator {
            field: field.name().to_string(),
            source,
        })?;
    if payload.as_text().is_some_and(|text| text.is_empty()) {
        return Ok(None);
    }

    ErrorDisplay::new(field.name(), payload, render).map(Some)
}
