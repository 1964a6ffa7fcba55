//! RHTMX Validity Core
//!
//! Form validity engine built on native constraint validation.
//! Observes one form, validates its fields on events or on demand, and reports
//! failures through `aria-invalid`, an `aria-describedby` error container and
//! the control's native custom validity.
//!
//! The engine talks to the document through the [`Host`] trait. The browser
//! binding lives in `rhtmx-validity-wasm`; [`MemoryDocument`] is a headless
//! host for tests and server-side use.

pub mod config;
pub mod constraint;
pub mod error;
pub mod host;
pub mod memory;
pub mod messages;
pub mod observer;
pub mod outcome;
pub mod resolver;
pub mod sink;
pub mod validator;

pub use config::{ObserverOptions, ValidateOptions, ValidityConfig};
pub use constraint::{Constraint, ValidityFlags};
pub use error::{Result, ValidityError};
pub use host::{Field, Host, Payload};
pub use memory::{MemoryDocument, NodeId};
pub use messages::{ErrorDisplay, ErrorMessage, ErrorMessages, Message};
pub use observer::ValidityObserver;
pub use outcome::Outcome;
pub use resolver::FieldTarget;
pub use sink::{DomSink, ErrorSink, Report};
pub use validator::{validator, Verdict};
