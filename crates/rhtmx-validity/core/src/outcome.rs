// File: rhtmx-validity/core/src/outcome.rs
// Purpose: Uniform result of a validation call, settled now or later

use std::fmt;
use std::future::IntoFuture;

use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::Result;

/// Whether a field (or a whole form) is valid
///
/// `Ready` when everything ran synchronously; `Pending` when a custom
/// validator deferred its answer. Both variants can be awaited.
pub enum Outcome {
    Ready(bool),
    Pending(LocalBoxFuture<'static, Result<bool>>),
}

impl Outcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        !self.is_ready()
    }

    /// The result, if it is already known
    pub fn ready(&self) -> Option<bool> {
        match self {
            Outcome::Ready(valid) => Some(*valid),
            Outcome::Pending(_) => None,
        }
    }
}

impl IntoFuture for Outcome {
    type Output = Result<bool>;
    type IntoFuture = LocalBoxFuture<'static, Result<bool>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Outcome::Ready(valid) => future::ready(Ok(valid)).boxed_local(),
            Outcome::Pending(pending) => pending,
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(valid) => f.debug_tuple("Ready").field(valid).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Settle every outcome concurrently
///
/// A rejection counts as a failed field rather than aborting the others.
pub async fn settle_all(outcomes: Vec<Outcome>) -> Vec<bool> {
    let settled = outcomes.into_iter().map(|outcome| async move {
        match outcome.await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::warn!(error = %err, "field validation rejected; counting it as failed");
                false
            }
        }
    });

    future::join_all(settled).await
}
