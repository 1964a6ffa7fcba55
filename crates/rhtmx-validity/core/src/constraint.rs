// File: rhtmx-validity/core/src/constraint.rs
// Purpose: Standard constraints and the order they are reported in

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A standard, platform-evaluated validity rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    Required,
    MinLength,
    Min,
    MaxLength,
    Max,
    Step,
    Type,
    Pattern,
    BadInput,
}

impl Constraint {
    /// Reporting priority; the first violated constraint wins
    pub const PRIORITY: [Constraint; 9] = [
        Constraint::Required,
        Constraint::MinLength,
        Constraint::Min,
        Constraint::MaxLength,
        Constraint::Max,
        Constraint::Step,
        Constraint::Type,
        Constraint::Pattern,
        Constraint::BadInput,
    ];

    /// Configuration key, matching the HTML attribute where there is one
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::MinLength => "minlength",
            Constraint::Min => "min",
            Constraint::MaxLength => "maxlength",
            Constraint::Max => "max",
            Constraint::Step => "step",
            Constraint::Type => "type",
            Constraint::Pattern => "pattern",
            Constraint::BadInput => "badinput",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::PRIORITY
            .iter()
            .copied()
            .find(|constraint| constraint.as_str() == s)
            .ok_or_else(|| format!("Unknown constraint: {}", s))
    }
}

/// Snapshot of a control's `ValidityState`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityFlags {
    pub value_missing: bool,
    pub too_short: bool,
    pub range_underflow: bool,
    pub too_long: bool,
    pub range_overflow: bool,
    pub step_mismatch: bool,
    pub type_mismatch: bool,
    pub pattern_mismatch: bool,
    pub bad_input: bool,
    pub custom_error: bool,
}

impl ValidityFlags {
    pub fn violates(&self, constraint: Constraint) -> bool {
        match constraint {
            Constraint::Required => self.value_missing,
            Constraint::MinLength => self.too_short,
            Constraint::Min => self.range_underflow,
            Constraint::MaxLength => self.too_long,
            Constraint::Max => self.range_overflow,
            Constraint::Step => self.step_mismatch,
            Constraint::Type => self.type_mismatch,
            Constraint::Pattern => self.pattern_mismatch,
            Constraint::BadInput => self.bad_input,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.custom_error && first_violation(self).is_none()
    }
}

/// First violated standard constraint, in [`Constraint::PRIORITY`] order
///
/// `custom_error` is ignored: callers clear stale custom validity before
/// inspecting.
pub fn first_violation(flags: &ValidityFlags) -> Option<Constraint> {
    Constraint::PRIORITY
        .iter()
        .copied()
        .find(|constraint| flags.violates(*constraint))
}
