//! Error taxonomy for scenario validation and the solver adapter.
//!
//! Errors are plain enums with manual [`fmt::Display`] and [`std::error::Error`]
//! impls, matching the rest of this crate rather than reaching for a
//! derive-macro crate.

use core::fmt;

use crate::scenario::PartyId;

/// A [`Scenario`](crate::scenario::Scenario) is malformed and was rejected before any
/// solver call was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// `inputs` was empty.
    NoInputs,
    /// an input amount was zero.
    NonPositiveAmount {
        /// party that contributed the offending input
        party: PartyId,
        /// the offending amount
        amount: u64,
    },
    /// a party appears in `inputs` but has no entry in `fee_caps`.
    MissingFeeCap(PartyId),
    /// `min_feerate` was greater than `max_feerate`.
    FeerateBandInverted {
        /// configured minimum
        min: u64,
        /// configured maximum
        max: u64,
    },
    /// `max_party_fragmentation_factor` was zero.
    ZeroFragmentationFactor,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInputs => write!(f, "scenario has no inputs"),
            Self::NonPositiveAmount { party, amount } => {
                write!(
                    f,
                    "party {party} contributed a non-positive amount: {amount}"
                )
            }
            Self::MissingFeeCap(party) => {
                write!(f, "party {party} appears in inputs but has no fee_caps entry")
            }
            Self::FeerateBandInverted { min, max } => {
                write!(f, "min_feerate ({min}) is greater than max_feerate ({max})")
            }
            Self::ZeroFragmentationFactor => {
                write!(f, "max_party_fragmentation_factor must be at least 1")
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

/// The back-end oracle itself faulted. Fatal, not retried, propagates to the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// the underlying SMT context rejected the formula (should not happen for a
    /// well-formed formula; indicates an adapter bug or a back-end outage).
    ContextRejected(String),
    /// a `Sat` model did not contain a value for a symbol the caller expected.
    MissingSymbol(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextRejected(msg) => write!(f, "solver context rejected formula: {msg}"),
            Self::MissingSymbol(name) => write!(f, "model is missing symbol `{name}`"),
        }
    }
}

impl std::error::Error for SolverError {}
