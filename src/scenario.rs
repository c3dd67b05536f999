//! The immutable input to a CoinJoin composition run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// An opaque identifier for a participant contributing inputs and receiving outputs.
///
/// Kept distinct from the raw `i64` the solver uses for the "unused slot" sentinel
/// (`-1`) so that sentinel never leaks into the public API as a valid party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(pub u32);

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PartyId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A single party-owned, spendable input: `(party, satoshis)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAmt {
    /// owning party
    pub party: PartyId,
    /// amount in satoshis
    pub amount: u64,
}

impl From<(u32, u64)> for InputAmt {
    fn from((party, amount): (u32, u64)) -> Self {
        Self {
            party: PartyId(party),
            amount,
        }
    }
}

/// The immutable configuration for one CoinJoin composition run.
///
/// See spec.md §3 for field semantics; [`Scenario::new`] enforces every invariant
/// spec.md §7 calls "malformed scenario" before any solver call is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// ordered sequence of party-owned inputs
    pub inputs: Vec<InputAmt>,
    /// party -> maximum satoshis that party will contribute towards the tx fee
    pub fee_caps: BTreeMap<PartyId, u64>,
    /// minimum acceptable satoshis-per-vbyte
    pub min_feerate: u64,
    /// maximum acceptable satoshis-per-vbyte
    pub max_feerate: u64,
    /// minimum satoshis for any non-empty output
    pub min_output_amt: u64,
    /// minimum absolute difference between any two distinct output amounts
    pub min_output_amt_delta: u64,
    /// a party contributing `k` inputs may receive at most `k * factor` outputs
    pub max_party_fragmentation_factor: u32,
}

impl Scenario {
    /// Validate and construct a [`Scenario`].
    ///
    /// Rejects the "malformed scenario" cases from spec.md §7 up front so that no
    /// partial formula is ever built from bad input.
    pub fn new(
        inputs: Vec<InputAmt>,
        fee_caps: BTreeMap<PartyId, u64>,
        min_feerate: u64,
        max_feerate: u64,
        min_output_amt: u64,
        min_output_amt_delta: u64,
        max_party_fragmentation_factor: u32,
    ) -> Result<Self, ScenarioError> {
        if inputs.is_empty() {
            return Err(ScenarioError::NoInputs);
        }
        for input in &inputs {
            if input.amount == 0 {
                return Err(ScenarioError::NonPositiveAmount {
                    party: input.party,
                    amount: input.amount,
                });
            }
            if !fee_caps.contains_key(&input.party) {
                return Err(ScenarioError::MissingFeeCap(input.party));
            }
        }
        if min_feerate > max_feerate {
            return Err(ScenarioError::FeerateBandInverted {
                min: min_feerate,
                max: max_feerate,
            });
        }
        if max_party_fragmentation_factor == 0 {
            return Err(ScenarioError::ZeroFragmentationFactor);
        }

        Ok(Self {
            inputs,
            fee_caps,
            min_feerate,
            max_feerate,
            min_output_amt,
            min_output_amt_delta,
            max_party_fragmentation_factor,
        })
    }

    /// The distinct set of parties contributing at least one input.
    pub fn parties(&self) -> BTreeSet<PartyId> {
        self.inputs.iter().map(|i| i.party).collect()
    }

    /// Number of input slots (`i` ranges over `0..num_inputs`).
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// How many inputs a given party contributed.
    pub fn party_input_count(&self, party: PartyId) -> usize {
        self.inputs.iter().filter(|i| i.party == party).count()
    }
}

/// Wall-clock and solver-call knobs that are not part of the [`Scenario`] data model
/// proper (spec.md §6's "configuration options" that govern the driver/adapter rather
/// than the constraint system itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// wall-clock ceiling, in milliseconds, per individual solver call
    pub solver_iteration_timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        // matches original_source/perfect-coinjoins/prototype.py's module constant
        Self {
            solver_iteration_timeout_ms: 180_000,
        }
    }
}
