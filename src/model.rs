//! The flat, solver-independent representation of a satisfying assignment.
//!
//! A [`Model`] is produced once by the [`crate::solver`] adapter from a `Sat` result
//! and consumed by [`crate::decode`]. Keeping it a plain `name -> value` map (rather
//! than a borrow into the solver's own context) is what lets the model outlive the
//! per-call solver scope described in spec.md §5.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::scenario::PartyId;

/// A satisfying assignment: every named decision variable mapped to its integer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model(BTreeMap<String, i64>);

impl Model {
    /// Construct from an already-evaluated name -> value map.
    pub fn new(values: BTreeMap<String, i64>) -> Self {
        Self(values)
    }

    /// Look up a named symbol's value.
    pub fn get(&self, name: &str) -> Result<i64, SolverError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| SolverError::MissingSymbol(name.to_string()))
    }

    /// All `(name, value)` pairs, sorted by name. Used for the raw-model debug dump.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Sentinel party id used to mark an unused input/output slot.
pub const UNUSED_SLOT: i64 = -1;

/// Canonical decision-variable names, preserved verbatim from
/// `original_source/perfect-coinjoins/prototype.py` so the raw model dump stays
/// readable against the original prototype's own debug output.
pub mod names {
    use super::PartyId;

    /// `input_party[i]`
    pub fn input_party(i: usize) -> String {
        format!("input_party[{i}]")
    }
    /// `input_amt[i]`
    pub fn input_amt(i: usize) -> String {
        format!("input_amt[{i}]")
    }
    /// `output_party[j]`
    pub fn output_party(j: usize) -> String {
        format!("output_party[{j}]")
    }
    /// `output_amt[j]`
    pub fn output_amt(j: usize) -> String {
        format!("output_amt[{j}]")
    }
    /// `output_score[j]`
    pub fn output_score(j: usize) -> String {
        format!("output_score[{j}]")
    }
    /// `party_gives[p]`
    pub fn party_gives(p: PartyId) -> String {
        format!("party_gives[{p}]")
    }
    /// `party_gets[p]`
    pub fn party_gets(p: PartyId) -> String {
        format!("party_gets[{p}]")
    }
    /// `party_txfee[p]`
    pub fn party_txfee(p: PartyId) -> String {
        format!("party_txfee[{p}]")
    }
    /// `party_numinputs[p]`
    pub fn party_numinputs(p: PartyId) -> String {
        format!("party_numinputs[{p}]")
    }
    /// `party_numoutputs[p]`
    pub fn party_numoutputs(p: PartyId) -> String {
        format!("party_numoutputs[{p}]")
    }

    /// `total_in`
    pub const TOTAL_IN: &str = "total_in";
    /// `total_out`
    pub const TOTAL_OUT: &str = "total_out";
    /// `num_outputs`
    pub const NUM_OUTPUTS: &str = "num_outputs";
    /// `max_outputs`
    pub const MAX_OUTPUTS: &str = "max_outputs";
    /// `txsize`
    pub const TXSIZE: &str = "txsize";
    /// `txfee`
    pub const TXFEE: &str = "txfee";
    /// `anonymity_score`
    pub const ANONYMITY_SCORE: &str = "anonymity_score";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_symbol_errors() {
        let model = Model::new(BTreeMap::new());
        let err = model.get("num_outputs").unwrap_err();
        assert_eq!(err, SolverError::MissingSymbol("num_outputs".to_string()));
    }

    #[test]
    fn names_match_prototype_format() {
        assert_eq!(names::input_party(2), "input_party[2]");
        assert_eq!(names::output_amt(0), "output_amt[0]");
        assert_eq!(names::party_gives(PartyId(3)), "party_gives[3]");
    }
}
