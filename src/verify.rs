//! Plain-Rust checks for the universally-quantified properties in spec.md §8.
//!
//! These recompute every invariant directly from a [`Transaction`] and its
//! originating [`Scenario`] — no solver involved — so they can be run against any
//! returned transaction as a cheap independent sanity check, and reused as the
//! backbone of the integration tests under `tests/`.

use std::collections::BTreeMap;

use crate::decode::Transaction;
use crate::scenario::{PartyId, Scenario};

/// A violated testable property, naming which one and the values that disagreed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `sum(inputs) != sum(outputs) + txfee` for any feerate in the configured band.
    Balance { total_in: u64, total_out: u64 },
    /// a party paid more in fees than its cap, or was paid to net-give.
    FeeCap {
        party: PartyId,
        contribution: i64,
        cap: u64,
    },
    /// an output fell below `min_output_amt`.
    MinimumOutput { amount: u64, min: u64 },
    /// two distinct output amounts were closer than `min_output_amt_delta`.
    AmountSeparation { a: u64, b: u64, min_delta: u64 },
    /// an output had no other output sharing its amount under a different owner.
    NonUniqueOutput { party: PartyId, amount: u64 },
    /// a party received more outputs than its fragmentation allowance.
    Fragmentation {
        party: PartyId,
        numoutputs: usize,
        allowance: usize,
    },
}

/// Run every check in spec.md §8 against `tx`, returning every violation found.
pub fn check(scenario: &Scenario, tx: &Transaction) -> Vec<Violation> {
    let mut violations = Vec::new();

    let total_in = tx.total_in();
    let total_out = tx.total_out();
    let txsize = 11 + 68 * tx.selected_inputs.len() as u64 + 31 * tx.outputs.len() as u64;
    let txfee = total_in.saturating_sub(total_out);
    let implied_feerate_in_band = txsize > 0
        && txfee >= scenario.min_feerate * txsize
        && txfee <= scenario.max_feerate * txsize;
    if total_in != total_out + txfee || !implied_feerate_in_band {
        violations.push(Violation::Balance {
            total_in,
            total_out,
        });
    }

    let mut party_gives: BTreeMap<PartyId, i64> = BTreeMap::new();
    let mut party_gets: BTreeMap<PartyId, i64> = BTreeMap::new();
    for input in &tx.selected_inputs {
        *party_gives.entry(input.party).or_default() += input.amount as i64;
    }
    for output in &tx.outputs {
        *party_gets.entry(output.party).or_default() += output.amount as i64;
    }
    for (&party, &gives) in &party_gives {
        let gets = party_gets.get(&party).copied().unwrap_or(0);
        let contribution = gives - gets;
        let cap = scenario.fee_caps.get(&party).copied().unwrap_or(0);
        if contribution < 0 || contribution as u64 > cap {
            violations.push(Violation::FeeCap {
                party,
                contribution,
                cap,
            });
        }
    }

    for output in &tx.outputs {
        if output.amount < scenario.min_output_amt {
            violations.push(Violation::MinimumOutput {
                amount: output.amount,
                min: scenario.min_output_amt,
            });
        }
    }

    for (i, a) in tx.outputs.iter().enumerate() {
        for b in tx.outputs.iter().skip(i + 1) {
            let diff = a.amount.abs_diff(b.amount);
            if diff != 0 && diff < scenario.min_output_amt_delta {
                violations.push(Violation::AmountSeparation {
                    a: a.amount,
                    b: b.amount,
                    min_delta: scenario.min_output_amt_delta,
                });
            }
        }
    }

    for output in &tx.outputs {
        let has_partner = tx
            .outputs
            .iter()
            .any(|other| other.amount == output.amount && other.party != output.party);
        if !has_partner {
            violations.push(Violation::NonUniqueOutput {
                party: output.party,
                amount: output.amount,
            });
        }
    }

    let mut numinputs: BTreeMap<PartyId, usize> = BTreeMap::new();
    let mut numoutputs: BTreeMap<PartyId, usize> = BTreeMap::new();
    for input in &tx.selected_inputs {
        *numinputs.entry(input.party).or_default() += 1;
    }
    for output in &tx.outputs {
        *numoutputs.entry(output.party).or_default() += 1;
    }
    for (&party, &count) in &numoutputs {
        let allowance =
            numinputs.get(&party).copied().unwrap_or(0) * scenario.max_party_fragmentation_factor as usize;
        if count > allowance {
            violations.push(Violation::Fragmentation {
                party,
                numoutputs: count,
                allowance,
            });
        }
    }

    violations
}
