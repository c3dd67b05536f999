//! Compiles a [`Scenario`] into a quantifier-free integer linear arithmetic formula.
//!
//! Every sub-clause below corresponds one-to-one with spec.md §4.1. Slots are fixed
//! arrays (`0..num_inputs`, `0..max_outputs`) so every aggregate is a bounded sum over
//! a known index range and the solver never has to reason about quantifiers. `-1` is
//! the reserved sentinel for "slot unused"; it participates directly in arithmetic via
//! `ite` rather than needing a parallel boolean "is used" variable.

use std::collections::BTreeMap;

use z3::ast::{Ast, Bool, Int};
use z3::Context;

use crate::model::{names, UNUSED_SLOT};
use crate::scenario::Scenario;

/// Which historical objective the optimization driver pursues.
///
/// spec.md §4.4's "Earlier variant" note: two source variants coexist with different
/// objectives. Both are implemented; [`Objective::AnonymityScore`] is the default, per
/// spec.md's stated preference for "the more general formulation".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    /// maximize `anonymity_score` (spec.md's canonical variant).
    #[default]
    AnonymityScore,
}

/// A named integer decision variable, kept around so its value can be read back out
/// of a `Sat` model after the solver call returns.
pub struct SymbolTable<'ctx> {
    vars: BTreeMap<String, Int<'ctx>>,
}

impl<'ctx> SymbolTable<'ctx> {
    fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Declare (or re-fetch) a named integer constant.
    fn declare(&mut self, ctx: &'ctx Context, name: String) -> Int<'ctx> {
        self.vars
            .entry(name.clone())
            .or_insert_with(|| Int::new_const(ctx, name))
            .clone()
    }

    /// All declared symbols, for evaluating a full [`crate::model::Model`] out of a
    /// `Sat` result.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Int<'ctx>)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A self-contained constraint set: conjoined assertion plus the symbol table needed
/// to decode a satisfying assignment.
pub struct Formula<'ctx> {
    /// the full conjunction of every sub-clause below
    pub assertion: Bool<'ctx>,
    /// every named decision variable that appears in `assertion`
    pub symbols: SymbolTable<'ctx>,
}

fn bool_to_int<'ctx>(ctx: &'ctx Context, b: &Bool<'ctx>) -> Int<'ctx> {
    b.ite(&Int::from_i64(ctx, 1), &Int::from_i64(ctx, 0))
}

fn sum<'ctx>(ctx: &'ctx Context, terms: &[Int<'ctx>]) -> Int<'ctx> {
    if terms.is_empty() {
        return Int::from_i64(ctx, 0);
    }
    let refs: Vec<&Int<'ctx>> = terms.iter().collect();
    Int::add(ctx, &refs)
}

fn conjoin<'ctx>(ctx: &'ctx Context, clauses: Vec<Bool<'ctx>>) -> Bool<'ctx> {
    let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
    Bool::and(ctx, &refs)
}

/// `build(scenario, max_outputs, min_anonymity_score) -> Formula`, per spec.md §4.1.
///
/// Satisfying assignments correspond one-to-one (modulo slot permutation) with valid
/// CoinJoin transactions for `scenario` laid out in at most `max_outputs` output slots,
/// whose `anonymity_score >= min_anonymity_score` when that bound is supplied.
pub fn build<'ctx>(
    ctx: &'ctx Context,
    scenario: &Scenario,
    max_outputs: usize,
    min_anonymity_score: Option<i64>,
) -> Formula<'ctx> {
    let mut syms = SymbolTable::new();
    let mut clauses: Vec<Bool<'ctx>> = Vec::new();

    let num_inputs = scenario.num_inputs();
    let parties = scenario.parties();

    // 1. Input domain: either bound to the scenario's declared (party, amount), or
    // the unused sentinel (-1, 0).
    let mut input_party = Vec::with_capacity(num_inputs);
    let mut input_amt = Vec::with_capacity(num_inputs);
    for (i, input) in scenario.inputs.iter().enumerate() {
        let p = syms.declare(ctx, names::input_party(i));
        let a = syms.declare(ctx, names::input_amt(i));
        let used = Bool::and(
            ctx,
            &[
                &p._eq(&Int::from_i64(ctx, input.party.0 as i64)),
                &a._eq(&Int::from_i64(ctx, input.amount as i64)),
            ],
        );
        let unused = Bool::and(
            ctx,
            &[
                &p._eq(&Int::from_i64(ctx, UNUSED_SLOT)),
                &a._eq(&Int::from_i64(ctx, 0)),
            ],
        );
        clauses.push(Bool::or(ctx, &[&used, &unused]));
        input_party.push(p);
        input_amt.push(a);
    }

    // 2. Output domain: either the unused sentinel, or amount >= min_output_amt.
    // Plus the pairwise amount-delta disjunction across every ordered pair.
    // Degenerate when min_output_amt > 0 (reduces to `> 0`); preserved as-is per the
    // source variant rather than tightened to `min_output_amt - 1`.
    let min_amt_floor = 0i64.min(scenario.min_output_amt as i64 - 1);
    let mut output_party = Vec::with_capacity(max_outputs);
    let mut output_amt = Vec::with_capacity(max_outputs);
    let mut output_unused = Vec::with_capacity(max_outputs);
    for j in 0..max_outputs {
        let p = syms.declare(ctx, names::output_party(j));
        let a = syms.declare(ctx, names::output_amt(j));
        let is_unused = p._eq(&Int::from_i64(ctx, UNUSED_SLOT));
        clauses.push(is_unused.ite(
            &a._eq(&Int::from_i64(ctx, 0)),
            &a.gt(&Int::from_i64(ctx, min_amt_floor)),
        ));
        output_unused.push(is_unused);
        output_party.push(p);
        output_amt.push(a);
    }
    for j in 0..max_outputs {
        let mut delta_ok = vec![output_unused[j].clone()];
        for k in 0..max_outputs {
            if k == j {
                continue;
            }
            let equal = output_amt[j]._eq(&output_amt[k]);
            let far_enough = Bool::or(
                ctx,
                &[
                    &output_amt[k].ge(&Int::add(
                        ctx,
                        &[&output_amt[j], &Int::from_i64(ctx, scenario.min_output_amt_delta as i64)],
                    )),
                    &output_amt[k].le(&Int::sub(
                        ctx,
                        &[&output_amt[j], &Int::from_i64(ctx, scenario.min_output_amt_delta as i64)],
                    )),
                ],
            );
            delta_ok.push(Bool::or(ctx, &[&equal, &far_enough]));
        }
        let refs: Vec<&Bool<'ctx>> = delta_ok.iter().collect();
        clauses.push(Bool::or(ctx, &refs));
    }

    // 3. Used-output count and the symbolic max_outputs binding.
    let num_outputs = syms.declare(ctx, names::NUM_OUTPUTS.to_string());
    let used_terms: Vec<Int<'ctx>> = output_unused
        .iter()
        .map(|u| bool_to_int(ctx, &u.not()))
        .collect();
    clauses.push(num_outputs._eq(&sum(ctx, &used_terms)));

    let max_outputs_sym = syms.declare(ctx, names::MAX_OUTPUTS.to_string());
    clauses.push(max_outputs_sym._eq(&Int::from_i64(ctx, max_outputs as i64)));

    // 4. Per-party aggregates.
    let mut party_numinputs = BTreeMap::new();
    let mut party_gives = BTreeMap::new();
    let mut party_gets = BTreeMap::new();
    let mut party_txfee = BTreeMap::new();
    let mut party_numoutputs = BTreeMap::new();

    for &party in &parties {
        let fee_cap = *scenario
            .fee_caps
            .get(&party)
            .expect("Scenario::new guarantees every contributing party has a fee cap");

        let numinputs = syms.declare(ctx, names::party_numinputs(party));
        let gives = syms.declare(ctx, names::party_gives(party));
        let owned_in: Vec<Bool<'ctx>> = input_party
            .iter()
            .map(|p| p._eq(&Int::from_i64(ctx, party.0 as i64)))
            .collect();
        let owned_in_int: Vec<Int<'ctx>> = owned_in.iter().map(|o| bool_to_int(ctx, o)).collect();
        clauses.push(numinputs._eq(&sum(ctx, &owned_in_int)));
        let amt_in: Vec<Int<'ctx>> = owned_in
            .iter()
            .zip(input_amt.iter())
            .map(|(owned, amt)| owned.ite(amt, &Int::from_i64(ctx, 0)))
            .collect();
        clauses.push(gives._eq(&sum(ctx, &amt_in)));

        let txfee = syms.declare(ctx, names::party_txfee(party));
        clauses.push(txfee.le(&Int::from_i64(ctx, fee_cap as i64)));
        clauses.push(txfee.ge(&Int::from_i64(ctx, 0)));

        let gets = syms.declare(ctx, names::party_gets(party));
        clauses.push(gets._eq(&Int::sub(ctx, &[&gives, &txfee])));

        let numoutputs = syms.declare(ctx, names::party_numoutputs(party));
        let owned_out: Vec<Bool<'ctx>> = output_party
            .iter()
            .map(|p| p._eq(&Int::from_i64(ctx, party.0 as i64)))
            .collect();
        let owned_out_int: Vec<Int<'ctx>> =
            owned_out.iter().map(|o| bool_to_int(ctx, o)).collect();
        clauses.push(numoutputs._eq(&sum(ctx, &owned_out_int)));
        let amt_out: Vec<Int<'ctx>> = owned_out
            .iter()
            .zip(output_amt.iter())
            .map(|(owned, amt)| owned.ite(amt, &Int::from_i64(ctx, 0)))
            .collect();
        clauses.push(gets._eq(&sum(ctx, &amt_out)));

        // fragmentation
        clauses.push(numoutputs.le(&Int::mul(
            ctx,
            &[
                &Int::from_i64(ctx, scenario.max_party_fragmentation_factor as i64),
                &numinputs,
            ],
        )));

        party_numinputs.insert(party, numinputs);
        party_gives.insert(party, gives);
        party_gets.insert(party, gets);
        party_txfee.insert(party, txfee);
        party_numoutputs.insert(party, numoutputs);
    }

    // 5. Balance and feerate envelope.
    let total_in = syms.declare(ctx, names::TOTAL_IN.to_string());
    let total_out = syms.declare(ctx, names::TOTAL_OUT.to_string());
    let txsize = syms.declare(ctx, names::TXSIZE.to_string());
    let txfee = syms.declare(ctx, names::TXFEE.to_string());

    clauses.push(total_in._eq(&sum(ctx, &input_amt)));
    clauses.push(total_out._eq(&sum(ctx, &output_amt)));
    let all_party_gives: Vec<Int<'ctx>> = parties.iter().map(|p| party_gives[p].clone()).collect();
    clauses.push(total_in._eq(&sum(ctx, &all_party_gives)));
    let all_party_gets: Vec<Int<'ctx>> = parties.iter().map(|p| party_gets[p].clone()).collect();
    clauses.push(total_out._eq(&sum(ctx, &all_party_gets)));
    clauses.push(total_in._eq(&Int::add(ctx, &[&total_out, &txfee])));

    let num_used_inputs = sum(
        ctx,
        &parties
            .iter()
            .map(|p| party_numinputs[p].clone())
            .collect::<Vec<_>>(),
    );
    let txsize_rhs = Int::add(
        ctx,
        &[
            &Int::from_i64(ctx, 11),
            &Int::mul(ctx, &[&Int::from_i64(ctx, 68), &num_used_inputs]),
            &Int::mul(ctx, &[&Int::from_i64(ctx, 31), &num_outputs]),
        ],
    );
    clauses.push(txsize._eq(&txsize_rhs));
    clauses.push(txfee.ge(&Int::mul(
        ctx,
        &[&Int::from_i64(ctx, scenario.min_feerate as i64), &txsize],
    )));
    clauses.push(txfee.le(&Int::mul(
        ctx,
        &[&Int::from_i64(ctx, scenario.max_feerate as i64), &txsize],
    )));

    // 6. Anonymity constraints.
    let mut output_score = Vec::with_capacity(max_outputs);
    for j in 0..max_outputs {
        let score = syms.declare(ctx, names::output_score(j));
        let mut not_unique_terms = Vec::with_capacity(max_outputs - 1);
        let mut equal_not_ours = Vec::with_capacity(max_outputs - 1);
        for k in 0..max_outputs {
            if k == j {
                continue;
            }
            let same_amount = output_amt[k]._eq(&output_amt[j]);
            let different_owner = output_party[k]._eq(&output_party[j]).not();
            let matches = Bool::and(ctx, &[&same_amount, &different_owner]);
            not_unique_terms.push(matches.clone());
            equal_not_ours.push(bool_to_int(ctx, &matches));
        }
        clauses.push(score._eq(&sum(ctx, &equal_not_ours)));

        let refs: Vec<&Bool<'ctx>> = not_unique_terms.iter().collect();
        let has_partner = Bool::or(ctx, &refs);
        clauses.push(Bool::or(ctx, &[&output_unused[j], &has_partner]));

        output_score.push(score);
    }
    let anonymity_score = syms.declare(ctx, names::ANONYMITY_SCORE.to_string());
    clauses.push(anonymity_score._eq(&sum(ctx, &output_score)));
    if let Some(bound) = min_anonymity_score {
        clauses.push(anonymity_score.ge(&Int::from_i64(ctx, bound)));
    }

    Formula {
        assertion: conjoin(ctx, clauses),
        symbols: syms,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use z3::{Config, Context, SatResult, Solver};

    use super::*;
    use crate::scenario::{InputAmt, PartyId};

    fn three_party_scenario() -> Scenario {
        // spec.md §8 end-to-end scenario 1
        Scenario::new(
            vec![
                InputAmt::from((1, 100_000_000)),
                InputAmt::from((2, 130_000_000)),
                InputAmt::from((3, 70_000_000)),
                InputAmt::from((3, 70_000_000)),
            ],
            BTreeMap::from([(PartyId(1), 0), (PartyId(2), 17), (PartyId(3), 0)]),
            5,
            5,
            1,
            1,
            3,
        )
        .unwrap()
    }

    #[test]
    fn build_declares_every_input_and_output_symbol() {
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let scenario = three_party_scenario();
        let formula = build(&ctx, &scenario, 6, None);

        for i in 0..scenario.num_inputs() {
            assert!(formula.symbols.iter().any(|(n, _)| n == names::input_party(i)));
            assert!(formula.symbols.iter().any(|(n, _)| n == names::input_amt(i)));
        }
        for j in 0..6 {
            assert!(formula.symbols.iter().any(|(n, _)| n == names::output_amt(j)));
        }
    }

    #[test]
    fn relaxed_problem_for_example_scenario_is_sat() {
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let scenario = three_party_scenario();
        let formula = build(&ctx, &scenario, 9, None);

        let solver = Solver::new(&ctx);
        solver.assert(&formula.assertion);
        assert_eq!(solver.check(), SatResult::Sat);
    }

    #[test]
    fn unreachable_anonymity_bound_is_unsat() {
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let scenario = three_party_scenario();
        // with only 9 output slots, no assignment can reach a score this high.
        let formula = build(&ctx, &scenario, 9, Some(1_000));

        let solver = Solver::new(&ctx);
        solver.assert(&formula.assertion);
        assert_eq!(solver.check(), SatResult::Unsat);
    }
}

