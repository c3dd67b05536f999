//! The lexicographic two-phase search over `(anonymity_score, output count)`,
//! per spec.md §4.4.
//!
//! Phase one maximizes `anonymity_score` by repeatedly re-solving with a strictly
//! tighter lower bound; phase two then minimizes output count with the anonymity
//! score pinned at its best-known value. Both bounds are monotone and integer-bounded
//! (above by `max_outputs^2`, below by zero), so the loop is guaranteed to terminate
//! in finitely many solver calls.

use log::{debug, info};

use crate::decode::{self, Transaction};
use crate::error::SolverError;
use crate::formula::Objective;
use crate::model::{names, Model};
use crate::scenario::{Scenario, SolverConfig};
use crate::solver::{SolveOutcome, SolverAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    MaximizingAnonymity,
    MinimizingOutputs,
}

/// `optimize(scenario) -> Transaction | None`, per spec.md §4.4.
///
/// `Ok(None)` means the most relaxed problem was itself infeasible (spec.md §7's
/// "Infeasible" case). `Err` means the oracle adapter faulted — fatal, not retried.
pub fn optimize(
    scenario: &Scenario,
    config: &SolverConfig,
    solver: &dyn SolverAdapter,
    objective: Objective,
) -> Result<Option<Transaction>, SolverError> {
    let num_parties = scenario.parties().len();
    let max_outputs = 3 * num_parties;
    let mut min_outputs = max_outputs;
    let mut min_anonymity_score: i64 = 0;
    let mut phase = Phase::MaximizingAnonymity;
    let mut best_model: Option<Model> = None;
    let mut best_max_outputs = max_outputs;

    loop {
        // The slot count the formula is actually built with for this call — `decode`
        // must later be given this same bound, not whatever count of used slots the
        // returned model happens to report (slot assignment isn't index-biased, so a
        // model can legally leave used slots above that count).
        let call_max_outputs = match phase {
            Phase::MaximizingAnonymity => max_outputs,
            Phase::MinimizingOutputs => min_outputs - 1,
        };

        let outcome = match phase {
            Phase::MaximizingAnonymity => {
                let target = if min_anonymity_score > 0 {
                    min_anonymity_score + 1
                } else {
                    0
                };
                debug!(
                    "maximizing anonymity: max_outputs={call_max_outputs} target>={target}"
                );
                solver.solve(
                    scenario,
                    call_max_outputs,
                    Some(target),
                    objective,
                    config.solver_iteration_timeout_ms,
                )?
            }
            Phase::MinimizingOutputs => {
                debug!(
                    "minimizing outputs: max_outputs={call_max_outputs} anonymity>={min_anonymity_score}"
                );
                solver.solve(
                    scenario,
                    call_max_outputs,
                    Some(min_anonymity_score),
                    objective,
                    config.solver_iteration_timeout_ms,
                )?
            }
        };

        match outcome {
            SolveOutcome::Sat(model) => {
                let num_outputs_val = model.get(names::NUM_OUTPUTS)?;
                let anonymity_score_val = model.get(names::ANONYMITY_SCORE)?;
                min_outputs = num_outputs_val as usize;
                min_anonymity_score = anonymity_score_val;
                best_max_outputs = call_max_outputs;
                info!(
                    "{min_outputs} outputs, anonymity_score={min_anonymity_score}"
                );
                best_model = Some(model);
            }
            SolveOutcome::Unsat | SolveOutcome::Unknown => match phase {
                Phase::MaximizingAnonymity => {
                    if best_model.is_none() {
                        info!("no solution found for the most relaxed problem");
                        return Ok(None);
                    }
                    info!(
                        "anonymity score maximized at {min_anonymity_score}; minimizing output count"
                    );
                    phase = Phase::MinimizingOutputs;
                }
                Phase::MinimizingOutputs => break,
            },
        }
    }

    let model = best_model.expect("phase 2 is only entered once phase 1 produced a model");
    let transaction = decode::decode(&model, scenario.num_inputs(), best_max_outputs)?;
    Ok(Some(transaction))
}
