//! Scenario Harness (spec.md §4.5): runs the optimizer against one embedded,
//! fixed scenario and reports the result. Takes no arguments; the scenario below is
//! the "example community CoinJoin config" from the originating prototype, an
//! 8-party, 12-input configuration sized to exercise every clause in the formula.

use std::collections::BTreeMap;
use std::process::ExitCode;

use log::info;

use coinjoin_smt::{formula::Objective, InputAmt, Scenario, SolverConfig, Z3SolverAdapter};

fn community_scenario() -> Scenario {
    let inputs = vec![
        InputAmt::from((1, 100_000_000)),
        InputAmt::from((2, 130_000_000)),
        InputAmt::from((3, 70_000_000)),
        InputAmt::from((3, 70_000_000)),
        InputAmt::from((4, 107_354_073)),
        InputAmt::from((5, 101_063_506)),
        InputAmt::from((6, 122_929_194)),
        InputAmt::from((7, 27_490_915)),
        InputAmt::from((7, 85_582_261)),
        InputAmt::from((8, 58_595_885)),
        InputAmt::from((8, 22_478_305)),
        InputAmt::from((8, 22_438_276)),
    ];
    let fee_caps: BTreeMap<_, _> = [
        (1u32, 757u64),
        (2, 500),
        (3, 1337),
        (4, 520),
        (5, 511),
        (6, 505),
        (7, 1030),
        (8, 1508),
    ]
    .into_iter()
    .map(|(p, cap)| (p.into(), cap))
    .collect();

    Scenario::new(inputs, fee_caps, 5, 11, 30_000, 3_000, 3)
        .expect("the embedded community config is well-formed")
}

fn main() -> ExitCode {
    env_logger::init();

    let scenario = community_scenario();
    let config = SolverConfig::default();
    let solver = Z3SolverAdapter;

    info!(
        "solving community config: {} parties, {} inputs",
        scenario.parties().len(),
        scenario.num_inputs()
    );

    match coinjoin_smt::optimize(&scenario, &config, &solver, Objective::AnonymityScore) {
        Ok(Some(tx)) => {
            println!(
                "found a transaction: {} inputs, {} outputs, total_in={}, total_out={}",
                tx.selected_inputs.len(),
                tx.outputs.len(),
                tx.total_in(),
                tx.total_out()
            );
            for output in &tx.outputs {
                println!("  output: party {} gets {} sats", output.party, output.amount);
            }

            let violations = coinjoin_smt::verify::check(&scenario, &tx);
            if violations.is_empty() {
                info!("independent verification passed with no violations");
            } else {
                for violation in &violations {
                    eprintln!("verification violation: {violation:?}");
                }
            }

            if log::log_enabled!(log::Level::Debug) {
                match serde_json::to_string_pretty(&tx) {
                    Ok(json) => log::debug!("{json}"),
                    Err(err) => log::debug!("failed to serialize transaction: {err}"),
                }
            }

            if violations.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Ok(None) => {
            println!("no feasible transaction exists for this scenario");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("solver adapter fault: {err}");
            ExitCode::FAILURE
        }
    }
}
