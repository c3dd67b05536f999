//! Composes a CoinJoin transaction layout from party-owned inputs by reducing the
//! problem to integer constraint satisfaction and driving an external SMT solver
//! through a bounded, two-phase optimization loop.
//!
//! The pipeline, leaves first:
//!
//! - [`scenario`] — the immutable input and its validation.
//! - [`model`] — the flat `name -> value` satisfying assignment.
//! - [`formula`] — compiles a [`scenario::Scenario`] into a quantifier-free integer
//!   linear arithmetic formula.
//! - [`solver`] — wraps the back-end SMT oracle behind a timeout and a typed
//!   `Sat | Unsat | Unknown` result.
//! - [`decode`] — reconstructs a shuffled, sorted transaction from a model.
//! - [`optimize`] — the lexicographic two-phase search that ties the above together.
//! - [`verify`] — independent, solver-free checks of the testable properties a
//!   returned transaction must satisfy.

#![warn(missing_docs)]

pub mod decode;
pub mod error;
pub mod formula;
pub mod model;
pub mod optimize;
pub mod scenario;
pub mod solver;
pub mod verify;

pub use decode::{PartyAmt, Transaction};
pub use error::{ScenarioError, SolverError};
pub use formula::Objective;
pub use model::Model;
pub use optimize::optimize;
pub use scenario::{InputAmt, PartyId, Scenario, SolverConfig};
pub use solver::{SolveOutcome, SolverAdapter, Z3SolverAdapter};
