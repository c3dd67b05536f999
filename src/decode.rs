//! Reconstructs a shuffled, sorted [`Transaction`] from a satisfying [`Model`],
//! per spec.md §4.3.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::model::{names, Model, UNUSED_SLOT};
use crate::scenario::PartyId;

/// One party-tagged amount, used for both selected inputs and produced outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyAmt {
    /// owning party
    pub party: PartyId,
    /// amount in satoshis
    pub amount: u64,
}

/// The CoinJoin layout recovered from a satisfying model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// the inputs consumed by the transaction, in randomized order
    pub selected_inputs: Vec<PartyAmt>,
    /// the outputs produced by the transaction, randomized then sorted descending by amount
    pub outputs: Vec<PartyAmt>,
}

impl Transaction {
    /// Total satoshis entering the transaction.
    pub fn total_in(&self) -> u64 {
        self.selected_inputs.iter().map(|i| i.amount).sum()
    }

    /// Total satoshis leaving the transaction via outputs.
    pub fn total_out(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}

/// Pop uniformly-random elements off `buf` until it is empty, via a cryptographically
/// strong source. This is a destructive Fisher-Yates: each pop is a uniform draw from
/// whatever remains, matching `original_source/perfect-coinjoins/prototype.py`'s
/// `randbelow`-driven `while buf: pop(randbelow(len(buf)))` loop.
fn shuffle_by_popping<T>(mut buf: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(buf.len());
    let mut rng = OsRng;
    while !buf.is_empty() {
        let idx = rng.gen_range(0..buf.len());
        out.push(buf.swap_remove(idx));
    }
    out
}

/// `decode(model) -> Transaction`, per spec.md §4.3.
pub fn decode(model: &Model, num_inputs: usize, max_outputs: usize) -> Result<Transaction, SolverError> {
    let mut input_buf = Vec::with_capacity(num_inputs);
    for i in 0..num_inputs {
        let party = model.get(&names::input_party(i))?;
        if party == UNUSED_SLOT {
            continue;
        }
        let amount = model.get(&names::input_amt(i))?;
        input_buf.push(PartyAmt {
            party: PartyId(party as u32),
            amount: amount as u64,
        });
    }

    let mut output_buf = Vec::with_capacity(max_outputs);
    for j in 0..max_outputs {
        let party = model.get(&names::output_party(j))?;
        if party == UNUSED_SLOT {
            continue;
        }
        let amount = model.get(&names::output_amt(j))?;
        output_buf.push(PartyAmt {
            party: PartyId(party as u32),
            amount: amount as u64,
        });
    }

    let selected_inputs = shuffle_by_popping(input_buf);
    let mut outputs = shuffle_by_popping(output_buf);
    outputs.sort_by(|a, b| b.amount.cmp(&a.amount));

    Ok(Transaction {
        selected_inputs,
        outputs,
    })
}
