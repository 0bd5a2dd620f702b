//! Swap valuation
//!
//! Prices a confirmed buy in the reference unit from the swap event of the
//! indexed transaction and the quote asset's reference price.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::transaction::{InnerSwap, ParsedTransaction};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    #[error("Transaction carries no swap event")]
    NoSwapEvent,

    #[error("Swap event has no inner swap")]
    NoInnerSwap,

    #[error("Swap event has {0} inner swaps, expected exactly one")]
    AmbiguousSwap(usize),

    #[error("Inner swap has {inputs} token inputs and {outputs} token outputs, expected one each")]
    AmbiguousTransfers { inputs: usize, outputs: usize },

    #[error("Swap produced no output tokens")]
    ZeroOutput,

    #[error("Reference price must be positive, got {0}")]
    InvalidPrice(f64),

    #[error("Block time {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Cost of a confirmed buy
#[derive(Debug, Clone, PartialEq)]
pub struct SwapValuation {
    pub input_mint: String,
    pub output_mint: String,
    /// SOL spent
    pub sol_paid: f64,
    /// Network fee, lamports
    pub sol_fee_paid: u64,
    /// Tokens received
    pub tokens_received: f64,
    pub sol_paid_reference: f64,
    pub sol_fee_paid_reference: f64,
    pub per_token_reference: f64,
    pub slot: u64,
    pub time: DateTime<Utc>,
    pub program: Option<String>,
}

fn single_hop(tx: &ParsedTransaction) -> Result<&InnerSwap, ValuationError> {
    let swap = tx.swap.as_ref().ok_or(ValuationError::NoSwapEvent)?;
    match swap.inner_swaps.as_slice() {
        [] => Err(ValuationError::NoInnerSwap),
        [hop] => Ok(hop),
        hops => Err(ValuationError::AmbiguousSwap(hops.len())),
    }
}

/// Value the swap of `tx` at `reference_price` (reference units per SOL).
///
/// Exactly one inner swap with exactly one token input and one token output
/// is accepted; anything else is rejected rather than guessed.
pub fn value_swap(
    tx: &ParsedTransaction,
    reference_price: f64,
) -> Result<SwapValuation, ValuationError> {
    if !reference_price.is_finite() || reference_price <= 0.0 {
        return Err(ValuationError::InvalidPrice(reference_price));
    }

    let hop = single_hop(tx)?;
    let (input, output) = match (hop.token_inputs.as_slice(), hop.token_outputs.as_slice()) {
        ([input], [output]) => (input, output),
        (inputs, outputs) => {
            return Err(ValuationError::AmbiguousTransfers {
                inputs: inputs.len(),
                outputs: outputs.len(),
            })
        }
    };

    if output.amount <= 0.0 {
        return Err(ValuationError::ZeroOutput);
    }

    let time = DateTime::from_timestamp(tx.timestamp, 0)
        .ok_or(ValuationError::InvalidTimestamp(tx.timestamp))?;

    let sol_paid_reference = input.amount * reference_price;
    let sol_fee_paid_reference = (tx.fee as f64 / LAMPORTS_PER_SOL) * reference_price;
    let per_token_reference = sol_paid_reference / output.amount;

    Ok(SwapValuation {
        input_mint: input.mint.clone(),
        output_mint: output.mint.clone(),
        sol_paid: input.amount,
        sol_fee_paid: tx.fee,
        tokens_received: output.amount,
        sol_paid_reference,
        sol_fee_paid_reference,
        per_token_reference,
        slot: tx.slot,
        time,
        program: hop.program.clone(),
    })
}
