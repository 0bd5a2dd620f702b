//! Parsed transaction view
//!
//! Normalised shape of an indexed transaction: only the instruction list and
//! the swap event are kept, everything else in the indexer payload is dropped
//! at the adapter boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mints::MintPair;

/// Minimum account count of a Raydium pool-initialise instruction
pub const POOL_INIT_MIN_ACCOUNTS: usize = 10;

/// Account offsets of the two pool mints inside the initialise instruction
pub const POOL_MINT_A_INDEX: usize = 8;
pub const POOL_MINT_B_INDEX: usize = 9;

/// A single top-level instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInstruction {
    pub program_id: String,
    pub accounts: Vec<String>,
}

/// One mint movement inside a swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub mint: String,
    /// UI amount (decimals applied)
    pub amount: f64,
}

/// One hop of an aggregated swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerSwap {
    pub token_inputs: Vec<TokenTransfer>,
    pub token_outputs: Vec<TokenTransfer>,
    /// Label of the program that executed the hop, when the indexer knows it
    pub program: Option<String>,
}

/// Swap event attached to an indexed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub inner_swaps: Vec<InnerSwap>,
}

/// Indexed transaction as consumed by the resolver and the valuation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub signature: String,
    /// Network fee in lamports
    pub fee: u64,
    pub slot: u64,
    /// Block time, unix seconds
    pub timestamp: i64,
    pub source: String,
    pub instructions: Vec<ParsedInstruction>,
    pub swap: Option<SwapEvent>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoolMintError {
    #[error("Transaction has no instructions")]
    NoInstructions,

    #[error("No instruction for pool program {0}")]
    NoPoolInstruction(String),

    #[error("Pool instruction has {found} accounts, need at least 10")]
    TooFewAccounts { found: usize },

    #[error("Pool instruction carries an empty mint account")]
    EmptyMintAccount,
}

impl PoolMintError {
    /// The indexer may not have the full transaction yet; only a structurally
    /// broken instruction is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PoolMintError::EmptyMintAccount)
    }
}

/// Locate the pool-initialise instruction and classify its two mints.
///
/// The account matching `quote_mint` is the SOL side; the other one is the
/// new token. When neither matches, account 9 is taken as the SOL side.
pub fn extract_pool_mints(
    tx: &ParsedTransaction,
    program_id: &str,
    quote_mint: &str,
) -> Result<MintPair, PoolMintError> {
    if tx.instructions.is_empty() {
        return Err(PoolMintError::NoInstructions);
    }

    let instruction = tx
        .instructions
        .iter()
        .find(|ix| ix.program_id == program_id)
        .ok_or_else(|| PoolMintError::NoPoolInstruction(program_id.to_string()))?;

    if instruction.accounts.len() < POOL_INIT_MIN_ACCOUNTS {
        return Err(PoolMintError::TooFewAccounts {
            found: instruction.accounts.len(),
        });
    }

    let account_a = &instruction.accounts[POOL_MINT_A_INDEX];
    let account_b = &instruction.accounts[POOL_MINT_B_INDEX];
    if account_a.is_empty() || account_b.is_empty() {
        return Err(PoolMintError::EmptyMintAccount);
    }

    if account_a == quote_mint {
        Ok(MintPair::new(account_b.clone(), account_a.clone()))
    } else {
        Ok(MintPair::new(account_a.clone(), account_b.clone()))
    }
}
