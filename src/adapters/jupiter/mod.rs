//! Jupiter Adapter
//!
//! Implementation of the quote and swap-builder ports for the Jupiter DEX
//! aggregator.

mod client;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig};
pub use quote::QuoteResponse;
pub use swap::{SwapRequest, SwapResponse};
