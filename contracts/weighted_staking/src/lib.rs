#![no_std]
mod contract;
mod distribution;
mod error;
mod math;
mod msg;
mod storage;

pub mod token_contract {
    // Fungible token interface implemented by every Soroban token, including
    // Stellar Asset Contracts.
    pub use soroban_sdk::token::Client;
}

pub use contract::{WeightedStaking, WeightedStakingClient};

/// Weight of a 1.0x multiplier.
pub const WEIGHT_PRECISION: u128 = 1_000;

/// Reward amounts are normalized to this many decimals before they enter the accumulators.
pub const INTERNAL_DECIMALS: u32 = 18;

/// Fixed point scale of the reward-per-weighted-unit accumulators.
pub const ACC_PRECISION: u128 = 1_000_000_000_000_000_000;

pub const MAX_WEIGHT_CURVE_STEPS: u32 = 16;

pub const MAX_PENALTY_BPS: i64 = 10_000;

#[cfg(test)]
mod tests;
