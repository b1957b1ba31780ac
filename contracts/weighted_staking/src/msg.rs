use curve::Curve;
use soroban_sdk::{contracttype, Address};

use crate::storage::Config;

/// Deployment parameters of the staking contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakingInitInfo {
    /// Token locked by stakers and paid by the base reward stream
    pub staking_token: Address,
    pub punishment_recipient: Address,
    /// Base stream emission in staking token units per second
    pub reward_rate: i128,
    /// End of the base stream, `None` keeps it running indefinitely
    pub reward_end_time: Option<u64>,
    pub weight_curve: Curve,
    pub early_withdraw_penalty_bps: i64,
    /// Upper limit on the number of reward streams, the base stream included
    pub max_reward_streams: u32,
    pub staking_enabled: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigResponse {
    pub config: Config,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAmount {
    pub token: Address,
    /// Amount in the token's own units
    pub amount: i128,
}
