use curve::Curve;
use soroban_sdk::{
    contracttype, log, panic_with_error, symbol_short, Address, ConversionError, Env, Symbol,
    TryFromVal, Val, Vec,
};
use staking_common::ttl::{
    INSTANCE_RENEWAL_THRESHOLD, INSTANCE_TARGET_TTL, PERSISTENT_RENEWAL_THRESHOLD,
    PERSISTENT_TARGET_TTL,
};

use crate::error::ContractError;

pub const ADMIN: Symbol = symbol_short!("ADMIN");
const CONFIG: Symbol = symbol_short!("CONFIG");

#[derive(Clone, Copy)]
#[repr(u32)]
pub enum DataKey {
    TotalStaked = 0,
    WeightedTotalStaked = 1,
    StakingEnabled = 2,
    RewardStreams = 3,
}

impl TryFromVal<Env, DataKey> for Val {
    type Error = ConversionError;

    fn try_from_val(_env: &Env, v: &DataKey) -> Result<Self, Self::Error> {
        Ok((*v as u32).into())
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PositionKey {
    Position(Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Token locked by stakers; also paid out by the base reward stream.
    pub staking_token: Address,
    /// Receives the deduction taken from withdrawals made before `lock_until`.
    pub punishment_recipient: Address,
    /// Maps the chosen lock duration onto a weight in `WEIGHT_PRECISION` units.
    pub weight_curve: Curve,
    /// Deduction applied to a withdrawal made right after staking, in bps.
    /// Decays linearly to zero at the end of the lock.
    pub early_withdraw_penalty_bps: i64,
    /// Upper limit on the number of reward streams, the base stream included
    pub max_reward_streams: u32,
}

pub fn get_config(env: &Env) -> Config {
    bump_instance(env);
    env.storage().instance().get(&CONFIG).unwrap_or_else(|| {
        log!(env, "Weighted Staking: Get config: Config not set");
        panic_with_error!(env, ContractError::ConfigNotSet);
    })
}

pub fn save_config(env: &Env, config: &Config) {
    env.storage().instance().set(&CONFIG, config);
    bump_instance(env);
}

pub fn save_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&ADMIN, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Address {
    bump_instance(env);
    env.storage().instance().get(&ADMIN).unwrap_or_else(|| {
        log!(env, "Weighted Staking: Get admin: Admin not set");
        panic_with_error!(env, ContractError::AdminNotSet);
    })
}

/// How rewards of a stream are released over time.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Emission {
    /// Rate is given when the stream is registered and never changes.
    FixedRate = 0,
    /// Rate is `total_deposited / (end_time - start_time)`, recomputed on every deposit.
    Funded = 1,
}

/// One reward token emission schedule together with its accumulator.
/// All amounts are kept in `INTERNAL_DECIMALS` units.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardStream {
    pub token: Address,
    pub decimals: u32,
    pub emission: Emission,
    /// Internal units released per second while the stream is running.
    pub reward_rate: u128,
    /// Sum of everything ever deposited into the stream.
    pub total_deposited: u128,
    /// Part of `total_deposited` already credited to the accumulator.
    pub distributed: u128,
    /// Part of `distributed` already transferred to stakers.
    pub claimed: u128,
    pub start_time: u64,
    pub end_time: u64,
    /// Cumulative reward per weighted stake unit, scaled by `ACC_PRECISION`.
    pub acc_reward_per_weight: u128,
    pub last_update: u64,
}

pub fn get_reward_streams(env: &Env) -> Vec<RewardStream> {
    let streams = env.storage().persistent().get(&DataKey::RewardStreams);
    if streams.is_some() {
        env.storage().persistent().extend_ttl(
            &DataKey::RewardStreams,
            PERSISTENT_RENEWAL_THRESHOLD,
            PERSISTENT_TARGET_TTL,
        );
    }

    streams.unwrap_or_else(|| Vec::new(env))
}

pub fn save_reward_streams(env: &Env, streams: &Vec<RewardStream>) {
    env.storage()
        .persistent()
        .set(&DataKey::RewardStreams, streams);
    env.storage().persistent().extend_ttl(
        &DataKey::RewardStreams,
        PERSISTENT_RENEWAL_THRESHOLD,
        PERSISTENT_TARGET_TTL,
    );
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    /// Amount of staked tokens, zero once withdrawn
    pub principal: i128,
    /// Multiplier assigned at stake time, in `WEIGHT_PRECISION` units
    pub weight: u128,
    pub stake_timestamp: u64,
    /// Withdrawals before this timestamp are penalized
    pub lock_until: u64,
    /// Accumulator value of every stream at the last settlement, by stream index.
    /// Streams registered after the last settlement have an implicit debt of zero.
    pub reward_debt: Vec<u128>,
    /// Settled but not yet claimed rewards in internal units, by stream index
    pub pending_rewards: Vec<u128>,
}

impl Position {
    pub fn new(env: &Env) -> Self {
        Position {
            principal: 0,
            weight: 0,
            stake_timestamp: 0,
            lock_until: 0,
            reward_debt: Vec::new(env),
            pending_rewards: Vec::new(env),
        }
    }

    pub fn is_active(&self) -> bool {
        self.principal > 0
    }

    /// `principal * weight`, zero for a closed position.
    pub fn weighted_stake(&self) -> Result<u128, ContractError> {
        if !self.is_active() {
            return Ok(0);
        }
        (self.principal as u128)
            .checked_mul(self.weight)
            .ok_or(ContractError::ContractMathError)
    }

    pub fn close(&mut self) {
        self.principal = 0;
        self.weight = 0;
        self.stake_timestamp = 0;
        self.lock_until = 0;
    }
}

pub fn get_position(env: &Env, user: &Address) -> Option<Position> {
    let key = PositionKey::Position(user.clone());
    let position = env.storage().persistent().get(&key);
    if position.is_some() {
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_RENEWAL_THRESHOLD,
            PERSISTENT_TARGET_TTL,
        );
    }

    position
}

pub fn save_position(env: &Env, user: &Address, position: &Position) {
    let key = PositionKey::Position(user.clone());
    env.storage().persistent().set(&key, position);
    env.storage().persistent().extend_ttl(
        &key,
        PERSISTENT_RENEWAL_THRESHOLD,
        PERSISTENT_TARGET_TTL,
    );
}

pub fn remove_position(env: &Env, user: &Address) {
    env.storage()
        .persistent()
        .remove(&PositionKey::Position(user.clone()));
}

pub mod utils {
    use super::*;

    pub fn init_totals(env: &Env) {
        env.storage().instance().set(&DataKey::TotalStaked, &0i128);
        env.storage()
            .instance()
            .set(&DataKey::WeightedTotalStaked, &0u128);
        bump_instance(env);
    }

    pub fn get_total_staked(env: &Env) -> i128 {
        bump_instance(env);
        env.storage()
            .instance()
            .get(&DataKey::TotalStaked)
            .unwrap_or(0i128)
    }

    pub fn get_weighted_total_staked(env: &Env) -> u128 {
        bump_instance(env);
        env.storage()
            .instance()
            .get(&DataKey::WeightedTotalStaked)
            .unwrap_or(0u128)
    }

    pub fn increase_totals(env: &Env, amount: i128, weighted: u128) -> Result<(), ContractError> {
        let total = get_total_staked(env)
            .checked_add(amount)
            .ok_or(ContractError::ContractMathError)?;
        let weighted_total = get_weighted_total_staked(env)
            .checked_add(weighted)
            .ok_or(ContractError::ContractMathError)?;
        save_totals(env, total, weighted_total);
        Ok(())
    }

    pub fn decrease_totals(env: &Env, amount: i128, weighted: u128) -> Result<(), ContractError> {
        let total = get_total_staked(env)
            .checked_sub(amount)
            .filter(|total| *total >= 0)
            .ok_or(ContractError::ContractMathError)?;
        let weighted_total = get_weighted_total_staked(env)
            .checked_sub(weighted)
            .ok_or(ContractError::ContractMathError)?;
        save_totals(env, total, weighted_total);
        Ok(())
    }

    fn save_totals(env: &Env, total: i128, weighted_total: u128) {
        env.storage().instance().set(&DataKey::TotalStaked, &total);
        env.storage()
            .instance()
            .set(&DataKey::WeightedTotalStaked, &weighted_total);
        bump_instance(env);
    }

    pub fn is_staking_enabled(env: &Env) -> bool {
        bump_instance(env);
        env.storage()
            .instance()
            .get(&DataKey::StakingEnabled)
            .unwrap_or(false)
    }

    pub fn set_staking_enabled(env: &Env, enabled: bool) {
        env.storage()
            .instance()
            .set(&DataKey::StakingEnabled, &enabled);
        bump_instance(env);
    }
}

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_RENEWAL_THRESHOLD, INSTANCE_TARGET_TTL);
}
