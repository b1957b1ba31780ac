use curve::Curve;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::StellarAssetClient,
    Address, Env,
};

use crate::{
    contract::{WeightedStaking, WeightedStakingClient},
    msg::StakingInitInfo,
    token_contract,
};

pub const ONE_WEEK: u64 = 604_800;
pub const FOUR_WEEKS: u64 = 4 * ONE_WEEK;
pub const ONE_YEAR: u64 = 52 * ONE_WEEK;

/// Internal units per whole unit of a Stellar Asset Contract token (7 decimals).
pub const SAC_SCALE: u128 = 100_000_000_000;

pub const START: u64 = 1_000;

pub fn deploy_token_contract<'a>(env: &Env, admin: &Address) -> token_contract::Client<'a> {
    token_contract::Client::new(
        env,
        &env.register_stellar_asset_contract_v2(admin.clone())
            .address(),
    )
}

pub fn mint(env: &Env, token: &token_contract::Client, to: &Address, amount: i128) {
    StellarAssetClient::new(env, &token.address).mint(to, &amount);
}

pub fn set_time(env: &Env, timestamp: u64) {
    env.ledger().with_mut(|li| li.timestamp = timestamp);
}

/// One year lock weighs 2.0x, four weeks 1.5x.
pub fn tiered_curve(env: &Env) -> Curve {
    Curve::stepwise(env, &[(FOUR_WEEKS, 1_500), (ONE_YEAR, 2_000)])
}

pub fn init_info(env: &Env, staking_token: &Address, reward_rate: i128) -> StakingInitInfo {
    StakingInitInfo {
        staking_token: staking_token.clone(),
        punishment_recipient: Address::generate(env),
        reward_rate,
        reward_end_time: None,
        weight_curve: tiered_curve(env),
        early_withdraw_penalty_bps: 1_000,
        max_reward_streams: 8,
        staking_enabled: true,
    }
}

pub fn deploy_staking_contract<'a>(
    env: &Env,
    admin: &Address,
    init_info: StakingInitInfo,
) -> WeightedStakingClient<'a> {
    WeightedStakingClient::new(
        env,
        &env.register(WeightedStaking, (admin.clone(), init_info)),
    )
}

/// Deploys a staking token and the staking contract at `START`, with the base stream
/// funded with `base_rewards` tokens.
pub fn setup<'a>(
    env: &Env,
    reward_rate: i128,
    base_rewards: i128,
) -> (
    Address,
    token_contract::Client<'a>,
    WeightedStakingClient<'a>,
) {
    env.mock_all_auths();
    set_time(env, START);

    let admin = Address::generate(env);
    let token = deploy_token_contract(env, &admin);
    let staking = deploy_staking_contract(env, &admin, init_info(env, &token.address, reward_rate));

    if base_rewards > 0 {
        mint(env, &token, &admin, base_rewards);
        staking.deposit_reward_tokens(&admin, &0, &base_rewards);
    }

    (admin, token, staking)
}

/// Mints `amount` to a fresh user and stakes all of it.
pub fn stake_new_user(
    env: &Env,
    token: &token_contract::Client,
    staking: &WeightedStakingClient,
    amount: i128,
    lock_duration: u64,
) -> Address {
    let user = Address::generate(env);
    mint(env, token, &user, amount);
    staking.initial_stake(&user, &amount, &lock_duration);
    user
}
