use soroban_sdk::{
    contract, contractimpl, contractmeta, log, panic_with_error, vec, Address, Env, Vec,
};
use staking_common::validate_int_parameters;

use crate::{
    distribution::{checkpoint_all, fund_stream, settle_position, simulate_checkpoint},
    error::ContractError,
    math::{decimals_scale, early_withdraw_penalty, to_internal, to_token_amount},
    msg::{ConfigResponse, RewardAmount, StakingInitInfo},
    storage::{
        get_admin, get_config, get_position, get_reward_streams, remove_position, save_admin,
        save_config, save_position, save_reward_streams,
        utils::{
            decrease_totals, get_total_staked, get_weighted_total_staked, increase_totals,
            init_totals, is_staking_enabled, set_staking_enabled,
        },
        Config, Emission, Position, RewardStream,
    },
    token_contract, MAX_PENALTY_BPS, MAX_WEIGHT_CURVE_STEPS,
};

// Metadata that is added on to the WASM custom section
contractmeta!(
    key = "Description",
    val = "Weighted time-locked staking with multiple reward streams"
);

#[contract]
pub struct WeightedStaking;

pub trait WeightedStakingTrait {
    fn __constructor(env: Env, admin: Address, init_info: StakingInitInfo);

    /// Opens a position locking `amount` staking tokens for `lock_duration` seconds.
    fn initial_stake(
        env: Env,
        sender: Address,
        amount: i128,
        lock_duration: u64,
    ) -> Result<(), ContractError>;

    /// Pays out everything the sender earned on every reward stream.
    fn claim_all_rewards(env: Env, sender: Address) -> Result<Vec<RewardAmount>, ContractError>;

    /// Same as `claim_all_rewards`.
    fn claim_reward(env: Env, sender: Address) -> Result<Vec<RewardAmount>, ContractError>;

    /// Closes the position and returns the principal, minus the early exit penalty when
    /// the lock has not expired yet. Earned rewards stay claimable.
    fn withdraw(env: Env, sender: Address) -> Result<i128, ContractError>;

    fn add_new_reward_token(
        env: Env,
        sender: Address,
        token: Address,
        emission: Emission,
        amount_or_rate: i128,
        end_time: u64,
        decimals: u32,
    ) -> Result<u32, ContractError>;

    fn deposit_reward_tokens(
        env: Env,
        sender: Address,
        stream_index: u32,
        amount: i128,
    ) -> Result<(), ContractError>;

    fn change_stake_status(env: Env, sender: Address) -> Result<bool, ContractError>;

    // QUERIES

    fn query_config(env: Env) -> ConfigResponse;

    fn query_admin(env: Env) -> Address;

    fn query_staking_enabled(env: Env) -> bool;

    fn query_total_staked(env: Env) -> i128;

    fn query_w_total_staked(env: Env) -> u128;

    fn query_user_staked(env: Env, address: Address) -> i128;

    fn query_user_weight(env: Env, address: Address) -> u128;

    fn query_position(env: Env, address: Address) -> Result<Position, ContractError>;

    fn query_reward_streams(env: Env) -> Vec<RewardStream>;

    fn query_pending_rewards(
        env: Env,
        address: Address,
    ) -> Result<Vec<RewardAmount>, ContractError>;

    fn query_weight_for_duration(env: Env, lock_duration: u64) -> Result<u128, ContractError>;
}

#[contractimpl]
impl WeightedStakingTrait for WeightedStaking {
    fn __constructor(env: Env, admin: Address, init_info: StakingInitInfo) {
        validate_int_parameters!(init_info.reward_rate);

        if !(0..=MAX_PENALTY_BPS).contains(&init_info.early_withdraw_penalty_bps) {
            log!(
                &env,
                "Weighted Staking: Initialize: Penalty must be between 0 and 100%"
            );
            panic_with_error!(&env, ContractError::InvalidPenaltyBps);
        }

        if let Err(err) = validate_weight_curve(&init_info.weight_curve) {
            log!(&env, "Weighted Staking: Initialize: Invalid weight curve");
            panic_with_error!(&env, err);
        }

        if init_info.max_reward_streams == 0 {
            log!(
                &env,
                "Weighted Staking: Initialize: Reward stream limit must be positive"
            );
            panic_with_error!(&env, ContractError::TooManyRewardStreams);
        }

        let now = env.ledger().timestamp();
        let end_time = init_info.reward_end_time.unwrap_or(u64::MAX);
        if end_time <= now {
            log!(
                &env,
                "Weighted Staking: Initialize: Reward end time {} is not in the future",
                end_time
            );
            panic_with_error!(&env, ContractError::InvalidSchedule);
        }

        let decimals = token_contract::Client::new(&env, &init_info.staking_token).decimals();
        let base_stream = decimals_scale(decimals)
            .and_then(|scale| to_internal(init_info.reward_rate, scale))
            .map(|reward_rate| RewardStream {
                token: init_info.staking_token.clone(),
                decimals,
                emission: Emission::FixedRate,
                reward_rate,
                total_deposited: 0,
                distributed: 0,
                claimed: 0,
                start_time: now,
                end_time,
                acc_reward_per_weight: 0,
                last_update: now,
            })
            .unwrap_or_else(|err| {
                log!(
                    &env,
                    "Weighted Staking: Initialize: Unsupported staking token decimals {}",
                    decimals
                );
                panic_with_error!(&env, err);
            });

        let config = Config {
            staking_token: init_info.staking_token.clone(),
            punishment_recipient: init_info.punishment_recipient,
            weight_curve: init_info.weight_curve,
            early_withdraw_penalty_bps: init_info.early_withdraw_penalty_bps,
            max_reward_streams: init_info.max_reward_streams,
        };
        save_config(&env, &config);
        save_admin(&env, &admin);
        init_totals(&env);
        set_staking_enabled(&env, init_info.staking_enabled);
        save_reward_streams(&env, &vec![&env, base_stream]);

        env.events().publish(
            ("initialize", "Weighted staking contract"),
            &init_info.staking_token,
        );
    }

    fn initial_stake(
        env: Env,
        sender: Address,
        amount: i128,
        lock_duration: u64,
    ) -> Result<(), ContractError> {
        sender.require_auth();

        if !is_staking_enabled(&env) {
            log!(&env, "Weighted Staking: Initial stake: Staking is disabled");
            return Err(ContractError::StakingDisabled);
        }
        if amount <= 0 {
            log!(
                &env,
                "Weighted Staking: Initial stake: Trying to stake {} which is not positive",
                amount
            );
            return Err(ContractError::InvalidAmount);
        }
        if lock_duration == 0 {
            log!(
                &env,
                "Weighted Staking: Initial stake: Lock duration must be positive"
            );
            return Err(ContractError::InvalidLockDuration);
        }

        let position = get_position(&env, &sender);
        if position.as_ref().is_some_and(Position::is_active) {
            log!(
                &env,
                "Weighted Staking: Initial stake: Sender already has an active position"
            );
            return Err(ContractError::DuplicatePosition);
        }
        let mut position = position.unwrap_or_else(|| Position::new(&env));

        let config = get_config(&env);
        let now = env.ledger().timestamp();

        // accrual up to now belongs to the stakers present before this one
        let streams = checkpoint_all(&env, now)?;
        // snapshots the current accumulators, unclaimed rewards of a closed position are kept
        settle_position(&env, &mut position, &streams)?;

        position.principal = amount;
        position.weight = config.weight_curve.value(lock_duration);
        position.stake_timestamp = now;
        position.lock_until = now.saturating_add(lock_duration);

        let weighted_stake = position.weighted_stake()?;
        increase_totals(&env, amount, weighted_stake)?;
        save_position(&env, &sender, &position);

        transfer_tokens(
            &env,
            &config.staking_token,
            &sender,
            &env.current_contract_address(),
            amount,
        )?;

        env.events().publish(("initial_stake", "user"), &sender);
        env.events().publish(("initial_stake", "amount"), amount);
        env.events().publish(("initial_stake", "weight"), position.weight);

        Ok(())
    }

    fn claim_all_rewards(env: Env, sender: Address) -> Result<Vec<RewardAmount>, ContractError> {
        sender.require_auth();

        let mut position = get_position(&env, &sender).ok_or_else(|| {
            log!(&env, "Weighted Staking: Claim: Sender has no position");
            ContractError::NoActivePosition
        })?;

        let now = env.ledger().timestamp();
        let mut streams = checkpoint_all(&env, now)?;
        settle_position(&env, &mut position, &streams)?;

        let mut payouts: Vec<RewardAmount> = Vec::new(&env);
        for index in 0..streams.len() {
            let mut stream = streams.get_unchecked(index);
            let scale = decimals_scale(stream.decimals)?;
            let pending = position.pending_rewards.get(index).unwrap_or(0);

            let (amount, remainder) = to_token_amount(pending, scale)?;
            if amount == 0 {
                continue;
            }

            let paid = pending - remainder;
            stream.claimed = stream
                .claimed
                .checked_add(paid)
                .ok_or(ContractError::ContractMathError)?;
            position.pending_rewards.set(index, remainder);
            payouts.push_back(RewardAmount {
                token: stream.token.clone(),
                amount,
            });
            streams.set(index, stream);
        }
        save_reward_streams(&env, &streams);

        if position.is_active() {
            save_position(&env, &sender, &position);
        } else {
            // closed and paid out, sub-unit dust is dropped with it
            remove_position(&env, &sender);
        }

        for payout in payouts.iter() {
            transfer_tokens(
                &env,
                &payout.token,
                &env.current_contract_address(),
                &sender,
                payout.amount,
            )?;
            env.events().publish(("claim", "user"), &sender);
            env.events().publish(("claim", "token"), &payout.token);
            env.events().publish(("claim", "amount"), payout.amount);
        }

        Ok(payouts)
    }

    fn claim_reward(env: Env, sender: Address) -> Result<Vec<RewardAmount>, ContractError> {
        Self::claim_all_rewards(env, sender)
    }

    fn withdraw(env: Env, sender: Address) -> Result<i128, ContractError> {
        sender.require_auth();

        let mut position = get_position(&env, &sender)
            .filter(Position::is_active)
            .ok_or_else(|| {
                log!(&env, "Weighted Staking: Withdraw: Sender has no active position");
                ContractError::NoActivePosition
            })?;

        let config = get_config(&env);
        let now = env.ledger().timestamp();

        let streams = checkpoint_all(&env, now)?;
        // rewards stay in the pending buffers until claimed
        settle_position(&env, &mut position, &streams)?;

        let principal = position.principal;
        let weighted_stake = position.weighted_stake()?;
        decrease_totals(&env, principal, weighted_stake)?;

        let penalty = if now < position.lock_until {
            early_withdraw_penalty(
                &env,
                principal,
                config.early_withdraw_penalty_bps,
                position.lock_until - now,
                position.lock_until - position.stake_timestamp,
            )?
        } else {
            0
        };
        let returned = principal - penalty;

        position.close();
        save_position(&env, &sender, &position);

        let contract = env.current_contract_address();
        transfer_tokens(&env, &config.staking_token, &contract, &sender, returned)?;
        if penalty > 0 {
            transfer_tokens(
                &env,
                &config.staking_token,
                &contract,
                &config.punishment_recipient,
                penalty,
            )?;
            env.events().publish(("penalty", "recipient"), &config.punishment_recipient);
            env.events().publish(("penalty", "amount"), penalty);
        }

        env.events().publish(("withdraw", "user"), &sender);
        env.events().publish(("withdraw", "amount"), returned);

        Ok(returned)
    }

    fn add_new_reward_token(
        env: Env,
        sender: Address,
        token: Address,
        emission: Emission,
        amount_or_rate: i128,
        end_time: u64,
        decimals: u32,
    ) -> Result<u32, ContractError> {
        sender.require_auth();
        ensure_admin(&env, &sender)?;

        if amount_or_rate <= 0 {
            log!(
                &env,
                "Weighted Staking: Add reward token: Amount or rate must be positive"
            );
            return Err(ContractError::InvalidAmount);
        }
        let now = env.ledger().timestamp();
        if end_time <= now {
            log!(
                &env,
                "Weighted Staking: Add reward token: End time {} is not after the current time {}",
                end_time,
                now
            );
            return Err(ContractError::InvalidSchedule);
        }
        let scale = decimals_scale(decimals).inspect_err(|_| {
            log!(
                &env,
                "Weighted Staking: Add reward token: Unsupported decimals {}",
                decimals
            );
        })?;

        let max_reward_streams = get_config(&env).max_reward_streams;
        let mut streams = checkpoint_all(&env, now)?;
        if streams.len() >= max_reward_streams {
            log!(
                &env,
                "Weighted Staking: Add reward token: Already at the limit of {} reward streams",
                max_reward_streams
            );
            return Err(ContractError::TooManyRewardStreams);
        }
        let value = to_internal(amount_or_rate, scale)?;
        let mut stream = RewardStream {
            token: token.clone(),
            decimals,
            emission,
            reward_rate: 0,
            total_deposited: 0,
            distributed: 0,
            claimed: 0,
            start_time: now,
            end_time,
            acc_reward_per_weight: 0,
            last_update: now,
        };
        match emission {
            Emission::FixedRate => stream.reward_rate = value,
            Emission::Funded => fund_stream(&mut stream, value)?,
        }

        let index = streams.len();
        streams.push_back(stream);
        save_reward_streams(&env, &streams);

        if emission == Emission::Funded {
            transfer_tokens(
                &env,
                &token,
                &sender,
                &env.current_contract_address(),
                amount_or_rate,
            )?;
        }

        env.events().publish(("add_reward_token", "token"), &token);
        env.events().publish(("add_reward_token", "index"), index);

        Ok(index)
    }

    fn deposit_reward_tokens(
        env: Env,
        sender: Address,
        stream_index: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        sender.require_auth();
        ensure_admin(&env, &sender)?;

        if amount <= 0 {
            log!(
                &env,
                "Weighted Staking: Deposit rewards: Trying to deposit {} which is not positive",
                amount
            );
            return Err(ContractError::InvalidAmount);
        }

        let now = env.ledger().timestamp();
        // the new rate only applies from now on
        let mut streams = checkpoint_all(&env, now)?;
        let mut stream = streams.get(stream_index).ok_or_else(|| {
            log!(
                &env,
                "Weighted Staking: Deposit rewards: No reward stream with index {}",
                stream_index
            );
            ContractError::UnknownStream
        })?;

        let scale = decimals_scale(stream.decimals)?;
        fund_stream(&mut stream, to_internal(amount, scale)?)?;
        let token = stream.token.clone();
        streams.set(stream_index, stream);
        save_reward_streams(&env, &streams);

        transfer_tokens(
            &env,
            &token,
            &sender,
            &env.current_contract_address(),
            amount,
        )?;

        env.events().publish(("deposit_reward_tokens", "index"), stream_index);
        env.events().publish(("deposit_reward_tokens", "amount"), amount);

        Ok(())
    }

    fn change_stake_status(env: Env, sender: Address) -> Result<bool, ContractError> {
        sender.require_auth();
        ensure_admin(&env, &sender)?;

        checkpoint_all(&env, env.ledger().timestamp())?;

        let enabled = !is_staking_enabled(&env);
        set_staking_enabled(&env, enabled);

        env.events().publish(("change_stake_status", "enabled"), enabled);

        Ok(enabled)
    }

    // QUERIES

    fn query_config(env: Env) -> ConfigResponse {
        ConfigResponse {
            config: get_config(&env),
        }
    }

    fn query_admin(env: Env) -> Address {
        get_admin(&env)
    }

    fn query_staking_enabled(env: Env) -> bool {
        is_staking_enabled(&env)
    }

    fn query_total_staked(env: Env) -> i128 {
        get_total_staked(&env)
    }

    fn query_w_total_staked(env: Env) -> u128 {
        get_weighted_total_staked(&env)
    }

    fn query_user_staked(env: Env, address: Address) -> i128 {
        get_position(&env, &address).map_or(0, |position| position.principal)
    }

    fn query_user_weight(env: Env, address: Address) -> u128 {
        get_position(&env, &address).map_or(0, |position| position.weight)
    }

    fn query_position(env: Env, address: Address) -> Result<Position, ContractError> {
        get_position(&env, &address).ok_or(ContractError::NoActivePosition)
    }

    fn query_reward_streams(env: Env) -> Vec<RewardStream> {
        get_reward_streams(&env)
    }

    fn query_pending_rewards(
        env: Env,
        address: Address,
    ) -> Result<Vec<RewardAmount>, ContractError> {
        let streams = simulate_checkpoint(&env, env.ledger().timestamp())?;
        let mut position = get_position(&env, &address).unwrap_or_else(|| Position::new(&env));
        settle_position(&env, &mut position, &streams)?;

        let mut rewards = Vec::new(&env);
        for (index, stream) in streams.iter().enumerate() {
            let pending = position.pending_rewards.get(index as u32).unwrap_or(0);
            let (amount, _) = to_token_amount(pending, decimals_scale(stream.decimals)?)?;
            rewards.push_back(RewardAmount {
                token: stream.token,
                amount,
            });
        }

        Ok(rewards)
    }

    fn query_weight_for_duration(env: Env, lock_duration: u64) -> Result<u128, ContractError> {
        if lock_duration == 0 {
            return Err(ContractError::InvalidLockDuration);
        }
        Ok(get_config(&env).weight_curve.value(lock_duration))
    }
}

fn validate_weight_curve(curve: &curve::Curve) -> Result<(), ContractError> {
    curve.validate_monotonic_increasing()?;
    curve.validate_complexity(MAX_WEIGHT_CURVE_STEPS)?;
    let (min_weight, _) = curve.range();
    if min_weight == 0 {
        return Err(ContractError::InvalidWeightCurve);
    }

    Ok(())
}

fn ensure_admin(env: &Env, sender: &Address) -> Result<(), ContractError> {
    if *sender != get_admin(env) {
        log!(
            env,
            "Weighted Staking: Sender is not authorized to perform this action"
        );
        return Err(ContractError::Unauthorized);
    }

    Ok(())
}

fn transfer_tokens(
    env: &Env,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    if amount == 0 {
        return Ok(());
    }
    match token_contract::Client::new(env, token).try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(
                env,
                "Weighted Staking: Transfer: Moving {} tokens failed",
                amount
            );
            Err(ContractError::TransferFailed)
        }
    }
}
