use soroban_sdk::{Env, Vec};

use crate::{
    error::ContractError,
    math::mul_div,
    storage::{
        get_reward_streams, save_reward_streams, utils::get_weighted_total_staked, Emission,
        Position, RewardStream,
    },
    ACC_PRECISION,
};

/// Advances the accumulator of `stream` up to `now` for the given weighted total.
///
/// Emission stops at `end_time` and can never exceed what was deposited into the stream.
/// Time that passes while nothing is staked is skipped rather than credited later.
pub fn checkpoint_stream(
    env: &Env,
    stream: &mut RewardStream,
    weighted_total: u128,
    now: u64,
) -> Result<(), ContractError> {
    let effective_time = now.min(stream.end_time);
    if effective_time <= stream.last_update {
        return Ok(());
    }

    if weighted_total > 0 {
        let elapsed = u128::from(effective_time - stream.last_update);
        let available = stream.total_deposited.saturating_sub(stream.distributed);
        let emitted = stream
            .reward_rate
            .checked_mul(elapsed)
            .ok_or(ContractError::ContractMathError)?
            .min(available);

        if emitted > 0 {
            let increase = mul_div(env, emitted, ACC_PRECISION, weighted_total)?;
            stream.acc_reward_per_weight = stream
                .acc_reward_per_weight
                .checked_add(increase)
                .ok_or(ContractError::ContractMathError)?;
            stream.distributed += emitted;
        }
    }

    stream.last_update = effective_time;
    Ok(())
}

/// Returns every stream advanced to `now` without persisting anything.
pub fn simulate_checkpoint(env: &Env, now: u64) -> Result<Vec<RewardStream>, ContractError> {
    let weighted_total = get_weighted_total_staked(env);
    let mut streams = get_reward_streams(env);
    for index in 0..streams.len() {
        let mut stream = streams.get_unchecked(index);
        checkpoint_stream(env, &mut stream, weighted_total, now)?;
        streams.set(index, stream);
    }

    Ok(streams)
}

/// Checkpoints all reward streams against the current weighted total and saves them.
/// Must run before the weighted total or any accumulator is read or changed.
pub fn checkpoint_all(env: &Env, now: u64) -> Result<Vec<RewardStream>, ContractError> {
    let streams = simulate_checkpoint(env, now)?;
    save_reward_streams(env, &streams);

    Ok(streams)
}

/// Moves everything the position earned since its last settlement into its pending buffers
/// and snapshots the current accumulators as its new debt.
pub fn settle_position(
    env: &Env,
    position: &mut Position,
    streams: &Vec<RewardStream>,
) -> Result<(), ContractError> {
    let weighted_stake = position.weighted_stake()?;

    for (index, stream) in streams.iter().enumerate() {
        let index = index as u32;
        let debt = position.reward_debt.get(index).unwrap_or(0);
        let pending = position.pending_rewards.get(index).unwrap_or(0);

        let accrued = stream
            .acc_reward_per_weight
            .checked_sub(debt)
            .ok_or(ContractError::ContractMathError)?;
        let owed = mul_div(env, weighted_stake, accrued, ACC_PRECISION)?;
        let pending = pending
            .checked_add(owed)
            .ok_or(ContractError::ContractMathError)?;

        set_or_push(&mut position.reward_debt, index, stream.acc_reward_per_weight);
        set_or_push(&mut position.pending_rewards, index, pending);
    }

    Ok(())
}

/// Rate of a `Funded` stream: everything deposited spread over its whole schedule.
pub fn funded_reward_rate(stream: &RewardStream) -> Result<u128, ContractError> {
    let duration = stream
        .end_time
        .checked_sub(stream.start_time)
        .filter(|duration| *duration > 0)
        .ok_or(ContractError::InvalidSchedule)?;

    Ok(stream.total_deposited / u128::from(duration))
}

/// Adds a deposit to the stream, re-deriving the rate where the schedule depends on it.
pub fn fund_stream(stream: &mut RewardStream, amount: u128) -> Result<(), ContractError> {
    stream.total_deposited = stream
        .total_deposited
        .checked_add(amount)
        .ok_or(ContractError::ContractMathError)?;
    if stream.emission == Emission::Funded {
        stream.reward_rate = funded_reward_rate(stream)?;
    }

    Ok(())
}

fn set_or_push(values: &mut Vec<u128>, index: u32, value: u128) {
    if index < values.len() {
        values.set(index, value);
    } else {
        values.push_back(value);
    }
}
