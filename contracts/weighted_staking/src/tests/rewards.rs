use pretty_assertions::assert_eq;
use soroban_decimal::Decimal;
use soroban_sdk::{testutils::Address as _, vec, Address, Env};
use staking_common::utils::assert_approx_ratio;

use super::setup::{set_time, setup, stake_new_user, FOUR_WEEKS, ONE_YEAR, SAC_SCALE, START};
use crate::{error::ContractError, msg::RewardAmount};

#[test]
fn rewards_follow_weighted_share() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 100, 1_000_000);

    let user_a = stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);

    set_time(&env, START + 5);
    assert_eq!(
        staking.claim_all_rewards(&user_a),
        vec![
            &env,
            RewardAmount {
                token: token.address.clone(),
                amount: 500
            }
        ]
    );

    set_time(&env, START + 9);
    assert_eq!(
        staking.claim_reward(&user_a),
        vec![
            &env,
            RewardAmount {
                token: token.address.clone(),
                amount: 400
            }
        ]
    );

    // 2_000_000 against 1_500_000 weighted units
    let user_b = stake_new_user(&env, &token, &staking, 1_000, FOUR_WEEKS);
    assert_eq!(staking.query_w_total_staked(), 3_500_000);

    set_time(&env, START + 16);
    let claimed_a = staking.claim_all_rewards(&user_a);
    let claimed_b = staking.claim_all_rewards(&user_b);
    assert_eq!(claimed_a.get_unchecked(0).amount, 400);
    assert_eq!(claimed_b.get_unchecked(0).amount, 300);

    assert_eq!(token.balance(&user_a), 1_300);
    assert_eq!(token.balance(&user_b), 300);
}

#[test]
fn claiming_twice_pays_once() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 100, 1_000_000);
    let user = stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);

    set_time(&env, START + 10);
    assert_eq!(staking.claim_all_rewards(&user).len(), 1);
    assert_eq!(staking.claim_all_rewards(&user), vec![&env]);
    assert_eq!(token.balance(&user), 1_000);
}

#[test]
fn claim_without_position() {
    let env = Env::default();
    let (_, _, staking) = setup(&env, 100, 1_000_000);

    assert_eq!(
        staking.try_claim_all_rewards(&Address::generate(&env)),
        Err(Ok(ContractError::NoActivePosition))
    );
}

#[test]
fn period_without_stakers_is_not_credited() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 100, 1_000_000);

    set_time(&env, START + 10);
    let user = stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);

    set_time(&env, START + 15);
    assert_eq!(staking.claim_all_rewards(&user).get_unchecked(0).amount, 500);

    let base = staking.query_reward_streams().get_unchecked(0);
    assert_eq!(base.distributed, 500 * SAC_SCALE);
    assert_eq!(base.claimed, 500 * SAC_SCALE);
}

#[test]
fn pending_rewards_query_matches_claim() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 100, 1_000_000);
    let user_a = stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);
    let user_b = stake_new_user(&env, &token, &staking, 1_000, FOUR_WEEKS);

    set_time(&env, START + 7);
    let pending = staking.query_pending_rewards(&user_b);
    assert_eq!(
        pending,
        vec![
            &env,
            RewardAmount {
                token: token.address.clone(),
                amount: 300
            }
        ]
    );
    // queries do not checkpoint
    assert_eq!(
        staking.query_reward_streams().get_unchecked(0).last_update,
        START
    );

    assert_eq!(staking.claim_all_rewards(&user_b), pending);
    assert_eq!(staking.query_pending_rewards(&user_a).get_unchecked(0).amount, 400);
    assert_eq!(staking.query_pending_rewards(&user_b).get_unchecked(0).amount, 0);
}

#[test]
fn unknown_user_has_nothing_pending() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 100, 1_000_000);
    stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);

    set_time(&env, START + 7);
    let pending = staking.query_pending_rewards(&Address::generate(&env));
    assert_eq!(pending.get_unchecked(0).amount, 0);
}

#[test]
fn rewards_are_proportional_to_weighted_stake() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 60, 1_000_000);

    let stakes = [(1_000i128, ONE_YEAR), (2_000, FOUR_WEEKS), (500, ONE_YEAR)];
    let mut users = [
        Address::generate(&env),
        Address::generate(&env),
        Address::generate(&env),
    ];
    for (user, (amount, lock)) in users.iter_mut().zip(stakes) {
        *user = stake_new_user(&env, &token, &staking, amount, lock);
    }
    let weighted_total = staking.query_w_total_staked();
    assert_eq!(weighted_total, 6_000_000);

    set_time(&env, START + 10);
    let claimed: [i128; 3] = [
        staking.claim_all_rewards(&users[0]).get_unchecked(0).amount,
        staking.claim_all_rewards(&users[1]).get_unchecked(0).amount,
        staking.claim_all_rewards(&users[2]).get_unchecked(0).amount,
    ];
    assert_eq!(claimed, [200, 300, 100]);

    let total_claimed: i128 = claimed.iter().sum();
    for (user, amount) in users.iter().zip(claimed) {
        let weighted = staking.query_user_staked(user) as u128 * staking.query_user_weight(user);
        assert!(assert_approx_ratio(
            Decimal::from_ratio(amount as u128, total_claimed as u128),
            Decimal::from_ratio(weighted, weighted_total),
            Decimal::percent(1),
        ));
    }
}

#[test]
fn weight_does_not_change_after_lock_expires() {
    let env = Env::default();
    let (_, token, staking) = setup(&env, 70, 200_000_000);
    let user_a = stake_new_user(&env, &token, &staking, 1_000, FOUR_WEEKS);
    let user_b = stake_new_user(&env, &token, &staking, 1_000, ONE_YEAR);

    let after_lock = START + FOUR_WEEKS + 100;
    set_time(&env, after_lock);
    staking.claim_all_rewards(&user_a);
    staking.claim_all_rewards(&user_b);

    assert_eq!(staking.query_user_weight(&user_a), 1_500);
    assert_eq!(staking.query_w_total_staked(), 3_500_000);

    set_time(&env, after_lock + 10);
    assert_eq!(staking.claim_all_rewards(&user_a).get_unchecked(0).amount, 300);
    assert_eq!(staking.claim_all_rewards(&user_b).get_unchecked(0).amount, 400);
}
