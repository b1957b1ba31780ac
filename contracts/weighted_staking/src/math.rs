use soroban_sdk::{Env, U256};

use crate::{error::ContractError, INTERNAL_DECIMALS, MAX_PENALTY_BPS};

/// `a * b / denominator` with a 256 bit intermediate product, rounded down.
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> Result<u128, ContractError> {
    if denominator == 0 {
        return Err(ContractError::ContractMathError);
    }
    if a == 0 || b == 0 {
        return Ok(0);
    }
    U256::from_u128(env, a)
        .mul(&U256::from_u128(env, b))
        .div(&U256::from_u128(env, denominator))
        .to_u128()
        .ok_or(ContractError::ContractMathError)
}

/// Factor converting an amount with `decimals` places into internal units.
pub fn decimals_scale(decimals: u32) -> Result<u128, ContractError> {
    if decimals > INTERNAL_DECIMALS {
        return Err(ContractError::InvalidDecimals);
    }
    10u128
        .checked_pow(INTERNAL_DECIMALS - decimals)
        .ok_or(ContractError::ContractMathError)
}

pub fn to_internal(amount: i128, scale: u128) -> Result<u128, ContractError> {
    u128::try_from(amount)
        .ok()
        .and_then(|amount| amount.checked_mul(scale))
        .ok_or(ContractError::ContractMathError)
}

/// Splits an internal amount into the whole token units that can be transferred
/// and the remainder that stays behind.
pub fn to_token_amount(internal: u128, scale: u128) -> Result<(i128, u128), ContractError> {
    let amount = i128::try_from(internal / scale).map_err(|_| ContractError::ContractMathError)?;
    Ok((amount, internal % scale))
}

/// Early exit deduction: `principal * penalty_bps / 10_000`, scaled down linearly by the part
/// of the lock that is still remaining. Rounded down once, over a 256 bit product.
pub fn early_withdraw_penalty(
    env: &Env,
    principal: i128,
    penalty_bps: i64,
    remaining_lock: u64,
    lock_duration: u64,
) -> Result<i128, ContractError> {
    if principal <= 0 || penalty_bps <= 0 || remaining_lock == 0 || lock_duration == 0 {
        return Ok(0);
    }
    let penalty_bps = penalty_bps.min(MAX_PENALTY_BPS) as u128;
    let remaining_lock = u128::from(remaining_lock.min(lock_duration));

    let penalty = mul_div(
        env,
        principal as u128,
        penalty_bps * remaining_lock,
        MAX_PENALTY_BPS as u128 * u128::from(lock_duration),
    )?;

    i128::try_from(penalty).map_err(|_| ContractError::ContractMathError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn mul_div_rounds_down() {
        let env = Env::default();
        assert_eq!(mul_div(&env, 10, 10, 3), Ok(33));
        assert_eq!(mul_div(&env, 0, 10, 3), Ok(0));
        assert_eq!(mul_div(&env, 7, 0, 3), Ok(0));
    }

    #[test]
    fn mul_div_uses_wide_intermediate() {
        let env = Env::default();
        // 10^30 * 10^18 overflows u128 before the division
        let reward = 1_000_000_000_000_000_000_000_000_000_000u128;
        assert_eq!(
            mul_div(&env, reward, 1_000_000_000_000_000_000, 1_000_000_000_000_000_000),
            Ok(reward)
        );
    }

    #[test]
    fn mul_div_errors() {
        let env = Env::default();
        assert_eq!(
            mul_div(&env, 1, 1, 0),
            Err(ContractError::ContractMathError)
        );
        assert_eq!(
            mul_div(&env, u128::MAX, u128::MAX, 1),
            Err(ContractError::ContractMathError)
        );
    }

    #[test_case(18, 1; "eighteen decimals are internal units")]
    #[test_case(7, 100_000_000_000; "stellar asset decimals")]
    #[test_case(0, 1_000_000_000_000_000_000; "whole units")]
    fn scale_for_decimals(decimals: u32, expected: u128) {
        assert_eq!(decimals_scale(decimals), Ok(expected));
    }

    #[test]
    fn too_many_decimals() {
        assert_eq!(decimals_scale(19), Err(ContractError::InvalidDecimals));
    }

    #[test]
    fn token_amount_keeps_remainder() {
        let scale = decimals_scale(7).unwrap();
        let internal = to_internal(42, scale).unwrap() + 123;
        assert_eq!(to_token_amount(internal, scale), Ok((42, 123)));
    }

    #[test]
    fn negative_amounts_do_not_convert() {
        assert_eq!(to_internal(-1, 1), Err(ContractError::ContractMathError));
    }

    #[test_case(1_000, 100, 100, 100; "withdraw right after staking pays the full deduction")]
    #[test_case(1_000, 50, 100, 50; "deduction decays with the lock")]
    #[test_case(1_000, 0, 100, 0; "no deduction once unlocked")]
    #[test_case(0, 50, 100, 0; "disabled penalty")]
    #[test_case(10_000, 100, 100, 1_000; "full principal")]
    fn penalty(bps: i64, remaining: u64, duration: u64, expected: i128) {
        let env = Env::default();
        assert_eq!(
            early_withdraw_penalty(&env, 1_000, bps, remaining, duration),
            Ok(expected)
        );
    }

    #[test]
    fn penalty_on_large_principal() {
        let env = Env::default();
        // 5_000 tokens with 18 decimals
        let principal = 5_000 * 10i128.pow(18);

        assert_eq!(
            early_withdraw_penalty(&env, principal, 1_000, 50, 100),
            Ok(principal / 20)
        );
        assert_eq!(
            early_withdraw_penalty(&env, i128::MAX, 10_000, 1, 1),
            Ok(i128::MAX)
        );
    }
}
