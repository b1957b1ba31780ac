// A lot of this code is taken from the cosmwasm-std crate, which is licensed under the Apache
// License 2.0 - https://github.com/CosmWasm/cosmwasm.

#![no_std]
use core::ops::Mul;

/// Fixed-point decimal with 18 fractional digits backed by a `u128`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Decimal(u128);

impl Decimal {
    const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000u128; // 1*10**18
    /// The number of decimal places. Since decimal types are fixed-point rather than
    /// floating-point, this is a constant.
    pub const DECIMAL_PLACES: u32 = 18;

    pub const fn raw(value: u128) -> Self {
        Self(value)
    }

    /// Create a 1.0 Decimal
    #[inline]
    pub const fn one() -> Self {
        Self(Self::DECIMAL_FRACTIONAL)
    }

    /// Create a 0.0 Decimal
    #[inline]
    pub const fn zero() -> Self {
        Self(0u128)
    }

    /// Convert x% into Decimal
    pub fn percent(x: u64) -> Self {
        Self((x as u128) * 10_000_000_000_000_000)
    }

    /// Convert basis points (x/10000) into Decimal. Negative input is clamped to zero.
    pub fn bps(x: i64) -> Self {
        if x <= 0 {
            return Self::zero();
        }
        Self((x as u128) * 100_000_000_000_000)
    }

    /// Returns the ratio (numerator / denominator) as a Decimal.
    /// Panics on a zero denominator.
    pub fn from_ratio(numerator: impl Into<u128>, denominator: impl Into<u128>) -> Self {
        let numerator: u128 = numerator.into();
        let denominator: u128 = denominator.into();
        if denominator == 0 {
            panic!("Denominator must not be zero");
        }
        Self(numerator * Self::DECIMAL_FRACTIONAL / denominator)
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0u128
    }

    /// A decimal is an integer of atomic units plus a number that specifies the
    /// position of the decimal dot. So any decimal can be expressed as two numbers.
    ///
    /// ## Examples
    ///
    /// ```
    /// use soroban_decimal::Decimal;
    /// let a = Decimal::percent(123);
    /// assert_eq!(a.atomics(), 1230000000000000000);
    ///
    /// // Smallest possible value
    /// let b = Decimal::raw(1);
    /// assert_eq!(b.atomics(), 1);
    /// ```
    #[must_use]
    #[inline]
    pub const fn atomics(&self) -> u128 {
        self.0
    }

    /// Absolute distance between two decimals.
    pub fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }
}

impl Mul<Decimal> for u128 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn mul(self, rhs: Decimal) -> Self::Output {
        // 0*a and b*0 is always 0
        if self == 0u128 || rhs.is_zero() {
            return 0u128;
        }
        self * rhs.0 / Decimal::DECIMAL_FRACTIONAL
    }
}

impl Mul<Decimal> for i128 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn mul(self, rhs: Decimal) -> Self::Output {
        if self == 0i128 || rhs.is_zero() {
            return 0i128;
        }
        let magnitude = self.unsigned_abs() * rhs;
        if self < 0 {
            -(magnitude as i128)
        } else {
            magnitude as i128
        }
    }
}

impl Mul<u128> for Decimal {
    type Output = u128;

    fn mul(self, rhs: u128) -> Self::Output {
        rhs * self
    }
}
