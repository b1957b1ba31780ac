// Parts of this code are derived from the wynd-utils crate, which is licensed under the Apache
// License Apache 2.0 - https://github.com/wynddao/wynd-contracts

//! Lock duration to reward weight curves.
//!
//! A curve maps a lock duration (in seconds) onto a weight expressed as an integer in the
//! staking contract's weight precision. Curves are supplied by the deployer and validated
//! once; evaluation is pure and total.

#![no_std]

use core::cmp::Ordering;

use soroban_sdk::{contracttype, Env, Vec};

/// Handle curve validation errors
#[derive(Debug, Eq, PartialEq)]
pub enum CurveError {
    /// A monotonic function is a function between ordered sets that preserves
    /// or reverses the given order, but never both.
    NotMonotonic,

    /// A curve that always decreases or stays constant
    MonotonicDecreasing,

    /// Later point must have higher X than previous point
    PointsOutOfOrder,

    /// No curve points defined
    MissingSteps,

    /// The curve has more steps than allowed
    TooComplex,
}

/// Curve types
#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Curve {
    /// Every duration gets the same value
    Constant(u128),
    /// Linear curve that grows linearly but later
    /// tends to a constant saturated value.
    SaturatingLinear(SaturatingLinear),
    /// Curve with different slopes, interpolated between steps
    PiecewiseLinear(PiecewiseLinear),
    /// Tiered curve, constant between steps
    Stepwise(Stepwise),
}

impl Curve {
    /// Ctor for Saturated curve
    pub fn saturating_linear((min_x, min_y): (u64, u128), (max_x, max_y): (u64, u128)) -> Self {
        Curve::SaturatingLinear(SaturatingLinear {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Ctor for constant curve
    pub fn constant(y: u128) -> Self {
        Curve::Constant(y)
    }

    /// Ctor for piecewise linear curve from `(time, value)` pairs
    pub fn piecewise_linear(env: &Env, points: &[(u64, u128)]) -> Self {
        Curve::PiecewiseLinear(PiecewiseLinear {
            steps: steps_from_points(env, points),
        })
    }

    /// Ctor for tiered curve from `(threshold, value)` pairs
    pub fn stepwise(env: &Env, points: &[(u64, u128)]) -> Self {
        Curve::Stepwise(Stepwise {
            steps: steps_from_points(env, points),
        })
    }
}

impl Curve {
    /// provides y = f(x) evaluation
    pub fn value(&self, x: u64) -> u128 {
        match self {
            Curve::Constant(y) => *y,
            Curve::SaturatingLinear(s) => s.value(x),
            Curve::PiecewiseLinear(p) => p.value(x),
            Curve::Stepwise(s) => s.value(x),
        }
    }

    /// returns the number of steps in the curve
    pub fn size(&self) -> u32 {
        match self {
            Curve::Constant(_) => 1,
            Curve::SaturatingLinear(_) => 2,
            Curve::PiecewiseLinear(pl) => pl.steps.len(),
            Curve::Stepwise(st) => st.steps.len(),
        }
    }

    /// general sanity checks on input values to ensure this is valid.
    /// these checks are included by validate_monotonic_increasing
    pub fn validate(&self) -> Result<(), CurveError> {
        match self {
            Curve::Constant(_) => Ok(()),
            Curve::SaturatingLinear(s) => s.validate(),
            Curve::PiecewiseLinear(p) => validate_steps(&p.steps),
            Curve::Stepwise(s) => validate_steps(&s.steps),
        }
    }

    /// returns an error if there is ever x2 > x1 such that value(x2) < value(x1)
    pub fn validate_monotonic_increasing(&self) -> Result<(), CurveError> {
        match self {
            Curve::Constant(_) => Ok(()),
            Curve::SaturatingLinear(s) => s.validate_monotonic_increasing(),
            Curve::PiecewiseLinear(p) => steps_monotonic_increasing(&p.steps),
            Curve::Stepwise(s) => steps_monotonic_increasing(&s.steps),
        }
    }

    /// returns an error if the size of the curve is more than the given max.
    pub fn validate_complexity(&self, max: u32) -> Result<(), CurveError> {
        if self.size() <= max {
            Ok(())
        } else {
            Err(CurveError::TooComplex)
        }
    }

    /// return (min, max) that can ever be returned from value.
    pub fn range(&self) -> (u128, u128) {
        match self {
            Curve::Constant(y) => (*y, *y),
            Curve::SaturatingLinear(sat) => sat.range(),
            Curve::PiecewiseLinear(p) => steps_range(&p.steps),
            Curve::Stepwise(s) => steps_range(&s.steps),
        }
    }
}

/// Saturating Linear
/// $$f(x)=\begin{cases}
/// [min(y)],  & \text{if x <= $x_1$ } \\\\
/// [y],  & \text{if $x_1$ >= x <= $x_2$ } \\\\
/// [max(y)],  & \text{if x >= $x_2$ }
/// \end{cases}$$
///
/// min_y for all x <= min_x, max_y for all x >= max_x, linear in between
#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SaturatingLinear {
    /// duration where the curve starts rising
    pub min_x: u64,
    /// value at and below min_x
    pub min_y: u128,
    /// duration where the curve has fully saturated
    pub max_x: u64,
    /// value at and above max_x
    pub max_y: u128,
}

impl SaturatingLinear {
    /// provides y = f(x) evaluation
    pub fn value(&self, x: u64) -> u128 {
        match (x < self.min_x, x > self.max_x) {
            (true, _) => self.min_y,
            (_, true) => self.max_y,
            _ => interpolate((self.min_x, self.min_y), (self.max_x, self.max_y), x),
        }
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        if self.max_x <= self.min_x {
            return Err(CurveError::PointsOutOfOrder);
        }
        Ok(())
    }

    pub fn validate_monotonic_increasing(&self) -> Result<(), CurveError> {
        self.validate()?;
        if self.max_y < self.min_y {
            return Err(CurveError::MonotonicDecreasing);
        }
        Ok(())
    }

    pub fn range(&self) -> (u128, u128) {
        if self.max_y > self.min_y {
            (self.min_y, self.max_y)
        } else {
            (self.max_y, self.min_y)
        }
    }
}

// this requires min_x < x < max_x to have been previously validated
fn interpolate((min_x, min_y): (u64, u128), (max_x, max_y): (u64, u128), x: u64) -> u128 {
    if max_y > min_y {
        min_y + (max_y - min_y) * u128::from(x - min_x) / u128::from(max_x - min_x)
    } else {
        min_y - (min_y - max_y) * u128::from(x - min_x) / u128::from(max_x - min_x)
    }
}

/// A single point of a multi-step curve. Steps must be arranged with increasing time.
#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Step {
    pub time: u64,
    pub value: u128,
}

/// Any point before the first step gets the first value, after the last step the last value.
/// Otherwise, it is a linear interpolation between the two closest points.
#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PiecewiseLinear {
    pub steps: Vec<Step>,
}

impl PiecewiseLinear {
    /// provides y = f(x) evaluation
    pub fn value(&self, x: u64) -> u128 {
        let mut prev: Option<Step> = None;
        let mut next: Option<Step> = None;

        for step in self.steps.iter() {
            if x >= step.time {
                prev = Some(step);
            } else {
                next = Some(step);
                break;
            }
        }

        match (prev, next) {
            (Some(last), Some(next)) if x > last.time => {
                interpolate((last.time, last.value), (next.time, next.value), x)
            }
            (Some(last), _) => last.value,
            (None, Some(first)) => first.value,
            (None, None) => panic!("Curve: steps are empty"),
        }
    }
}

/// Tiered curve: the value of the last step whose time is lower or equal to x.
/// Any point before the first step gets the first value.
#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Stepwise {
    pub steps: Vec<Step>,
}

impl Stepwise {
    /// provides y = f(x) evaluation
    pub fn value(&self, x: u64) -> u128 {
        let first = match self.steps.first() {
            Some(step) => step.value,
            None => panic!("Curve: steps are empty"),
        };

        self.steps
            .iter()
            .take_while(|step| step.time <= x)
            .last()
            .map_or(first, |step| step.value)
    }
}

fn steps_from_points(env: &Env, points: &[(u64, u128)]) -> Vec<Step> {
    let mut steps = Vec::new(env);
    for (time, value) in points.iter() {
        steps.push_back(Step {
            time: *time,
            value: *value,
        });
    }
    steps
}

fn validate_steps(steps: &Vec<Step>) -> Result<(), CurveError> {
    if steps.is_empty() {
        return Err(CurveError::MissingSteps);
    }
    let mut previous: Option<u64> = None;
    for step in steps.iter() {
        if let Some(time) = previous {
            if step.time <= time {
                return Err(CurveError::PointsOutOfOrder);
            }
        }
        previous = Some(step.time);
    }
    Ok(())
}

fn steps_monotonic_increasing(steps: &Vec<Step>) -> Result<(), CurveError> {
    validate_steps(steps)?;
    match classify_steps(steps) {
        Shape::NotMonotonic => Err(CurveError::NotMonotonic),
        Shape::MonotonicDecreasing => Err(CurveError::MonotonicDecreasing),
        _ => Ok(()),
    }
}

// Requires there be at least one item in steps
fn classify_steps(steps: &Vec<Step>) -> Shape {
    let mut iter = steps.iter();
    let first = match iter.next() {
        Some(step) => step.value,
        None => return Shape::Constant,
    };
    let (_, shape) = iter.fold((first, Shape::Constant), |(last, shape), step| {
        let y = step.value;
        let shape = match (shape, y.cmp(&last)) {
            (Shape::NotMonotonic, _) => Shape::NotMonotonic,
            (Shape::MonotonicDecreasing, Ordering::Greater) => Shape::NotMonotonic,
            (Shape::MonotonicDecreasing, _) => Shape::MonotonicDecreasing,
            (Shape::MonotonicIncreasing, Ordering::Less) => Shape::NotMonotonic,
            (Shape::MonotonicIncreasing, _) => Shape::MonotonicIncreasing,
            (Shape::Constant, Ordering::Greater) => Shape::MonotonicIncreasing,
            (Shape::Constant, Ordering::Less) => Shape::MonotonicDecreasing,
            (Shape::Constant, Ordering::Equal) => Shape::Constant,
        };
        (y, shape)
    });
    shape
}

fn steps_range(steps: &Vec<Step>) -> (u128, u128) {
    let low = steps.iter().map(|step| step.value).min().unwrap_or(0);
    let high = steps.iter().map(|step| step.value).max().unwrap_or(0);
    (low, high)
}

enum Shape {
    // If there is only one point, or all have same value
    Constant,
    MonotonicIncreasing,
    MonotonicDecreasing,
    NotMonotonic,
}
