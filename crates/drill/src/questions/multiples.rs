//! Multiples of a factor inside an inclusive range.
//!
//! Operands with a "multiple of" requirement are sampled by drawing the
//! multiplier `k` uniformly and scaling it back up, so the cost of a draw
//! does not depend on how sparse the multiples are.

use drill_common::OperandConstraint;
use rand::Rng;

/// The values `k * step` for `k` in `[first, last]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiples {
    step: i64,
    first: i64,
    last: i64,
}

impl Multiples {
    /// Multiples of `step` (>= 1) within `[lower, upper]`
    pub fn new(lower: i64, upper: i64, step: i64) -> Self {
        let step = step.max(1);
        Self {
            step,
            first: div_ceil(lower, step),
            last: div_floor(upper, step),
        }
    }

    pub fn of(constraint: &OperandConstraint) -> Self {
        Self::new(
            constraint.bounds.lower,
            constraint.bounds.upper,
            constraint.multiple,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    pub fn min(&self) -> Option<i64> {
        (!self.is_empty()).then(|| self.first * self.step)
    }

    pub fn max(&self) -> Option<i64> {
        (!self.is_empty()).then(|| self.last * self.step)
    }

    /// Narrow to the multiples that also fall within `[lower, upper]`
    pub fn within(&self, lower: i64, upper: i64) -> Self {
        Self {
            step: self.step,
            first: self.first.max(div_ceil(lower, self.step)),
            last: self.last.min(div_floor(upper, self.step)),
        }
    }

    /// Uniform draw, `None` when there are no multiples
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        if self.is_empty() {
            return None;
        }
        Some(rng.random_range(self.first..=self.last) * self.step)
    }
}

/// Floor division for a positive divisor
pub fn div_floor(value: i64, divisor: i64) -> i64 {
    value.div_euclid(divisor)
}

/// Ceiling division for a positive divisor
pub fn div_ceil(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Greatest common divisor of two non-negative values
pub fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_multiples_bounds() {
        let fives = Multiples::new(1, 20, 5);
        assert_eq!(fives.min(), Some(5));
        assert_eq!(fives.max(), Some(20));
        assert!(!fives.is_empty());

        let none = Multiples::new(11, 19, 10);
        assert!(none.is_empty());
        assert_eq!(none.min(), None);
    }

    #[test]
    fn test_within_narrows() {
        let all = Multiples::new(0, 100, 1);
        let narrowed = all.within(1, i64::MAX);
        assert_eq!(narrowed.min(), Some(1));
        assert_eq!(narrowed.max(), Some(100));

        let tens = Multiples::new(0, 100, 10).within(25, 61);
        assert_eq!(tens.min(), Some(30));
        assert_eq!(tens.max(), Some(60));

        assert!(Multiples::new(0, 100, 10).within(i64::MIN, -1).is_empty());
    }

    #[test]
    fn test_sample_stays_on_multiples() {
        let mut rng = StdRng::seed_from_u64(7);
        let sevens = Multiples::new(3, 100, 7);
        for _ in 0..200 {
            let value = sevens.sample(&mut rng).unwrap();
            assert!(value % 7 == 0 && (3..=100).contains(&value));
        }
        assert_eq!(Multiples::new(5, 4, 1).sample(&mut rng), None);
    }

    #[test]
    fn test_division_helpers() {
        assert_eq!(div_ceil(7, 2), 4);
        assert_eq!(div_ceil(8, 2), 4);
        assert_eq!(div_ceil(-7, 2), -3);
        assert_eq!(div_floor(-7, 2), -4);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(5, 0), 5);
        assert_eq!(gcd(7, 3), 1);
    }
}
