//! Exact rational coefficients for polynomial normal form.
//!
//! All arithmetic is checked; overflow surfaces as `None` and the caller
//! abandons normalization.

use std::cmp::Ordering;
use std::fmt;

/// A reduced fraction with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i128,
    den: i128,
}

pub(crate) fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple of two positive integers. `None` on overflow.
pub(crate) fn lcm(a: i128, b: i128) -> Option<i128> {
    let g = gcd(a, b);
    if g == 0 {
        return Some(0);
    }
    (a / g).checked_mul(b)
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build `num / den`. Returns `None` for a zero denominator.
    ///
    /// `i128::MIN` has no positive counterpart and is treated as overflow.
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 || num == i128::MIN || den == i128::MIN {
            return None;
        }
        let g = gcd(num, den).max(1);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = num.checked_neg()?;
            den = den.checked_neg()?;
        }
        Some(Self { num, den })
    }

    pub fn integer(n: i64) -> Self {
        Self {
            num: i128::from(n),
            den: 1,
        }
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    /// The value as an integer, if it is one and fits `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        if self.den == 1 {
            i64::try_from(self.num).ok()
        } else {
            None
        }
    }

    pub fn abs(&self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    pub fn checked_neg(&self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let num = self
            .num
            .checked_mul(other.den)?
            .checked_add(other.num.checked_mul(self.den)?)?;
        Self::new(num, self.den.checked_mul(other.den)?)
    }

    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        Self::new(
            self.num.checked_mul(other.num)?,
            self.den.checked_mul(other.den)?,
        )
    }

    /// `self / other`. `None` for a zero divisor or on overflow.
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        self.checked_mul(&other.recip()?)
    }

    /// Multiplicative inverse. `None` for zero.
    pub fn recip(&self) -> Option<Self> {
        Self::new(self.den, self.num)
    }

    /// Integer power; negative exponents invert.
    pub fn checked_pow(&self, exp: i64) -> Option<Self> {
        let base = if exp < 0 { self.recip()? } else { *self };
        let e = u32::try_from(exp.unsigned_abs()).ok()?;
        Self::new(base.num.checked_pow(e)?, base.den.checked_pow(e)?)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplication preserves order.
        // Saturation only matters for values far beyond any literal we accept.
        let lhs = self.num.saturating_mul(other.den);
        let rhs = other.num.saturating_mul(self.den);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_reduced() {
        let r = Rational::new(6, -4).unwrap();
        assert_eq!(r.numer(), -3);
        assert_eq!(r.denom(), 2);
        assert_eq!(r.to_string(), "-3/2");
    }

    #[test]
    fn zero_denominator_rejected() {
        assert!(Rational::new(1, 0).is_none());
        assert!(Rational::ZERO.recip().is_none());
    }

    #[test]
    fn arithmetic() {
        let half = Rational::new(1, 2).unwrap();
        let third = Rational::new(1, 3).unwrap();
        assert_eq!(half.checked_add(&third).unwrap(), Rational::new(5, 6).unwrap());
        assert_eq!(half.checked_mul(&third).unwrap(), Rational::new(1, 6).unwrap());
        assert_eq!(half.checked_pow(-2).unwrap(), Rational::integer(4));
    }

    #[test]
    fn division_and_lcm() {
        let three_halves = Rational::new(3, 2).unwrap();
        let three = Rational::integer(3);
        assert_eq!(three_halves.checked_div(&three).unwrap(), Rational::new(1, 2).unwrap());
        assert!(three.checked_div(&Rational::ZERO).is_none());
        assert_eq!(lcm(4, 6), Some(12));
    }

    #[test]
    fn overflow_is_none() {
        let big = Rational::integer(i64::MAX);
        assert!(big.checked_pow(5).is_none());
    }
}
