//! Exact fractions as stored in TIFF `RATIONAL` / `SRATIONAL` fields.
//!
//! A [`Rational`] is always kept in lowest terms with a positive
//! denominator, so two values are equal exactly when their
//! numerator/denominator pairs are equal.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while building or combining rationals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RationalError {
    #[error("zero denominator in {numerator}/0")]
    ZeroDenominator { numerator: i64 },

    #[error("invalid rational {text:?}: expected \"N/D\" or \"N\"")]
    Parse { text: String },

    #[error("rational arithmetic overflowed")]
    Overflow,
}

/// A reduced fraction.
///
/// ```rust
/// use exif_typed::Rational;
///
/// let r: Rational = "2/4".parse().unwrap();
/// assert_eq!(r, Rational::new(1, 2).unwrap());
/// assert_eq!(r.to_string(), "1/2");
/// assert_eq!(r + Rational::from(1), Rational::new(3, 2).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

/// Reduce `n/d` to lowest terms with a non-negative denominator.
///
/// `0/0` is rejected like every other zero denominator.
pub fn reduce(n: i64, d: i64) -> Result<(i64, i64), RationalError> {
    if d == 0 {
        return Err(RationalError::ZeroDenominator { numerator: n });
    }
    narrow(reduce_wide(n as i128, d as i128))
}

fn reduce_wide(n: i128, d: i128) -> (i128, i128) {
    let g = gcd(n.abs(), d.abs());
    let (n, d) = (n / g, d / g);
    if d < 0 { (-n, -d) } else { (n, d) }
}

fn narrow((n, d): (i128, i128)) -> Result<(i64, i64), RationalError> {
    match (i64::try_from(n), i64::try_from(d)) {
        (Ok(n), Ok(d)) => Ok((n, d)),
        _ => Err(RationalError::Overflow),
    }
}

// Euclid on non-negative operands. gcd(a, 0) == a, gcd(0, b) == b.
fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Rational {
    pub const ZERO: Rational = Rational { numerator: 0, denominator: 1 };
    pub const ONE: Rational = Rational { numerator: 1, denominator: 1 };

    /// Build a rational from an integer pair, reducing it.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, RationalError> {
        let (numerator, denominator) = reduce(numerator, denominator)?;
        Ok(Self { numerator, denominator })
    }

    fn from_wide(n: i128, d: i128) -> Result<Self, RationalError> {
        if d == 0 {
            let numerator = i64::try_from(n).unwrap_or(i64::MAX);
            return Err(RationalError::ZeroDenominator { numerator });
        }
        let (numerator, denominator) = narrow(reduce_wide(n, d))?;
        Ok(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Absolute value of both components.
    pub fn abs(&self) -> Self {
        Self {
            numerator: self.numerator.abs(),
            denominator: self.denominator,
        }
    }

    pub fn checked_add(self, other: Self) -> Result<Self, RationalError> {
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.1 + b.0 * a.1, a.1 * b.1)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, RationalError> {
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.1 - b.0 * a.1, a.1 * b.1)
    }

    pub fn checked_mul(self, other: Self) -> Result<Self, RationalError> {
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.0, a.1 * b.1)
    }

    /// Multiply by the reciprocal of `other`. Dividing by zero is an error.
    pub fn checked_div(self, other: Self) -> Result<Self, RationalError> {
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.1, a.1 * b.0)
    }

    /// `self + 1/1`.
    pub fn increment(self) -> Self {
        self + Self::ONE
    }

    /// `self - 1/1`.
    pub fn decrement(self) -> Self {
        self - Self::ONE
    }

    fn wide(&self) -> (i128, i128) {
        (self.numerator as i128, self.denominator as i128)
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self { numerator: n, denominator: 1 }
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parse_err = || RationalError::Parse { text: text.to_string() };
        match text.split_once('/') {
            Some((n, d)) => {
                let n = n.parse::<i64>().map_err(|_| parse_err())?;
                let d = d.parse::<i64>().map_err(|_| parse_err())?;
                Rational::new(n, d)
            }
            None => text.parse::<i64>().map(Rational::from).map_err(|_| parse_err()),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// Denominators are always positive, so cross-multiplication is exact.
impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.wide(), other.wide());
        (a.0 * b.1).cmp(&(b.0 * a.1))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

macro_rules! panicking_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl $trait for Rational {
            type Output = Rational;

            /// Panics on overflow or division by zero, like the integer operators.
            fn $method(self, other: Rational) -> Rational {
                match self.$checked(other) {
                    Ok(r) => r,
                    Err(e) => panic!("{self} {} {other}: {e}", stringify!($method)),
                }
            }
        }
    };
}

panicking_op!(Add, add, checked_add);
panicking_op!(Sub, sub, checked_sub);
panicking_op!(Mul, mul, checked_mul);
panicking_op!(Div, div, checked_div);

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match self.numerator.checked_neg() {
            Some(numerator) => Rational { numerator, denominator: self.denominator },
            None => panic!("-({self}): {}", RationalError::Overflow),
        }
    }
}
