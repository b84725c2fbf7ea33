//! Exact rational quantities
//!
//! Craft ratios are never rounded to whole crafts: needing 2 items from a
//! recipe that yields 4 consumes exactly half of its ingredients. All counts
//! are therefore arbitrary-precision rationals.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("Invalid quantity '{0}': expected an integer, a fraction like 1/2, or a decimal")]
    Invalid(String),

    #[error("Invalid quantity '{0}': denominator is zero")]
    ZeroDenominator(String),
}

/// A non-rounding item count
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(BigRational);

impl Quantity {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// Creates the fraction `numer / denom`
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    pub fn ratio(numer: i64, denom: i64) -> Self {
        Self(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Nearest `f64`, used for JSON output
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Exact `numer/denom` spelling, e.g. `1/3`
    pub fn to_ratio_string(&self) -> String {
        if self.0.is_integer() {
            self.0.numer().to_string()
        } else {
            format!("{}/{}", self.0.numer(), self.0.denom())
        }
    }

    /// `p/q` spelling for values a decimal (and so a JSON number) cannot hold exactly
    pub fn inexact_ratio(&self) -> Option<String> {
        match self.to_exact_decimal() {
            Some(_) => None,
            None => Some(self.to_ratio_string()),
        }
    }

    /// Exact decimal spelling, if the fraction terminates in base 10
    fn to_exact_decimal(&self) -> Option<String> {
        let two = BigInt::from(2);
        let five = BigInt::from(5);

        let mut denom = self.0.denom().clone();
        let mut twos = 0u32;
        let mut fives = 0u32;
        while (&denom % &two).is_zero() {
            denom /= &two;
            twos += 1;
        }
        while (&denom % &five).is_zero() {
            denom /= &five;
            fives += 1;
        }
        if !denom.is_one() {
            return None;
        }

        let places = twos.max(fives);
        let scaled = (self.0.clone() * BigRational::from_integer(BigInt::from(10).pow(places)))
            .to_integer();
        let digits = scaled.abs().to_string();
        let places = places as usize;
        let padded = format!("{:0>width$}", digits, width = places + 1);
        let (whole, frac) = padded.split_at(padded.len() - places);
        let sign = if scaled.is_negative() { "-" } else { "" };

        Some(format!("{}{}.{}", sign, whole, frac))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<BigRational> for Quantity {
    fn from(value: BigRational) -> Self {
        Self(value)
    }
}

impl fmt::Display for Quantity {
    /// Integers print bare, terminating fractions as decimals, the rest as `p/q`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            return write!(f, "{}", self.0.numer());
        }
        match self.to_exact_decimal() {
            Some(decimal) => f.write_str(&decimal),
            None => write!(f, "{}/{}", self.0.numer(), self.0.denom()),
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || QuantityError::Invalid(s.to_string());
        let parse_int = |part: &str| -> Result<BigInt, QuantityError> {
            if part.is_empty() {
                return Err(invalid());
            }
            part.parse::<BigInt>().map_err(|_| invalid())
        };

        if let Some((numer, denom)) = s.split_once('/') {
            let numer = parse_int(numer.trim())?;
            let denom = parse_int(denom.trim())?;
            if denom.is_zero() {
                return Err(QuantityError::ZeroDenominator(s.to_string()));
            }
            return Ok(Self(BigRational::new(numer, denom)));
        }

        if let Some((whole, frac)) = s.split_once('.') {
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let negative = whole.starts_with('-');
            let whole = if whole.is_empty() || whole == "-" {
                BigInt::zero()
            } else {
                parse_int(whole)?
            };
            let scale = BigInt::from(10).pow(frac.len() as u32);
            let frac = parse_int(frac)?;
            let magnitude = whole.abs() * &scale + frac;
            let numer = if negative { -magnitude } else { magnitude };
            return Ok(Self(BigRational::new(numer, scale)));
        }

        Ok(Self(BigRational::from_integer(parse_int(s)?)))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_integer() {
            if let Some(n) = self.0.numer().to_i64() {
                return serializer.serialize_i64(n);
            }
        }
        serializer.serialize_f64(self.to_f64())
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn add(self, rhs: &'a Quantity) -> Quantity {
        Quantity(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Quantity> for Quantity {
    fn add_assign(&mut self, rhs: &Quantity) {
        self.0 += &rhs.0;
    }
}

impl<'a> Mul<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &'a Quantity) -> Quantity {
        Quantity(&self.0 * &rhs.0)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 * rhs.0)
    }
}

impl<'a> Div<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    /// # Panics
    ///
    /// Panics when dividing by zero; recipe output counts are validated positive.
    fn div(self, rhs: &'a Quantity) -> Quantity {
        Quantity(&self.0 / &rhs.0)
    }
}
