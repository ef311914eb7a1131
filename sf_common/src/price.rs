use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Sub},
};

use serde::{Deserialize, Serialize};

pub const CURRENCY_SYMBOL: &str = "£";
const PENCE_PER_POUND: i64 = 100;

macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };
}

//--------------------------------------        Price        ---------------------------------------------------------
/// A money amount in whole pence.
///
/// The storefront API sends prices as decimal pounds in plain JSON numbers. They are rounded to the nearest penny on
/// the way in and written back out as pounds. Deltas (size or add-on surcharges) may be negative; catalog base prices
/// are validated separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Price(i64);

op!(binary Price, Add, add);
op!(binary Price, Sub, sub);
op!(inplace Price, AddAssign, add_assign);

impl Price {
    /// A price from an amount in pounds, rounded to the nearest penny.
    pub fn new(pounds: f64) -> Self {
        Self::from(pounds)
    }

    pub fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    pub fn pence(&self) -> i64 {
        self.0
    }

    /// The amount in pounds.
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.0 as f64 / PENCE_PER_POUND as f64
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl From<f64> for Price {
    #[allow(clippy::cast_possible_truncation)]
    fn from(pounds: f64) -> Self {
        Self((pounds * 100.0).round() as i64)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.value()
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * i64::from(rhs))
    }
}

/// Scales by a rate (a tax rate, for instance), rounding to the nearest penny.
impl Mul<f64> for Price {
    type Output = Self;

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn mul(self, rhs: f64) -> Self::Output {
        Self((self.0 as f64 * rhs).round() as i64)
    }
}

/// Splits a price into `rhs` equal parts. Any remainder is dropped.
impl Div<u32> for Price {
    type Output = Self;

    fn div(self, rhs: u32) -> Self::Output {
        Self(self.0 / i64::from(rhs.max(1)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Price> for Price {
    fn sum<I: Iterator<Item = &'a Price>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let pence = self.0.unsigned_abs();
        let per_pound = PENCE_PER_POUND.unsigned_abs();
        write!(f, "{sign}{CURRENCY_SYMBOL}{}.{:02}", pence / per_pound, pence % per_pound)
    }
}
