//! Integer peso amounts.
//!
//! Chilean pesos have no fractional unit in retail use, so amounts are
//! whole `i64` values. Displayed prices already contain IVA; the net
//! portion is derived by division, never by adding tax on top.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// IVA rate applied to all catalog prices, in percent.
pub const IVA_RATE_PERCENT: u32 = 19;

/// A money amount in whole Chilean pesos.
///
/// Arithmetic is plain `i64` arithmetic; the only non-trivial operation
/// is splitting a tax-inclusive amount into net and IVA portions.
///
/// ## Examples
///
/// ```
/// use autonorte_core::Pesos;
///
/// let gross = Pesos::new(4760);
/// assert_eq!(gross.net_of_iva(), Pesos::new(4000));
/// assert_eq!(gross.iva_portion(), Pesos::new(760));
/// assert_eq!(gross.to_string(), "$4.760");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Pesos(i64);

impl Pesos {
    /// Zero pesos.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a whole peso value.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying peso value.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Whether this amount is greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }

    /// The net (pre-IVA) portion of a tax-inclusive amount.
    ///
    /// `net = round(gross / 1.19)`, rounded to the nearest whole peso
    /// with midpoints away from zero.
    #[must_use]
    pub fn net_of_iva(self) -> Self {
        let gross = Decimal::from(self.0);
        let net = (gross / Decimal::new(119, 2))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        // A net amount derived from an i64 gross always fits back in i64.
        Self(net.to_i64().unwrap_or_default())
    }

    /// The IVA portion of a tax-inclusive amount.
    ///
    /// Defined as `gross - net`, so `net + iva == gross` holds exactly
    /// for every amount.
    #[must_use]
    pub fn iva_portion(self) -> Self {
        self - self.net_of_iva()
    }
}

impl Add for Pesos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Pesos {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Pesos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Pesos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Pesos {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Pesos> for i64 {
    fn from(amount: Pesos) -> Self {
        amount.0
    }
}

impl fmt::Display for Pesos {
    /// Formats with `es-CL` thousands grouping: `$4.760`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{sign}${grouped}")
    }
}
