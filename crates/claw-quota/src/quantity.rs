//! Exact, suffix-aware resource quantities.
//!
//! Mirrors the wire form of Kubernetes' `resource.Quantity`: a non-negative
//! rational written as an integer or decimal literal with an optional SI
//! decimal suffix (`m`, `k`, `M`, `G`, `T`) or binary suffix (`Ki`, `Mi`,
//! `Gi`, `Ti`). Arithmetic and comparisons never go through `f64` — the
//! value is stored as an integer count of nano-units (`10^-9` of the bare
//! unit), which is exact for every suffix this taxonomy supports and for
//! any literal with up to nine fractional decimal digits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One whole unit expressed in nano-units.
const NANO: i128 = 1_000_000_000;

const KI: i128 = 1024;
const MI: i128 = KI * 1024;
const GI: i128 = MI * 1024;
const TI: i128 = GI * 1024;

const KILO: i128 = 1_000;
const MEGA: i128 = 1_000_000;
const GIGA: i128 = 1_000_000_000;
const TERA: i128 = 1_000_000_000_000;

/// A non-negative resource quantity, stored exactly.
///
/// `Default` and [`Quantity::zero`] both produce the zero quantity, matching
/// the spec's "zero and the absent value both compare equal to zero" rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Quantity {
    nano: i128,
}

/// A quantity literal failed to parse.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid resource quantity {0:?}")]
pub struct QuantityParseError(pub String);

impl Quantity {
    /// The zero quantity.
    #[must_use]
    pub const fn zero() -> Self {
        Self { nano: 0 }
    }

    /// Build a quantity representing a plain non-negative integer count
    /// (used for pod/PVC/service/object counts).
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        Self {
            nano: (count as i128) * NANO,
        }
    }

    /// `true` if this quantity is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.nano == 0
    }

    /// Parse the SI/binary-suffixed wire form of a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityParseError`] if the literal is not a non-negative
    /// decimal number optionally followed by one of the recognised suffixes.
    pub fn parse(s: &str) -> Result<Self, QuantityParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QuantityParseError(s.to_string()));
        }

        let (numeric, suffix) = split_suffix(s);
        let (mul_num, mul_den) = suffix_multiplier(suffix).ok_or_else(|| QuantityParseError(s.to_string()))?;

        let number_nano = parse_exact_decimal(numeric).ok_or_else(|| QuantityParseError(s.to_string()))?;

        let scaled = number_nano
            .checked_mul(mul_num)
            .ok_or_else(|| QuantityParseError(s.to_string()))?;
        let nano = scaled / mul_den;

        Ok(Self { nano })
    }

    /// Saturating addition (resource quantities never overflow in practice;
    /// this simply never panics).
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            nano: self.nano.saturating_add(other.nano),
        }
    }

    /// Saturating subtraction, floored at zero (a quantity is never negative).
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            nano: (self.nano - other.nano).max(0),
        }
    }

    /// Sum an iterator of quantities. Associative/commutative regardless of
    /// iteration order, since it is plain integer addition.
    pub fn sum<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        iter.into_iter().fold(Self::zero(), Self::saturating_add)
    }

    /// `true` iff `self / cap >= numerator / denominator`, computed exactly
    /// by cross-multiplication rather than floating-point division — used by
    /// the enforcement kernel's headroom-warning check.
    #[must_use]
    pub fn at_least_ratio_of(self, cap: Self, numerator: u64, denominator: u64) -> bool {
        if cap.is_zero() {
            return self.is_zero();
        }
        self.nano.saturating_mul(i128::from(denominator)) >= cap.nano.saturating_mul(i128::from(numerator))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nano == 0 {
            return write!(f, "0");
        }

        for (mul, suffix) in [(TI, "Ti"), (GI, "Gi"), (MI, "Mi"), (KI, "Ki")] {
            let unit = mul * NANO;
            if self.nano % unit == 0 {
                return write!(f, "{}{suffix}", self.nano / unit);
            }
        }
        for (mul, suffix) in [(TERA, "T"), (GIGA, "G"), (MEGA, "M"), (KILO, "k")] {
            let unit = mul * NANO;
            if self.nano % unit == 0 {
                return write!(f, "{}{suffix}", self.nano / unit);
            }
        }
        if self.nano % (NANO / 1000) == 0 {
            return write!(f, "{}m", self.nano / (NANO / 1000));
        }
        if self.nano % NANO == 0 {
            return write!(f, "{}", self.nano / NANO);
        }
        // Sub-milli precision with no clean suffix: print as a decimal fraction of the bare unit.
        write!(f, "{}n", self.nano)
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nano.cmp(&other.nano)
    }
}

impl std::ops::Add for Quantity {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self::sum(iter)
    }
}

fn split_suffix(s: &str) -> (&str, &str) {
    for suffix in ["Ki", "Mi", "Gi", "Ti", "m", "k", "M", "G", "T"] {
        if let Some(numeric) = s.strip_suffix(suffix) {
            return (numeric, suffix);
        }
    }
    (s, "")
}

fn suffix_multiplier(suffix: &str) -> Option<(i128, i128)> {
    Some(match suffix {
        "" => (1, 1),
        "m" => (1, 1000),
        "k" => (KILO, 1),
        "M" => (MEGA, 1),
        "G" => (GIGA, 1),
        "T" => (TERA, 1),
        "Ki" => (KI, 1),
        "Mi" => (MI, 1),
        "Gi" => (GI, 1),
        "Ti" => (TI, 1),
        _ => return None,
    })
}

/// Parse a non-negative decimal literal (no suffix) into nano-units exactly.
fn parse_exact_decimal(s: &str) -> Option<i128> {
    if s.is_empty() {
        return None;
    }
    if s.starts_with('-') {
        return None; // quantities are non-negative per the data model
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > 9 {
        return None;
    }

    let int_value: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let mut frac_padded = frac_part.to_string();
    while frac_padded.len() < 9 {
        frac_padded.push('0');
    }
    let frac_value: i128 = if frac_padded.is_empty() {
        0
    } else {
        frac_padded.parse().ok()?
    };

    int_value.checked_mul(NANO)?.checked_add(frac_value)
}
