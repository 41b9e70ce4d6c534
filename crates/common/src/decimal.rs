//! Exact base-10 fixed-point numbers.
//!
//! A [`Decimal`] is an `i128` mantissa scaled by `10^-scale`, with the scale
//! limited to [`MAX_SCALE`] fractional digits. Values are kept normalized
//! (no trailing fractional zeros), so derived equality and hashing agree
//! with numeric equality: `1.50 == 1.5`.
//!
//! ```
//! use tarn_common::Decimal;
//!
//! let a: Decimal = "0.1".parse().unwrap();
//! let b: Decimal = "0.2".parse().unwrap();
//! assert_eq!(a.checked_add(b).unwrap().to_string(), "0.3");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum number of fractional digits.
pub const MAX_SCALE: u32 = 28;

/// An exact decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

/// Errors from parsing decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDecimalError {
    #[error("empty decimal literal")]
    Empty,
    #[error("invalid digit in decimal literal")]
    InvalidDigit,
    #[error("more than {MAX_SCALE} fractional digits")]
    TooManyFractionalDigits,
    #[error("decimal literal out of range")]
    Overflow,
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

impl Decimal {
    pub const ZERO: Self = Self {
        mantissa: 0,
        scale: 0,
    };

    pub const ONE: Self = Self {
        mantissa: 1,
        scale: 0,
    };

    /// Create `mantissa * 10^-scale`. Returns `None` if `scale > MAX_SCALE`.
    pub fn new(mantissa: i128, scale: u32) -> Option<Self> {
        (scale <= MAX_SCALE).then(|| Self::normalized(mantissa, scale))
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            mantissa: value as i128,
            scale: 0,
        }
    }

    /// The unscaled integer value.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Lossy conversion for mixed-kind arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    fn normalized(mut mantissa: i128, mut scale: u32) -> Self {
        if mantissa == 0 {
            return Self::ZERO;
        }
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Self { mantissa, scale }
    }

    /// Build from a mantissa and a scale that may be negative or above
    /// `MAX_SCALE`. Excess fractional digits are truncated toward zero.
    fn rescaled(mantissa: i128, scale: i64) -> Option<Self> {
        if scale < 0 {
            let factor = pow10(u32::try_from(-scale).ok()?)?;
            return Some(Self::normalized(mantissa.checked_mul(factor)?, 0));
        }
        let max = MAX_SCALE as i64;
        if scale > max {
            let excess = u32::try_from(scale - max).ok()?;
            let truncated = match pow10(excess) {
                Some(divisor) => mantissa / divisor,
                None => 0,
            };
            return Some(Self::normalized(truncated, MAX_SCALE));
        }
        Some(Self::normalized(mantissa, scale as u32))
    }

    /// Both mantissas brought to the larger of the two scales.
    fn aligned(self, rhs: Self) -> Option<(i128, i128, u32)> {
        let scale = self.scale.max(rhs.scale);
        let lhs_m = self.mantissa.checked_mul(pow10(scale - self.scale)?)?;
        let rhs_m = rhs.mantissa.checked_mul(pow10(scale - rhs.scale)?)?;
        Some((lhs_m, rhs_m, scale))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let (a, b, scale) = self.aligned(rhs)?;
        Some(Self::normalized(a.checked_add(b)?, scale))
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let (a, b, scale) = self.aligned(rhs)?;
        Some(Self::normalized(a.checked_sub(b)?, scale))
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let product = self.mantissa.checked_mul(rhs.mantissa)?;
        Self::rescaled(product, self.scale as i64 + rhs.scale as i64)
    }

    /// Quotient with up to `MAX_SCALE` fractional digits, truncated toward
    /// zero. Returns `None` on division by zero or overflow.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        // Widen the dividend as far as i128 allows, up to the precision cap.
        let mut shift = (MAX_SCALE + rhs.scale).saturating_sub(self.scale);
        let dividend = loop {
            if let Some(d) = pow10(shift).and_then(|p| self.mantissa.checked_mul(p)) {
                break d;
            }
            if shift == 0 {
                return None;
            }
            shift -= 1;
        };
        let quotient = dividend.checked_div(rhs.mantissa)?;
        Self::rescaled(
            quotient,
            self.scale as i64 + shift as i64 - rhs.scale as i64,
        )
    }

    fn split(&self) -> (i128, i128) {
        // scale <= MAX_SCALE, so the power always fits
        let unit = pow10(self.scale).unwrap_or(1);
        (self.mantissa / unit, self.mantissa % unit)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs_int, lhs_frac) = self.split();
        let (rhs_int, rhs_frac) = other.split();
        lhs_int.cmp(&rhs_int).then_with(|| {
            // Fractions are below 10^MAX_SCALE, so aligning them cannot overflow.
            let scale = self.scale.max(other.scale);
            let lhs = lhs_frac * pow10(scale - self.scale).unwrap_or(1);
            let rhs = rhs_frac * pow10(scale - other.scale).unwrap_or(1);
            lhs.cmp(&rhs)
        })
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError::Empty);
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(ParseDecimalError::InvalidDigit);
        }
        let scale =
            u32::try_from(frac_part.len()).map_err(|_| ParseDecimalError::TooManyFractionalDigits)?;
        if scale > MAX_SCALE {
            return Err(ParseDecimalError::TooManyFractionalDigits);
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as i128))
                .ok_or(ParseDecimalError::Overflow)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(Self::normalized(mantissa, scale))
    }
}
