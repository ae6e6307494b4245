//! Quality values: weights in [0, 1].

use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// A quality weight, always within [0, 1].
///
/// Used both for client preferences (`q`) and for a variant's own
/// declared weights (`qs`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(f64);

impl Quality {
    pub const ZERO: Quality = Quality(0.0);
    pub const ONE: Quality = Quality(1.0);

    /// Clamp `value` into [0, 1]. NaN becomes zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Parse a `q` parameter value. Out-of-range numbers are clamped;
    /// anything non-numeric is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let value: f64 = text.trim().parse().ok()?;
        value.is_finite().then(|| Self::new(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }

    /// Fixed five-decimal rendering used in variant lists.
    pub fn format_fixed(self) -> String {
        format!("{:.5}", self.0)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::ONE
    }
}

impl Mul for Quality {
    type Output = Quality;

    fn mul(self, rhs: Quality) -> Quality {
        Quality(self.0 * rhs.0)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
