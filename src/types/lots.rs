use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Trade volume in lots using NewType pattern for type safety
/// Distinct from Price so monetary values and volumes cannot be mixed up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lots(pub Decimal);

impl Lots {
    pub const ZERO: Lots = Lots(Decimal::ZERO);

    /// Create a new Lots from a Decimal
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the underlying Decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Create a Lots from a string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self(decimal))
    }

    /// Check if the volume is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Clamp the volume into an inclusive range
    pub fn clamp(self, min: Lots, max: Lots) -> Lots {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    /// Round the volume to the nearest multiple of a broker volume step
    pub fn round_to_step(self, step: Lots) -> Lots {
        if step.is_zero() {
            return self;
        }
        let steps = (self.0 / step.0).round();
        let rounded = steps * step.0;
        // Re-normalize to the step's own precision so 0.160000 reads as 0.16
        Lots(rounded.round_dp(step.0.normalize().scale()))
    }
}

impl fmt::Display for Lots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Custom serialization to preserve decimal places
impl Serialize for Lots {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Custom deserialization from string
impl<'de> Deserialize<'de> for Lots {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Lots(decimal))
    }
}

impl std::ops::Add for Lots {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::ops::Sub for Lots {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl std::ops::Mul<Decimal> for Lots {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0 * rhs)
    }
}

impl std::ops::Div<Decimal> for Lots {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self {
        Self(self.0 / rhs)
    }
}
