//! 18-decimal fixed-point values, the "mantissa" representation the
//! Compound-style contracts take in their constructors and admin setters

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    U256,
};
use serde::{Deserialize, Serialize};

use crate::{constants::MANTISSA_ONE, errors::DeployError};

/// A non-negative decimal value scaled by 10^18
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mantissa(U256);

impl Mantissa {
    /// The zero mantissa
    pub const ZERO: Mantissa = Mantissa(U256::ZERO);

    /// Parse a base-10 decimal string, e.g. `"1.08"`, into a mantissa
    pub fn parse(value: &str) -> Result<Self, DeployError> {
        let value = value.trim();
        if value.starts_with('-') {
            return Err(DeployError::FixedPoint(format!(
                "`{}` is negative, mantissas must be non-negative",
                value
            )));
        }

        parse_ether(value)
            .map(Mantissa)
            .map_err(|e| DeployError::FixedPoint(format!("`{}`: {}", value, e)))
    }

    /// The scaled integer passed on-chain
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the value exceeds one whole unit (10^18)
    pub fn exceeds_one(&self) -> bool {
        self.0 > MANTISSA_ONE
    }
}

impl FromStr for Mantissa {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mantissa::parse(s)
    }
}

impl TryFrom<String> for Mantissa {
    type Error = DeployError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Mantissa::parse(&value)
    }
}

impl From<Mantissa> for String {
    fn from(value: Mantissa) -> Self {
        value.to_string()
    }
}

impl Display for Mantissa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = format_ether(self.0);
        // `format_ether` always prints all 18 decimals
        let trimmed = match formatted.split_once('.') {
            Some((whole, frac)) => {
                let frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    whole.to_string()
                } else {
                    format!("{whole}.{frac}")
                }
            }
            None => formatted,
        };
        write!(f, "{trimmed}")
    }
}
