//! Protocol parameters consumed by the migration.
//!
//! Every field has a default, so a config file only needs to name the
//! parameters it overrides.

use std::{fs, path::Path};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    constants::{
        DEFAULT_ADMIN, DEFAULT_BASE_RATE_PER_YEAR, DEFAULT_CLOSE_FACTOR, DEFAULT_COMP_SPEED,
        DEFAULT_DELEGATOR_EXCHANGE_RATE, DEFAULT_DELEGATOR_UNDERLYING,
        DEFAULT_IMMUTABLE_UNDERLYING, DEFAULT_INITIAL_EXCHANGE_RATE,
        DEFAULT_LIQUIDATION_INCENTIVE, DEFAULT_MARKET_DECIMALS, DEFAULT_MULTIPLIER_PER_YEAR,
        DEFAULT_ORACLE_SYMBOL, MANTISSA_ONE, MAX_COLLATERAL_FACTOR, MAX_TOKEN_DECIMALS,
    },
    errors::DeployError,
    fixed_point::Mantissa,
    steps::Contract,
};

/// The full set of parameters for a migration run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MigrationConfig {
    /// Admin of the markets and holder of the initial token supply
    pub admin: Address,
    /// Exchange rate markets start at when not overridden per market
    pub initial_exchange_rate: Mantissa,
    /// Bonus collateral paid to liquidators
    pub liquidation_incentive: Mantissa,
    /// Largest share of a borrow repayable in a single liquidation
    pub close_factor: Mantissa,
    /// Reward emission speed per block, zero disables emission
    pub comp_speed: Mantissa,
    /// Symbol the price oracle is constructed with
    pub oracle_symbol: String,
    /// Interest rate curve parameters
    pub interest_rate_model: InterestRateModelConfig,
    /// The upgradeable market
    pub delegator_market: MarketConfig,
    /// The non-upgradeable market
    pub immutable_market: MarketConfig,
}

/// Parameters of the white paper interest rate model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InterestRateModelConfig {
    /// Yearly borrow rate at zero utilization
    pub base_rate_per_year: Mantissa,
    /// Rate of increase of the borrow rate with utilization
    pub multiplier_per_year: Mantissa,
}

/// Parameters of a single market
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarketConfig {
    /// The ERC-20 the market lends out
    pub underlying: Address,
    /// Exchange rate between the underlying and market tokens at launch,
    /// falls back to the top-level `initialExchangeRate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_exchange_rate: Option<Mantissa>,
    /// ERC-20 name of the market token
    pub name: String,
    /// ERC-20 symbol of the market token
    pub symbol: String,
    /// ERC-20 decimals of the market token
    pub decimals: u8,
    /// Collateral factor to list the market with, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_factor: Option<Mantissa>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            admin: DEFAULT_ADMIN,
            initial_exchange_rate: default_mantissa(DEFAULT_INITIAL_EXCHANGE_RATE),
            liquidation_incentive: default_mantissa(DEFAULT_LIQUIDATION_INCENTIVE),
            close_factor: default_mantissa(DEFAULT_CLOSE_FACTOR),
            comp_speed: default_mantissa(DEFAULT_COMP_SPEED),
            oracle_symbol: DEFAULT_ORACLE_SYMBOL.to_string(),
            interest_rate_model: InterestRateModelConfig::default(),
            delegator_market: MarketConfig {
                underlying: DEFAULT_DELEGATOR_UNDERLYING,
                initial_exchange_rate: Some(default_mantissa(DEFAULT_DELEGATOR_EXCHANGE_RATE)),
                name: "LDD".to_string(),
                symbol: "LDD".to_string(),
                decimals: DEFAULT_MARKET_DECIMALS,
                collateral_factor: None,
            },
            immutable_market: MarketConfig {
                underlying: DEFAULT_IMMUTABLE_UNDERLYING,
                initial_exchange_rate: None,
                name: "LCC".to_string(),
                symbol: "LCC".to_string(),
                decimals: DEFAULT_MARKET_DECIMALS,
                collateral_factor: None,
            },
        }
    }
}

impl Default for InterestRateModelConfig {
    fn default() -> Self {
        Self {
            base_rate_per_year: default_mantissa(DEFAULT_BASE_RATE_PER_YEAR),
            multiplier_per_year: default_mantissa(DEFAULT_MULTIPLIER_PER_YEAR),
        }
    }
}

/// Parse one of the literal defaults in `constants.rs`
fn default_mantissa(value: &str) -> Mantissa {
    // The defaults are compile-time literals covered by the tests below
    Mantissa::parse(value).unwrap_or(Mantissa::ZERO)
}

impl MigrationConfig {
    /// Load a config from a JSON file, falling back to defaults for any missing field
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DeployError::Config(format!("{}: {}", path.display(), e)))?;
        let config: MigrationConfig = serde_json::from_str(&contents)
            .map_err(|e| DeployError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        info!("Loaded migration config from {}", path.display());
        Ok(config)
    }

    /// Load the config at `path` if given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// The parameters of a market contract, `None` for contracts that are not markets
    pub fn market(&self, contract: Contract) -> Option<&MarketConfig> {
        match contract {
            Contract::MarketDelegator => Some(&self.delegator_market),
            Contract::MarketImmutable => Some(&self.immutable_market),
            _ => None,
        }
    }

    /// Check the parameters against the ranges the Comptroller accepts
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.close_factor.exceeds_one() {
            return Err(DeployError::Config(format!(
                "close factor {} exceeds 1",
                self.close_factor
            )));
        }

        if self.liquidation_incentive.raw() < MANTISSA_ONE {
            return Err(DeployError::Config(format!(
                "liquidation incentive {} is below 1",
                self.liquidation_incentive
            )));
        }

        for market in [&self.delegator_market, &self.immutable_market] {
            market.validate(self.initial_exchange_rate)?;
        }

        Ok(())
    }
}

impl MarketConfig {
    /// The exchange rate the market launches at
    pub fn exchange_rate(&self, default: Mantissa) -> Mantissa {
        self.initial_exchange_rate.unwrap_or(default)
    }

    /// Check the market's parameters
    fn validate(&self, default_exchange_rate: Mantissa) -> Result<(), DeployError> {
        if self.exchange_rate(default_exchange_rate).is_zero() {
            return Err(DeployError::Config(format!(
                "market {} has a zero initial exchange rate",
                self.symbol
            )));
        }

        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(DeployError::Config(format!(
                "market {} has {} decimals, at most {} are supported",
                self.symbol, self.decimals, MAX_TOKEN_DECIMALS
            )));
        }

        if let Some(factor) = self.collateral_factor {
            if factor.raw() > MAX_COLLATERAL_FACTOR {
                return Err(DeployError::Config(format!(
                    "market {} collateral factor {} exceeds 0.9",
                    self.symbol, factor
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::Path};

    use alloy::primitives::U256;

    use super::MigrationConfig;
    use crate::{constants::DEFAULT_ADMIN, fixed_point::Mantissa};

    #[test]
    fn test_defaults_match_original_constants() {
        let config = MigrationConfig::default();

        assert_eq!(config.initial_exchange_rate.raw(), U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(config.liquidation_incentive.raw(), U256::from(1_080_000_000_000_000_000u128));
        assert_eq!(config.close_factor.raw(), U256::from(800_000_000_000_000_000u128));
        assert!(config.comp_speed.is_zero());
        assert_eq!(config.admin, DEFAULT_ADMIN);
        assert_eq!(
            config.immutable_market.exchange_rate(config.initial_exchange_rate),
            config.initial_exchange_rate
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "closeFactor": "0.5", "delegatorMarket": {
            "underlying": "0x0000000000000000000000000000000000000001",
            "initialExchangeRate": "0.02",
            "name": "Lending DAI",
            "symbol": "lDAI",
            "decimals": 8,
            "collateralFactor": "0.75"
        } }"#;
        let config: MigrationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.close_factor, Mantissa::parse("0.5").unwrap());
        assert_eq!(config.delegator_market.symbol, "lDAI");
        assert_eq!(
            config.delegator_market.collateral_factor,
            Some(Mantissa::parse("0.75").unwrap())
        );
        // Untouched fields keep their defaults
        assert_eq!(config.liquidation_incentive, Mantissa::parse("1.08").unwrap());
        assert_eq!(config.immutable_market.symbol, "LCC");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_value_rejected() {
        let res = serde_json::from_str::<MigrationConfig>(r#"{ "compSpeed": "-1" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let res = serde_json::from_str::<MigrationConfig>(r#"{ "closeFactorMantisa": "0.8" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut config = MigrationConfig::default();
        config.close_factor = Mantissa::parse("1.5").unwrap();
        assert!(config.validate().is_err());

        let mut config = MigrationConfig::default();
        config.liquidation_incentive = Mantissa::parse("0.9").unwrap();
        assert!(config.validate().is_err());

        let mut config = MigrationConfig::default();
        config.immutable_market.collateral_factor = Some(Mantissa::parse("0.95").unwrap());
        assert!(config.validate().is_err());

        let mut config = MigrationConfig::default();
        config.delegator_market.initial_exchange_rate = Some(Mantissa::ZERO);
        assert!(config.validate().is_err());

        // The immutable market inherits the top-level rate
        let mut config = MigrationConfig::default();
        config.initial_exchange_rate = Mantissa::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "oracleSymbol": "MARA" }}"#).unwrap();

        let config = MigrationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.oracle_symbol, "MARA");
    }

    #[test]
    fn test_demo_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/config.json");
        let config = MigrationConfig::from_file(&path).unwrap();

        assert_eq!(config.close_factor.to_string(), "0.5");
        assert_eq!(
            config.delegator_market.collateral_factor,
            Some(Mantissa::parse("0.75").unwrap())
        );
        assert_eq!(config.immutable_market, MigrationConfig::default().immutable_market);
    }
}
