//! Typed descriptors for the contracts in the suite and the steps that deploy them

use std::fmt::{self, Display};

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolValue,
};
use clap::ValueEnum;

use crate::{
    config::{MarketConfig, MigrationConfig},
    constants::{
        COMPTROLLER_ARTIFACT, COMPTROLLER_KEY, INTEREST_RATE_MODEL_ARTIFACT,
        INTEREST_RATE_MODEL_KEY, MARKET_DELEGATE_ARTIFACT, MARKET_DELEGATE_KEY,
        MARKET_DELEGATOR_ARTIFACT, MARKET_DELEGATOR_KEY, MARKET_IMMUTABLE_ARTIFACT,
        MARKET_IMMUTABLE_KEY, PRICE_ORACLE_ARTIFACT, PRICE_ORACLE_KEY, TOKEN_ARTIFACT, TOKEN_KEY,
        UNITROLLER_ARTIFACT, UNITROLLER_KEY,
    },
    errors::DeployError,
    registry::Registry,
};

/// The contracts of the lending suite, in dependency order
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Contract {
    /// The governance token
    Token,
    /// The upgradeable Comptroller proxy
    Unitroller,
    /// The Comptroller implementation
    Comptroller,
    /// The simple price oracle
    PriceOracle,
    /// The white paper interest rate model
    InterestRateModel,
    /// The market logic contract that delegators forward to
    MarketDelegate,
    /// The upgradeable market holding state
    MarketDelegator,
    /// The non-upgradeable market
    MarketImmutable,
}

impl Contract {
    /// Every contract, in deployment order
    pub const ALL: [Contract; 8] = [
        Contract::Token,
        Contract::Unitroller,
        Contract::Comptroller,
        Contract::PriceOracle,
        Contract::InterestRateModel,
        Contract::MarketDelegate,
        Contract::MarketDelegator,
        Contract::MarketImmutable,
    ];

    /// The artifact path the contract is compiled to
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Contract::Token => TOKEN_ARTIFACT,
            Contract::Unitroller => UNITROLLER_ARTIFACT,
            Contract::Comptroller => COMPTROLLER_ARTIFACT,
            Contract::PriceOracle => PRICE_ORACLE_ARTIFACT,
            Contract::InterestRateModel => INTEREST_RATE_MODEL_ARTIFACT,
            Contract::MarketDelegate => MARKET_DELEGATE_ARTIFACT,
            Contract::MarketDelegator => MARKET_DELEGATOR_ARTIFACT,
            Contract::MarketImmutable => MARKET_IMMUTABLE_ARTIFACT,
        }
    }

    /// The key the contract's address is recorded under in the registry
    pub fn registry_key(&self) -> &'static str {
        match self {
            Contract::Token => TOKEN_KEY,
            Contract::Unitroller => UNITROLLER_KEY,
            Contract::Comptroller => COMPTROLLER_KEY,
            Contract::PriceOracle => PRICE_ORACLE_KEY,
            Contract::InterestRateModel => INTEREST_RATE_MODEL_KEY,
            Contract::MarketDelegate => MARKET_DELEGATE_KEY,
            Contract::MarketDelegator => MARKET_DELEGATOR_KEY,
            Contract::MarketImmutable => MARKET_IMMUTABLE_KEY,
        }
    }

    /// Look a contract up by its registry key
    pub fn from_registry_key(key: &str) -> Option<Contract> {
        Contract::ALL.into_iter().find(|c| c.registry_key() == key)
    }

    /// The contracts whose addresses this contract's constructor takes
    pub fn dependencies(&self) -> &'static [Contract] {
        match self {
            Contract::Token
            | Contract::Unitroller
            | Contract::Comptroller
            | Contract::PriceOracle
            | Contract::InterestRateModel
            | Contract::MarketDelegate => &[],
            // Markets are bound to the Unitroller, which checks `isComptroller`
            // through the Comptroller implementation at construction time
            Contract::MarketDelegator => &[
                Contract::Unitroller,
                Contract::Comptroller,
                Contract::InterestRateModel,
                Contract::MarketDelegate,
            ],
            Contract::MarketImmutable => &[
                Contract::Unitroller,
                Contract::Comptroller,
                Contract::InterestRateModel,
            ],
        }
    }

    /// Whether the contract is a market that gets listed in the Comptroller
    pub fn is_market(&self) -> bool {
        matches!(self, Contract::MarketDelegator | Contract::MarketImmutable)
    }

    /// ABI-encode the constructor arguments of the contract.
    ///
    /// Dependencies are read from the registry, so they must already be recorded.
    pub fn constructor_args(
        &self,
        config: &MigrationConfig,
        registry: &Registry,
    ) -> Result<Bytes, DeployError> {
        let encoded = match self {
            Contract::Token => (config.admin,).abi_encode_params(),
            Contract::Unitroller | Contract::Comptroller | Contract::MarketDelegate => vec![],
            Contract::PriceOracle => (config.oracle_symbol.clone(),).abi_encode_params(),
            Contract::InterestRateModel => (
                config.interest_rate_model.base_rate_per_year.raw(),
                config.interest_rate_model.multiplier_per_year.raw(),
            )
                .abi_encode_params(),
            Contract::MarketDelegator => {
                let market = &config.delegator_market;
                let implementation = registry.address(Contract::MarketDelegate)?;
                let (underlying, comptroller, rate_model, exchange_rate, name, symbol, decimals) =
                    market_params(market, config, registry)?;
                (
                    underlying,
                    comptroller,
                    rate_model,
                    exchange_rate,
                    name,
                    symbol,
                    decimals,
                    config.admin,
                    implementation,
                    Bytes::new(), // becomeImplementationData
                )
                    .abi_encode_params()
            }
            Contract::MarketImmutable => {
                let market = &config.immutable_market;
                let (underlying, comptroller, rate_model, exchange_rate, name, symbol, decimals) =
                    market_params(market, config, registry)?;
                (
                    underlying,
                    comptroller,
                    rate_model,
                    exchange_rate,
                    name,
                    symbol,
                    decimals,
                    config.admin,
                )
                    .abi_encode_params()
            }
        };

        Ok(Bytes::from(encoded))
    }
}

/// The constructor parameters shared by both market variants, with decimals widened
/// to a full ABI word
type MarketParams = (Address, Address, Address, U256, String, String, U256);

/// Collect the constructor parameters shared by both market variants.
///
/// Markets take the Unitroller, not the Comptroller implementation, as their comptroller.
fn market_params(
    market: &MarketConfig,
    config: &MigrationConfig,
    registry: &Registry,
) -> Result<MarketParams, DeployError> {
    Ok((
        market.underlying,
        registry.address(Contract::Unitroller)?,
        registry.address(Contract::InterestRateModel)?,
        market.exchange_rate(config.initial_exchange_rate).raw(),
        market.name.clone(),
        market.symbol.clone(),
        U256::from(market.decimals),
    ))
}

impl Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contract::Token => write!(f, "token"),
            Contract::Unitroller => write!(f, "unitroller"),
            Contract::Comptroller => write!(f, "comptroller"),
            Contract::PriceOracle => write!(f, "price-oracle"),
            Contract::InterestRateModel => write!(f, "interest-rate-model"),
            Contract::MarketDelegate => write!(f, "market-delegate"),
            Contract::MarketDelegator => write!(f, "market-delegator"),
            Contract::MarketImmutable => write!(f, "market-immutable"),
        }
    }
}

/// A single step of the migration
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Deploy the governance token
    Token,
    /// Deploy the Unitroller
    Unitroller,
    /// Deploy the Comptroller
    Comptroller,
    /// Deploy the price oracle
    PriceOracle,
    /// Deploy the interest rate model
    InterestRateModel,
    /// Deploy the market delegate
    MarketDelegate,
    /// Bind the Comptroller to the Unitroller
    BindController,
    /// Deploy the delegator market
    MarketDelegator,
    /// Deploy the immutable market
    MarketImmutable,
}

/// What a step does when it runs
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MigrationStep {
    /// Deploy a contract and record its address
    Deploy(Contract),
    /// Run the two-phase Unitroller / Comptroller handshake:
    /// `Unitroller._setPendingImplementation(comptroller)` followed by
    /// `Comptroller._become(unitroller)`
    BindController,
}

impl MigrationStep {
    /// The contracts that must be recorded before the step can run
    pub fn requires(&self) -> &'static [Contract] {
        match self {
            MigrationStep::Deploy(contract) => contract.dependencies(),
            MigrationStep::BindController => &[Contract::Unitroller, Contract::Comptroller],
        }
    }

    /// The contract the step produces, if any
    pub fn produces(&self) -> Option<Contract> {
        match self {
            MigrationStep::Deploy(contract) => Some(*contract),
            MigrationStep::BindController => None,
        }
    }
}

impl From<StepKind> for MigrationStep {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Token => MigrationStep::Deploy(Contract::Token),
            StepKind::Unitroller => MigrationStep::Deploy(Contract::Unitroller),
            StepKind::Comptroller => MigrationStep::Deploy(Contract::Comptroller),
            StepKind::PriceOracle => MigrationStep::Deploy(Contract::PriceOracle),
            StepKind::InterestRateModel => MigrationStep::Deploy(Contract::InterestRateModel),
            StepKind::MarketDelegate => MigrationStep::Deploy(Contract::MarketDelegate),
            StepKind::BindController => MigrationStep::BindController,
            StepKind::MarketDelegator => MigrationStep::Deploy(Contract::MarketDelegator),
            StepKind::MarketImmutable => MigrationStep::Deploy(Contract::MarketImmutable),
        }
    }
}

impl Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStep::Deploy(contract) => write!(f, "deploy {}", contract),
            MigrationStep::BindController => write!(f, "bind-controller"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{Address, Bytes, U256},
        sol_types::SolValue,
    };

    use super::{Contract, MigrationStep};
    use crate::{config::MigrationConfig, registry::Registry};

    /// A registry holding a distinct address for every contract
    fn full_registry() -> Registry {
        let mut registry = Registry::default();
        for (i, contract) in Contract::ALL.into_iter().enumerate() {
            registry.record(contract, Address::with_last_byte(i as u8 + 1));
        }
        registry
    }

    #[test]
    fn test_registry_keys_round_trip() {
        for contract in Contract::ALL {
            assert_eq!(Contract::from_registry_key(contract.registry_key()), Some(contract));
        }
        assert_eq!(Contract::from_registry_key("cTokenAddress"), None);
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        for (i, contract) in Contract::ALL.into_iter().enumerate() {
            for dep in contract.dependencies() {
                let dep_idx = Contract::ALL.iter().position(|c| c == dep).unwrap();
                assert!(dep_idx < i, "{contract} depends on later contract {dep}");
            }
        }
    }

    #[test]
    fn test_controller_takes_no_args() {
        let args = Contract::Comptroller
            .constructor_args(&MigrationConfig::default(), &Registry::default())
            .unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_rate_model_args() {
        let config = MigrationConfig::default();
        let args =
            Contract::InterestRateModel.constructor_args(&config, &Registry::default()).unwrap();

        let (base, multiplier) = <(U256, U256)>::abi_decode_params(&args).unwrap();
        assert_eq!(base, U256::from(20_000_000_000_000_000u64));
        assert_eq!(multiplier, U256::from(300_000_000_000_000_000u64));
    }

    #[test]
    fn test_delegator_args_use_unitroller() {
        let config = MigrationConfig::default();
        let registry = full_registry();
        let args = Contract::MarketDelegator.constructor_args(&config, &registry).unwrap();

        type DelegatorArgs =
            (Address, Address, Address, U256, String, String, U256, Address, Address, Bytes);
        let decoded = DelegatorArgs::abi_decode_params(&args).unwrap();

        assert_eq!(decoded.0, config.delegator_market.underlying);
        assert_eq!(decoded.1, registry.address(Contract::Unitroller).unwrap());
        assert_eq!(decoded.2, registry.address(Contract::InterestRateModel).unwrap());
        assert_eq!(decoded.3, U256::from(5_000_000_000_000_000_000u128));
        assert_eq!(decoded.4, "LDD");
        assert_eq!(decoded.6, U256::from(18));
        assert_eq!(decoded.7, config.admin);
        assert_eq!(decoded.8, registry.address(Contract::MarketDelegate).unwrap());
        assert!(decoded.9.is_empty());
    }

    #[test]
    fn test_market_args_require_recorded_dependencies() {
        let config = MigrationConfig::default();
        let res = Contract::MarketImmutable.constructor_args(&config, &Registry::default());
        assert!(res.is_err());
    }

    #[test]
    fn test_bind_controller_requirements() {
        assert_eq!(
            MigrationStep::BindController.requires(),
            &[Contract::Unitroller, Contract::Comptroller]
        );
        assert_eq!(MigrationStep::BindController.produces(), None);
    }

    #[test]
    fn test_markets() {
        let markets: Vec<_> = Contract::ALL.into_iter().filter(Contract::is_market).collect();
        assert_eq!(markets, vec![Contract::MarketDelegator, Contract::MarketImmutable]);
    }
}
