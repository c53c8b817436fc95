//! Constants used in the deploy scripts

use alloy::primitives::{address, Address, U256};

/// The number of confirmations to wait for on each transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// 1.0 expressed as an 18-decimal mantissa
pub const MANTISSA_ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// The largest collateral factor the Comptroller accepts (0.9)
pub const MAX_COLLATERAL_FACTOR: U256 = U256::from_limbs([900_000_000_000_000_000, 0, 0, 0]);

/// The largest number of decimals for which `10^decimals` still fits a `uint256`
pub const MAX_TOKEN_DECIMALS: u8 = 77;

// -------------
// | Artifacts |
// -------------

/// The extension of a Truffle / Hardhat build artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The placeholder prefix solc leaves in bytecode for unlinked libraries
pub const UNLINKED_LIBRARY_MARKER: &str = "__";

/// The governance token artifact
pub const TOKEN_ARTIFACT: &str = "Governance/Mara";
/// The Comptroller proxy artifact
pub const UNITROLLER_ARTIFACT: &str = "Unitroller";
/// The Comptroller implementation artifact
pub const COMPTROLLER_ARTIFACT: &str = "Comptroller";
/// The price oracle artifact
pub const PRICE_ORACLE_ARTIFACT: &str = "SimplePriceOracle";
/// The interest rate model artifact
pub const INTEREST_RATE_MODEL_ARTIFACT: &str = "WhitePaperInterestRateModel";
/// The market logic (delegate) artifact
pub const MARKET_DELEGATE_ARTIFACT: &str = "AErc20Delegate";
/// The market storage (delegator) artifact
pub const MARKET_DELEGATOR_ARTIFACT: &str = "AErc20Delegator";
/// The non-upgradeable market artifact
pub const MARKET_IMMUTABLE_ARTIFACT: &str = "AErc20Immutable";

// ------------------------
// | Deployments Registry |
// ------------------------

/// The governance token key in the `deployments.json` file
pub const TOKEN_KEY: &str = "Token";
/// The Unitroller key in the `deployments.json` file
pub const UNITROLLER_KEY: &str = "Unitroller";
/// The Comptroller key in the `deployments.json` file
pub const COMPTROLLER_KEY: &str = "Comptroller";
/// The price oracle key in the `deployments.json` file
pub const PRICE_ORACLE_KEY: &str = "SimplePriceOracle";
/// The interest rate model key in the `deployments.json` file
pub const INTEREST_RATE_MODEL_KEY: &str = "WhitePaperInterestRateModel";
/// The market delegate key in the `deployments.json` file
pub const MARKET_DELEGATE_KEY: &str = "MarketDelegate";
/// The market delegator key in the `deployments.json` file
pub const MARKET_DELEGATOR_KEY: &str = "MarketDelegator";
/// The immutable market key in the `deployments.json` file
pub const MARKET_IMMUTABLE_KEY: &str = "MarketImmutable";

// ------------
// | Defaults |
// ------------

/// The default RPC URL, a local Anvil / Ganache node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default path of the deployments registry
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory holding the compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The default protocol admin, also the recipient of the governance token supply
pub const DEFAULT_ADMIN: Address = address!("0xAA019896bbFD00ba44265Fa6fe81aADCB24afc41");

/// The default underlying asset of the immutable market
pub const DEFAULT_IMMUTABLE_UNDERLYING: Address =
    address!("0x99cdc7ca99e84Bc18Fb0Eb4f42E4409f2Dda2780");

/// The default underlying asset of the delegator market
pub const DEFAULT_DELEGATOR_UNDERLYING: Address =
    address!("0x91431bE3d3A17646D5dabea84AB7261edb95839C");

/// The symbol the simple price oracle is constructed with
pub const DEFAULT_ORACLE_SYMBOL: &str = "LCC";

/// The default initial exchange rate of a market
pub const DEFAULT_INITIAL_EXCHANGE_RATE: &str = "2";

/// The initial exchange rate of the delegator market
pub const DEFAULT_DELEGATOR_EXCHANGE_RATE: &str = "5";

/// The default liquidation incentive
pub const DEFAULT_LIQUIDATION_INCENTIVE: &str = "1.08";

/// The default close factor
pub const DEFAULT_CLOSE_FACTOR: &str = "0.8";

/// The default reward emission speed, zero means rewards do not drip
pub const DEFAULT_COMP_SPEED: &str = "0";

/// The default yearly base rate of the interest rate model
pub const DEFAULT_BASE_RATE_PER_YEAR: &str = "0.02";

/// The default yearly utilization multiplier of the interest rate model
pub const DEFAULT_MULTIPLIER_PER_YEAR: &str = "0.3";

/// The number of decimals both default markets are created with
pub const DEFAULT_MARKET_DECIMALS: u8 = 18;
