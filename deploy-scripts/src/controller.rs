//! Post-deployment wiring of the Comptroller: binding it to the Unitroller
//! and applying the protocol's risk parameters

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use tracing::{debug, info, warn};

use crate::{
    config::MigrationConfig,
    deployer::Deployer,
    errors::DeployError,
    registry::Registry,
    solidity::{
        _becomeCall, _setCloseFactorCall, _setCollateralFactorCall, _setCompSpeedCall,
        _setLiquidationIncentiveCall, _setPendingImplementationCall, _setPriceOracleCall,
        _supportMarketCall, comptrollerImplementationCall, marketsCall,
    },
    steps::Contract,
};

// -------------
// | Handshake |
// -------------

/// Bind the Comptroller implementation to the Unitroller proxy.
///
/// The Unitroller first nominates the Comptroller as its pending
/// implementation, then the Comptroller accepts. Until both transactions land,
/// calls to the Unitroller do not reach the Comptroller.
pub async fn bind_controller(
    deployer: &impl Deployer,
    registry: &Registry,
) -> Result<(), DeployError> {
    let unitroller = registry.address(Contract::Unitroller)?;
    let comptroller = registry.address(Contract::Comptroller)?;

    info!("Binding Comptroller {comptroller:#x} to Unitroller {unitroller:#x}");

    let nominate = _setPendingImplementationCall {
        newPendingImplementation: comptroller,
    };
    admin_call(deployer, unitroller, nominate).await?;

    let accept = _becomeCall { unitroller };
    deployer.transact(comptroller, accept.abi_encode().into()).await?;

    let implementation = read_implementation(deployer, unitroller).await?;
    if implementation != comptroller {
        return Err(DeployError::ContractInteraction(format!(
            "Unitroller implementation is {implementation:#x} after binding, \
             expected {comptroller:#x}"
        )));
    }

    info!("Comptroller bound to Unitroller");
    Ok(())
}

/// Read the implementation the Unitroller currently forwards to
pub async fn read_implementation(
    deployer: &impl Deployer,
    unitroller: Address,
) -> Result<Address, DeployError> {
    view_call(deployer, unitroller, comptrollerImplementationCall {}).await
}

// -----------------
// | Configuration |
// -----------------

/// Apply the risk parameters of the config through the Unitroller.
///
/// Markets and the oracle that are not yet deployed are skipped, as are
/// markets that are already listed, so the command can be re-run as the
/// rollout progresses.
pub async fn configure_controller(
    deployer: &impl Deployer,
    registry: &Registry,
    config: &MigrationConfig,
) -> Result<(), DeployError> {
    let unitroller = registry.address(Contract::Unitroller)?;

    match registry.get(Contract::PriceOracle).and_then(|r| r.deployed()) {
        Some(oracle) => {
            let call = _setPriceOracleCall { newOracle: oracle };
            admin_call(deployer, unitroller, call).await?;
            info!("Price oracle set to {oracle:#x}");
        }
        None => warn!("Price oracle not deployed, skipping `_setPriceOracle`"),
    }

    let call = _setCloseFactorCall {
        newCloseFactorMantissa: config.close_factor.raw(),
    };
    admin_call(deployer, unitroller, call).await?;
    info!("Close factor set to {}", config.close_factor);

    let call = _setLiquidationIncentiveCall {
        newLiquidationIncentiveMantissa: config.liquidation_incentive.raw(),
    };
    admin_call(deployer, unitroller, call).await?;
    info!("Liquidation incentive set to {}", config.liquidation_incentive);

    for contract in Contract::ALL.into_iter().filter(Contract::is_market) {
        let Some(market_config) = config.market(contract) else {
            continue;
        };
        let Some(market) = registry.get(contract).and_then(|r| r.deployed()) else {
            debug!("{} not deployed, skipping listing", contract);
            continue;
        };

        if is_listed(deployer, unitroller, market).await? {
            debug!("Market {} ({market:#x}) already listed", market_config.symbol);
        } else {
            admin_call(deployer, unitroller, _supportMarketCall { cToken: market }).await?;
            info!("Listed market {} ({market:#x})", market_config.symbol);
        }

        if let Some(factor) = market_config.collateral_factor {
            let call = _setCollateralFactorCall {
                cToken: market,
                newCollateralFactorMantissa: factor.raw(),
            };
            admin_call(deployer, unitroller, call).await?;
            info!("Collateral factor of {} set to {}", market_config.symbol, factor);
        }

        if !config.comp_speed.is_zero() {
            let call = _setCompSpeedCall {
                cToken: market,
                compSpeed: config.comp_speed.raw(),
            };
            deployer.transact(unitroller, call.abi_encode().into()).await?;
            info!("Reward speed of {} set to {}", market_config.symbol, config.comp_speed);
        }
    }

    Ok(())
}

/// Whether the Comptroller behind the Unitroller already lists the market
pub async fn is_listed(
    deployer: &impl Deployer,
    unitroller: Address,
    market: Address,
) -> Result<bool, DeployError> {
    let listing = view_call(deployer, unitroller, marketsCall { cToken: market }).await?;
    Ok(listing.isListed)
}

// -----------
// | Helpers |
// -----------

/// Simulate a call and decode its typed return value
async fn view_call<C: SolCall>(
    deployer: &impl Deployer,
    to: Address,
    call: C,
) -> Result<C::Return, DeployError> {
    let output = deployer.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output)
        .map_err(|e| DeployError::ContractInteraction(format!("`{}`: {}", C::SIGNATURE, e)))
}

/// Call a Compound-style admin function that reports failure through a
/// non-zero return code rather than a revert.
///
/// The call is simulated first, and only sent if it would succeed.
async fn admin_call<C: SolCall<Return = U256>>(
    deployer: &impl Deployer,
    to: Address,
    call: C,
) -> Result<(), DeployError> {
    let calldata = Bytes::from(call.abi_encode());

    let output = deployer.call(to, calldata.clone()).await?;
    let code = C::abi_decode_returns(&output)
        .map_err(|e| DeployError::ContractInteraction(format!("`{}`: {}", C::SIGNATURE, e)))?;
    if !code.is_zero() {
        return Err(DeployError::ControllerRejected {
            method: C::SIGNATURE,
            code: code.try_into().unwrap_or(u64::MAX),
        });
    }

    deployer.transact(to, calldata).await
}
