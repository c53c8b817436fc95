//! Definitions of Solidity functions called after deployment

use alloy::sol;

sol! {
    // Unitroller
    function _setPendingImplementation(address newPendingImplementation)
        external
        returns (uint256);
    function comptrollerImplementation() external view returns (address);

    // Comptroller implementation
    function _become(address unitroller) external;

    // Comptroller admin, called through the Unitroller
    function markets(address cToken)
        external
        view
        returns (bool isListed, uint256 collateralFactorMantissa);
    function _setPriceOracle(address newOracle) external returns (uint256);
    function _setCloseFactor(uint256 newCloseFactorMantissa) external returns (uint256);
    function _setLiquidationIncentive(uint256 newLiquidationIncentiveMantissa)
        external
        returns (uint256);
    function _supportMarket(address cToken) external returns (uint256);
    function _setCollateralFactor(address cToken, uint256 newCollateralFactorMantissa)
        external
        returns (uint256);
    function _setCompSpeed(address cToken, uint256 compSpeed) external;
}
