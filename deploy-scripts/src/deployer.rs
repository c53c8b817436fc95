//! The capability to submit contract-creation and contract-call transactions

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tracing::debug;

use crate::{artifacts::Artifact, errors::DeployError};

/// Submits transactions on behalf of the migration.
///
/// Implementations wait for each transaction to be mined before returning, so
/// callers observe a strictly sequential history.
#[allow(async_fn_in_trait)]
pub trait Deployer {
    /// Deploy an artifact with the given ABI-encoded constructor arguments,
    /// returning the address of the created contract
    async fn deploy(
        &self,
        artifact: &Artifact,
        constructor_args: Bytes,
    ) -> Result<Address, DeployError>;

    /// Simulate a call without sending a transaction, returning the raw return data
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeployError>;

    /// Send a transaction calling the given contract
    async fn transact(&self, to: Address, calldata: Bytes) -> Result<(), DeployError>;
}

/// A deployer backed by a signing JSON-RPC provider
#[derive(Clone)]
pub struct RpcDeployer {
    /// The signing provider
    provider: DynProvider,
    /// The number of confirmations to wait for on each transaction
    confirmations: u64,
}

impl RpcDeployer {
    /// Create a deployer from a signing provider
    pub fn new(provider: DynProvider, confirmations: u64) -> Self {
        Self {
            provider,
            confirmations,
        }
    }

    /// Send a transaction and wait for its receipt
    async fn send(&self, tx: TransactionRequest) -> Result<TransactionReceipt, String> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| e.to_string())?;
        debug!("Sent transaction {:#x}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| e.to_string())?;

        if !receipt.status() {
            return Err(format!("transaction {:#x} reverted", receipt.transaction_hash));
        }

        Ok(receipt)
    }
}

impl Deployer for RpcDeployer {
    async fn deploy(
        &self,
        artifact: &Artifact,
        constructor_args: Bytes,
    ) -> Result<Address, DeployError> {
        let code = artifact.deploy_code(&constructor_args);
        let tx = TransactionRequest::default().with_deploy_code(code);

        let receipt = self.send(tx).await.map_err(|e| {
            DeployError::ContractDeployment(format!("{}: {}", artifact.contract_name, e))
        })?;

        receipt.contract_address().ok_or_else(|| {
            DeployError::ContractDeployment(format!(
                "{}: receipt has no contract address",
                artifact.contract_name
            ))
        })
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeployError> {
        let tx = TransactionRequest::default().with_to(to).with_input(calldata);
        self.provider
            .call(tx)
            .await
            .map_err(|e| DeployError::ContractInteraction(format!("{:#x}: {}", to, e)))
    }

    async fn transact(&self, to: Address, calldata: Bytes) -> Result<(), DeployError> {
        let tx = TransactionRequest::default().with_to(to).with_input(calldata);
        self.send(tx)
            .await
            .map(|_| ())
            .map_err(|e| DeployError::ContractInteraction(format!("{:#x}: {}", to, e)))
    }
}
