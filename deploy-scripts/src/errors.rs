//! Definitions of errors that can occur while deploying the lending markets

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum DeployError {
    /// Error reading the deployments registry file
    ReadDeployments(String),
    /// Error writing the deployments registry file
    WriteDeployments(String),
    /// Error reading or validating the migration config
    Config(String),
    /// Error parsing a fixed-point decimal value
    FixedPoint(String),
    /// A compiled contract artifact could not be found
    ArtifactNotFound(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A Compound-style admin function returned a non-zero error code
    ControllerRejected {
        /// The admin function that was called
        method: &'static str,
        /// The error code returned by the contract
        code: u64,
    },
    /// A contract address is needed but is not recorded as deployed
    MissingDependency {
        /// The registry key of the missing contract
        dependency: &'static str,
        /// Why the address is unavailable
        reason: String,
    },
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            DeployError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            DeployError::Config(s) => write!(f, "invalid migration config: {}", s),
            DeployError::FixedPoint(s) => write!(f, "error parsing fixed-point value: {}", s),
            DeployError::ArtifactNotFound(s) => write!(f, "artifact not found: {}", s),
            DeployError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            DeployError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            DeployError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            DeployError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            DeployError::ControllerRejected { method, code } => {
                write!(f, "`{}` rejected with error code {}", method, code)
            }
            DeployError::MissingDependency { dependency, reason } => {
                write!(f, "missing dependency `{}`: {}", dependency, reason)
            }
        }
    }
}

impl Error for DeployError {}
