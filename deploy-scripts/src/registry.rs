//! The registry of deployed contract addresses, persisted as `deployments.json`.
//!
//! The file is a flat JSON object keyed by each contract's registry key. An
//! empty string marks a contract that is expected but not yet deployed.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    path::Path,
    str::FromStr,
};

use alloy::primitives::Address;
use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::debug;

use crate::{errors::DeployError, steps::Contract};

/// The state of a single registry entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedAddress {
    /// The contract is deployed at the given address
    Deployed(Address),
    /// The entry is reserved for a contract that has not been deployed yet
    Pending,
}

impl RecordedAddress {
    /// The deployed address, if any
    pub fn deployed(&self) -> Option<Address> {
        match self {
            RecordedAddress::Deployed(address) => Some(*address),
            RecordedAddress::Pending => None,
        }
    }
}

impl FromStr for RecordedAddress {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(RecordedAddress::Pending);
        }

        Address::from_str(s)
            .map(RecordedAddress::Deployed)
            .map_err(|e| DeployError::ReadDeployments(format!("invalid address `{}`: {}", s, e)))
    }
}

impl Display for RecordedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedAddress::Deployed(address) => write!(f, "{address:#x}"),
            RecordedAddress::Pending => write!(f, "<pending>"),
        }
    }
}

/// Contract addresses keyed by contract, ordered by deployment order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    /// The recorded entries
    entries: BTreeMap<Contract, RecordedAddress>,
}

impl Registry {
    /// Load the registry from the given file.
    ///
    /// A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        if !path.exists() {
            debug!("No deployments file at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| DeployError::ReadDeployments(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Parse the registry from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, DeployError> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| DeployError::ReadDeployments(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let contract = Contract::from_registry_key(&key).ok_or_else(|| {
                DeployError::ReadDeployments(format!("unknown deployment key `{}`", key))
            })?;
            entries.insert(contract, value.parse()?);
        }

        Ok(Self { entries })
    }

    /// Write the registry to the given file
    pub fn save(&self, path: &Path) -> Result<(), DeployError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DeployError::WriteDeployments(e.to_string()))?;
        fs::write(path, json + "\n")
            .map_err(|e| DeployError::WriteDeployments(format!("{}: {}", path.display(), e)))
    }

    /// The entry for a contract, `None` if the registry does not mention it
    pub fn get(&self, contract: Contract) -> Option<RecordedAddress> {
        self.entries.get(&contract).copied()
    }

    /// The deployed address of a contract, erroring if it is missing or pending
    pub fn address(&self, contract: Contract) -> Result<Address, DeployError> {
        let reason = match self.get(contract) {
            Some(RecordedAddress::Deployed(address)) => return Ok(address),
            Some(RecordedAddress::Pending) => "pending deployment",
            None => "not recorded in the deployments registry",
        };

        Err(DeployError::MissingDependency {
            dependency: contract.registry_key(),
            reason: reason.to_string(),
        })
    }

    /// Whether the contract has a deployed address recorded
    pub fn is_deployed(&self, contract: Contract) -> bool {
        matches!(self.get(contract), Some(RecordedAddress::Deployed(_)))
    }

    /// Record a deployed address, returning the previous entry
    pub fn record(&mut self, contract: Contract, address: Address) -> Option<RecordedAddress> {
        self.entries.insert(contract, RecordedAddress::Deployed(address))
    }

    /// Reserve an entry for a contract that will be deployed later
    pub fn mark_pending(&mut self, contract: Contract) {
        self.entries.insert(contract, RecordedAddress::Pending);
    }

    /// Iterate over the entries in deployment order
    pub fn iter(&self) -> impl Iterator<Item = (Contract, RecordedAddress)> + '_ {
        self.entries.iter().map(|(c, a)| (*c, *a))
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (contract, recorded) in &self.entries {
            let value = match recorded {
                RecordedAddress::Deployed(address) => format!("{address:#x}"),
                RecordedAddress::Pending => String::new(),
            };
            map.serialize_entry(contract.registry_key(), &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::{RecordedAddress, Registry};
    use crate::{errors::DeployError, steps::Contract};

    /// A registry file in the shape of a partially completed rollout
    const PARTIAL_ROLLOUT: &str = r#"{
        "Token": "0x7901974ce90B609202761437f3A8488eBF3cEA76",
        "Unitroller": "0xD9973756943391E5ed3D31bBfAD06059d400422d",
        "Comptroller": "0x3f4F6F66a253f5E11b822E519fde386602A5F1A4",
        "MarketImmutable": ""
    }"#;

    #[test]
    fn test_pending_distinct_from_deployed() {
        let registry = Registry::from_json(PARTIAL_ROLLOUT).unwrap();

        assert_eq!(registry.get(Contract::MarketImmutable), Some(RecordedAddress::Pending));
        assert!(!registry.is_deployed(Contract::MarketImmutable));
        assert!(matches!(
            registry.address(Contract::MarketImmutable),
            Err(DeployError::MissingDependency { dependency: "MarketImmutable", .. })
        ));

        assert_eq!(
            registry.address(Contract::Unitroller).unwrap(),
            address!("0xD9973756943391E5ed3D31bBfAD06059d400422d")
        );
        assert_eq!(registry.get(Contract::PriceOracle), None);
    }

    #[test]
    fn test_malformed_address_rejected() {
        let res = Registry::from_json(r#"{ "Comptroller": "0x3f4F6F66" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let res = Registry::from_json(r#"{ "LErc20ImmutableAddress": "" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_save_and_load_keeps_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut registry = Registry::from_json(PARTIAL_ROLLOUT).unwrap();
        let oracle = address!("0xeE859Cdb7845f996c5A03F266D6335BE09e8799f");
        registry.record(Contract::PriceOracle, oracle);
        registry.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(r#""MarketImmutable": """#));

        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(reloaded, registry);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(&dir.path().join("missing.json")).unwrap();
        assert_eq!(registry.iter().count(), 0);
    }
}
