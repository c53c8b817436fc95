//! Resolution of compiled contract artifacts by name

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};

use alloy::primitives::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{ARTIFACT_EXTENSION, UNLINKED_LIBRARY_MARKER},
    errors::DeployError,
};

/// A compiled contract, ready to be deployed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// The contract name, as reported by the compiler
    pub contract_name: String,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

impl Artifact {
    /// The deployment payload: creation bytecode followed by the encoded constructor arguments
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }
}

/// The subset of a Truffle / Hardhat build artifact the scripts need
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildArtifact {
    /// The contract name
    contract_name: String,
    /// The creation bytecode, in hex
    bytecode: String,
}

/// A source of compiled contract artifacts
pub trait ArtifactSource {
    /// Resolve an artifact by its path, e.g. `"Governance/Mara"`
    fn resolve(&self, name: &str) -> Result<Artifact, DeployError>;
}

/// Artifacts read from a build directory such as Truffle's `build/contracts`.
///
/// Build tools flatten the source tree, so `"Governance/Mara"` resolves to
/// `<dir>/Mara.json`.
#[derive(Clone, Debug)]
pub struct ArtifactDir {
    /// The build directory
    dir: PathBuf,
}

impl ArtifactDir {
    /// Create a source reading from the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file an artifact name resolves to
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        let file_stem = name
            .trim_start_matches("./")
            .trim_end_matches(".sol")
            .rsplit('/')
            .next()
            .unwrap_or(name);
        self.dir.join(file_stem).with_extension(ARTIFACT_EXTENSION)
    }
}

impl ArtifactSource for ArtifactDir {
    fn resolve(&self, name: &str) -> Result<Artifact, DeployError> {
        let path = self.artifact_path(name);
        debug!("Resolving artifact `{}` from {}", name, path.display());

        let contents = fs::read_to_string(&path).map_err(|e| {
            DeployError::ArtifactNotFound(format!("`{}` ({}): {}", name, path.display(), e))
        })?;
        parse_artifact(name, &contents)
    }
}

/// Artifacts held in memory, keyed by name
#[derive(Clone, Debug, Default)]
pub struct InMemoryArtifacts {
    /// The artifacts
    artifacts: HashMap<String, Artifact>,
}

impl InMemoryArtifacts {
    /// Add an artifact under the given name
    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) {
        self.artifacts.insert(name.into(), artifact);
    }
}

impl ArtifactSource for InMemoryArtifacts {
    fn resolve(&self, name: &str) -> Result<Artifact, DeployError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| DeployError::ArtifactNotFound(format!("`{}`", name)))
    }
}

/// Parse and validate the JSON of a build artifact
pub fn parse_artifact(name: &str, json: &str) -> Result<Artifact, DeployError> {
    let build: BuildArtifact = serde_json::from_str(json)
        .map_err(|e| DeployError::ArtifactParsing(format!("`{}`: {}", name, e)))?;

    if build.bytecode.contains(UNLINKED_LIBRARY_MARKER) {
        return Err(DeployError::ArtifactParsing(format!(
            "`{}` references unlinked libraries",
            name
        )));
    }

    let bytecode: Bytes = build
        .bytecode
        .parse()
        .map_err(|e| DeployError::ArtifactParsing(format!("`{}`: {}", name, e)))?;

    // Interfaces and abstract contracts compile to empty bytecode
    if bytecode.is_empty() {
        return Err(DeployError::ArtifactParsing(format!(
            "`{}` has no creation bytecode",
            name
        )));
    }

    Ok(Artifact {
        contract_name: build.contract_name,
        bytecode,
    })
}
