//! The ordered migration plan and the sequential runner that executes it

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use alloy::primitives::Address;
use tracing::{debug, info, warn};

use crate::{
    artifacts::{Artifact, ArtifactSource},
    config::MigrationConfig,
    controller::bind_controller,
    deployer::Deployer,
    errors::DeployError,
    registry::{RecordedAddress, Registry},
    steps::{Contract, MigrationStep, StepKind},
};

/// Every step of the migration, in the order it must run
pub const MIGRATION_ORDER: [MigrationStep; 9] = [
    MigrationStep::Deploy(Contract::Token),
    MigrationStep::Deploy(Contract::Unitroller),
    MigrationStep::Deploy(Contract::Comptroller),
    MigrationStep::Deploy(Contract::PriceOracle),
    MigrationStep::Deploy(Contract::InterestRateModel),
    MigrationStep::Deploy(Contract::MarketDelegate),
    MigrationStep::BindController,
    MigrationStep::Deploy(Contract::MarketDelegator),
    MigrationStep::Deploy(Contract::MarketImmutable),
];

/// The steps enabled when no explicit selection is made: the rest of the
/// suite is already live, only the Comptroller gets (re)deployed
pub const DEFAULT_ENABLED_STEPS: [MigrationStep; 1] =
    [MigrationStep::Deploy(Contract::Comptroller)];

// --------
// | Plan |
// --------

/// A step in the plan, along with whether it runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedStep {
    /// The step
    pub step: MigrationStep,
    /// Whether the step runs, disabled steps rely on the registry instead
    pub enabled: bool,
}

/// An enabled step, ready to run
#[derive(Clone, Debug)]
pub enum ResolvedStep {
    /// Deploy a contract from its resolved artifact
    Deploy {
        /// The contract to deploy
        contract: Contract,
        /// Its compiled artifact
        artifact: Artifact,
    },
    /// Bind the Comptroller to the Unitroller
    BindController,
}

impl ResolvedStep {
    /// The step this was resolved from
    pub fn step(&self) -> MigrationStep {
        match self {
            ResolvedStep::Deploy { contract, .. } => MigrationStep::Deploy(*contract),
            ResolvedStep::BindController => MigrationStep::BindController,
        }
    }
}

/// A plan that passed preflight: every artifact resolved and every
/// requirement satisfiable
#[derive(Clone, Debug)]
pub struct PreparedPlan {
    /// The enabled steps, in execution order
    pub steps: Vec<ResolvedStep>,
    /// The disabled steps
    pub skipped: Vec<MigrationStep>,
}

/// An ordered list of steps, each enabled or disabled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    /// The steps, in execution order
    steps: Vec<PlannedStep>,
}

impl Default for MigrationPlan {
    fn default() -> Self {
        Self::with_enabled(DEFAULT_ENABLED_STEPS)
    }
}

impl MigrationPlan {
    /// The full migration order with exactly the given steps enabled
    pub fn with_enabled(enabled: impl IntoIterator<Item = MigrationStep>) -> Self {
        let enabled: HashSet<MigrationStep> = enabled.into_iter().collect();
        let steps = MIGRATION_ORDER
            .into_iter()
            .map(|step| PlannedStep {
                step,
                enabled: enabled.contains(&step),
            })
            .collect();

        Self { steps }
    }

    /// The full migration order with the steps selected on the command line enabled
    pub fn from_kinds(kinds: &[StepKind]) -> Self {
        Self::with_enabled(kinds.iter().copied().map(MigrationStep::from))
    }

    /// The full migration order with every step enabled
    pub fn all() -> Self {
        Self::with_enabled(MIGRATION_ORDER)
    }

    /// The steps of the plan, in execution order
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// The enabled steps, in execution order
    pub fn enabled(&self) -> impl Iterator<Item = MigrationStep> + '_ {
        self.steps.iter().filter(|s| s.enabled).map(|s| s.step)
    }

    /// Check that the plan can run against the given registry, before any
    /// transaction is sent.
    ///
    /// Every enabled deployment's artifact must resolve, and every
    /// requirement must be either recorded or produced by an earlier enabled step.
    pub fn preflight(
        &self,
        registry: &Registry,
        artifacts: &impl ArtifactSource,
    ) -> Result<PreparedPlan, DeployError> {
        let mut available: HashSet<Contract> = registry
            .iter()
            .filter(|(_, recorded)| matches!(recorded, RecordedAddress::Deployed(_)))
            .map(|(contract, _)| contract)
            .collect();

        let mut steps = Vec::new();
        for step in self.enabled() {
            if let Some(dep) = step.requires().iter().find(|dep| !available.contains(dep)) {
                return Err(DeployError::MissingDependency {
                    dependency: dep.registry_key(),
                    reason: format!(
                        "required by `{}` but neither recorded nor deployed earlier",
                        step
                    ),
                });
            }

            let resolved = match step {
                MigrationStep::Deploy(contract) => ResolvedStep::Deploy {
                    contract,
                    artifact: artifacts.resolve(contract.artifact_name())?,
                },
                MigrationStep::BindController => ResolvedStep::BindController,
            };

            if let Some(contract) = step.produces() {
                available.insert(contract);
            }
            steps.push(resolved);
        }

        let skipped = self.steps.iter().filter(|s| !s.enabled).map(|s| s.step).collect();
        Ok(PreparedPlan { steps, skipped })
    }
}

// ----------
// | Runner |
// ----------

/// The outcome of a migration run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The contracts deployed by the run, in order
    pub deployed: Vec<(Contract, Address)>,
    /// Whether the run bound the Comptroller to the Unitroller
    pub controller_bound: bool,
    /// The number of disabled steps
    pub skipped: usize,
}

/// Runs a migration plan step by step, recording produced addresses
pub struct Migrator<'a, A, D> {
    /// The protocol parameters
    config: &'a MigrationConfig,
    /// Where artifacts are resolved from
    artifacts: &'a A,
    /// Where transactions are sent
    deployer: &'a D,
    /// The addresses known so far
    registry: Registry,
    /// The file the registry is written to after every deployment, if any
    deployments_path: Option<PathBuf>,
}

impl<'a, A: ArtifactSource, D: Deployer> Migrator<'a, A, D> {
    /// Create a migrator over the given registry
    pub fn new(
        config: &'a MigrationConfig,
        artifacts: &'a A,
        deployer: &'a D,
        registry: Registry,
    ) -> Self {
        Self {
            config,
            artifacts,
            deployer,
            registry,
            deployments_path: None,
        }
    }

    /// Persist the registry to the given file after every deployment
    pub fn persist_to(mut self, path: impl AsRef<Path>) -> Self {
        self.deployments_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// The registry, including addresses recorded by this migrator
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consume the migrator, returning its registry
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Preflight and run the plan.
    ///
    /// A missing artifact or dependency aborts the run before anything is sent.
    pub async fn run(&mut self, plan: &MigrationPlan) -> Result<MigrationReport, DeployError> {
        let prepared = plan.preflight(&self.registry, self.artifacts)?;
        self.execute(prepared).await
    }

    /// Run a plan that already passed preflight.
    ///
    /// The first failing step aborts the run. Addresses recorded by earlier
    /// steps are kept.
    pub async fn execute(
        &mut self,
        prepared: PreparedPlan,
    ) -> Result<MigrationReport, DeployError> {
        let mut report = MigrationReport {
            skipped: prepared.skipped.len(),
            ..Default::default()
        };

        for step in &prepared.skipped {
            debug!("Skipping disabled step `{}`", step);
        }

        for step in prepared.steps {
            match step {
                ResolvedStep::Deploy { contract, artifact } => {
                    let address = self.deploy(contract, &artifact).await?;
                    report.deployed.push((contract, address));
                }
                ResolvedStep::BindController => {
                    bind_controller(self.deployer, &self.registry).await?;
                    report.controller_bound = true;
                }
            }
        }

        info!(
            "Migration complete: {} deployed, {} skipped",
            report.deployed.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Deploy a single contract and record its address
    async fn deploy(
        &mut self,
        contract: Contract,
        artifact: &Artifact,
    ) -> Result<Address, DeployError> {
        let args = contract.constructor_args(self.config, &self.registry)?;
        info!(
            "Deploying {} from `{}` with {} bytes of constructor arguments",
            contract,
            contract.artifact_name(),
            args.len()
        );

        let address = self.deployer.deploy(artifact, args).await?;
        info!("{} deployed at {address:#x}", contract);

        if let Some(RecordedAddress::Deployed(previous)) = self.registry.record(contract, address)
        {
            warn!("Replaced recorded {} address {previous:#x}", contract);
        }
        if let Some(path) = &self.deployments_path {
            self.registry.save(path)?;
        }

        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes};

    use super::{MigrationPlan, ResolvedStep, MIGRATION_ORDER};
    use crate::{
        artifacts::{Artifact, InMemoryArtifacts},
        errors::DeployError,
        registry::Registry,
        steps::{Contract, MigrationStep, StepKind},
    };

    /// An artifact source resolving every contract in the suite
    fn all_artifacts() -> InMemoryArtifacts {
        let mut artifacts = InMemoryArtifacts::default();
        for contract in Contract::ALL {
            artifacts.insert(
                contract.artifact_name(),
                Artifact {
                    contract_name: contract.to_string(),
                    bytecode: Bytes::from_static(&[0x60, 0x80]),
                },
            );
        }
        artifacts
    }

    #[test]
    fn test_default_plan_enables_only_controller() {
        let plan = MigrationPlan::default();
        assert_eq!(plan.steps().len(), MIGRATION_ORDER.len());
        assert_eq!(
            plan.enabled().collect::<Vec<_>>(),
            vec![MigrationStep::Deploy(Contract::Comptroller)]
        );
    }

    #[test]
    fn test_order_satisfies_dependencies() {
        for (i, step) in MIGRATION_ORDER.iter().enumerate() {
            for dep in step.requires() {
                let producer = MIGRATION_ORDER
                    .iter()
                    .position(|s| s.produces() == Some(*dep))
                    .unwrap();
                assert!(producer < i, "`{step}` runs before its dependency {dep}");
            }
        }
    }

    #[test]
    fn test_preflight_all_from_empty_registry() {
        let prepared =
            MigrationPlan::all().preflight(&Registry::default(), &all_artifacts()).unwrap();

        let steps: Vec<_> = prepared.steps.iter().map(ResolvedStep::step).collect();
        assert_eq!(steps, MIGRATION_ORDER.to_vec());
        assert!(prepared.skipped.is_empty());
    }

    #[test]
    fn test_preflight_missing_dependency() {
        let plan = MigrationPlan::from_kinds(&[StepKind::MarketImmutable]);
        let res = plan.preflight(&Registry::default(), &all_artifacts());

        assert!(matches!(
            res,
            Err(DeployError::MissingDependency { dependency: "Unitroller", .. })
        ));
    }

    #[test]
    fn test_preflight_uses_recorded_addresses() {
        let mut registry = Registry::default();
        registry.record(Contract::Unitroller, Address::with_last_byte(1));
        registry.record(Contract::InterestRateModel, Address::with_last_byte(2));
        registry.mark_pending(Contract::MarketImmutable);

        let plan = MigrationPlan::from_kinds(&[StepKind::Comptroller, StepKind::MarketImmutable]);
        let prepared = plan.preflight(&registry, &all_artifacts()).unwrap();
        assert_eq!(prepared.skipped.len(), MIGRATION_ORDER.len() - 2);

        // A pending entry does not satisfy a requirement
        registry.mark_pending(Contract::Unitroller);
        assert!(plan.preflight(&registry, &all_artifacts()).is_err());
    }

    #[test]
    fn test_preflight_missing_artifact() {
        let plan = MigrationPlan::default();
        let res = plan.preflight(&Registry::default(), &InMemoryArtifacts::default());
        assert!(matches!(res, Err(DeployError::ArtifactNotFound(_))));
    }
}
