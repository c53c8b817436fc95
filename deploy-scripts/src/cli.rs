//! Definitions of CLI arguments and commands for the deploy scripts

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::{
    artifacts::ArtifactDir,
    commands::{bind_controller, configure_controller, deploy, migrate, show_plan},
    config::MigrationConfig,
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_RPC_URL, NUM_DEPLOY_CONFIRMATIONS,
    },
    deployer::RpcDeployer,
    errors::DeployError,
    migration::MigrationPlan,
    registry::Registry,
    steps::{Contract, StepKind},
    utils::setup_client,
};

/// Deploy and wire the lending protocol contracts
#[derive(Parser)]
pub struct Cli {
    /// The environment shared by every command
    #[command(flatten)]
    pub env: ScriptEnv,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The environment shared by every command
#[derive(Args, Clone, Debug)]
pub struct ScriptEnv {
    /// Private key of the deployer, only needed by commands that send transactions
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Path to the deployments registry file
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// JSON file overriding the default protocol parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of confirmations to wait for on each transaction
    #[arg(long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,
}

impl ScriptEnv {
    /// Load and validate the protocol parameters
    pub fn load_config(&self) -> Result<MigrationConfig, DeployError> {
        MigrationConfig::load(self.config.as_deref())
    }

    /// Load the deployments registry
    pub fn load_registry(&self) -> Result<Registry, DeployError> {
        Registry::load(&self.deployments)
    }

    /// The path of the deployments registry
    pub fn deployments_path(&self) -> &Path {
        &self.deployments
    }

    /// The artifact source
    pub fn artifact_source(&self) -> ArtifactDir {
        ArtifactDir::new(&self.artifacts)
    }

    /// Connect a signing deployer to the network
    pub async fn connect(&self) -> Result<RpcDeployer, DeployError> {
        let priv_key = self.priv_key.as_deref().ok_or_else(|| {
            DeployError::ClientInitialization(
                "no private key given, pass --priv-key or set PKEY".to_string(),
            )
        })?;

        let provider = setup_client(priv_key, &self.rpc_url).await?;
        Ok(RpcDeployer::new(provider, self.confirmations))
    }
}

/// The commands of the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Run the migration plan
    Migrate(MigrateArgs),
    /// Print the migration plan along with the recorded addresses
    Plan(PlanArgs),
    /// Deploy a single contract, recording its address
    Deploy(DeployArgs),
    /// Bind the recorded Comptroller to the recorded Unitroller
    BindController,
    /// Apply the configured risk parameters through the Unitroller
    ConfigureController,
}

impl Command {
    /// Run the command in the given environment
    pub async fn run(self, env: &ScriptEnv) -> Result<(), DeployError> {
        match self {
            Command::Migrate(args) => migrate(args, env).await,
            Command::Plan(args) => show_plan(args, env),
            Command::Deploy(args) => deploy(args, env).await,
            Command::BindController => bind_controller(env).await,
            Command::ConfigureController => configure_controller(env).await,
        }
    }
}

/// Which migration steps are enabled
#[derive(Args, Clone, Debug, Default)]
pub struct StepSelection {
    /// Comma-separated steps to enable, in any order.
    /// When omitted only the Comptroller is deployed
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    pub steps: Vec<StepKind>,

    /// Enable every step
    #[arg(long)]
    pub all: bool,
}

impl StepSelection {
    /// The plan this selection describes
    pub fn plan(&self) -> MigrationPlan {
        if self.all {
            MigrationPlan::all()
        } else if self.steps.is_empty() {
            MigrationPlan::default()
        } else {
            MigrationPlan::from_kinds(&self.steps)
        }
    }
}

/// Run the migration plan.
///
/// Steps always run in dependency order, whatever order they are given in.
#[derive(Args)]
pub struct MigrateArgs {
    /// The steps to run
    #[command(flatten)]
    pub selection: StepSelection,

    /// Check artifacts and dependencies and print the plan without sending anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Print the migration plan along with the recorded addresses
#[derive(Args)]
pub struct PlanArgs {
    /// The steps to show as enabled
    #[command(flatten)]
    pub selection: StepSelection,
}

/// Deploy a single contract, recording its address
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy
    #[arg(long)]
    pub contract: Contract,
}
