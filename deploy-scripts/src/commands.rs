//! Implementations of the various deploy scripts

use itertools::Itertools;
use tracing::info;

use crate::{
    cli::{DeployArgs, MigrateArgs, PlanArgs, ScriptEnv},
    controller,
    errors::DeployError,
    migration::{MigrationPlan, MigrationReport, Migrator},
    registry::{RecordedAddress, Registry},
    steps::MigrationStep,
};

/// Run the selected migration steps
pub async fn migrate(args: MigrateArgs, env: &ScriptEnv) -> Result<(), DeployError> {
    let plan = args.selection.plan();
    if args.dry_run {
        return dry_run(&plan, env);
    }

    run_plan(&plan, env).await.map(|_| ())
}

/// Deploy a single contract
pub async fn deploy(args: DeployArgs, env: &ScriptEnv) -> Result<(), DeployError> {
    let plan = MigrationPlan::with_enabled([MigrationStep::Deploy(args.contract)]);
    run_plan(&plan, env).await.map(|_| ())
}

/// Print the plan for the selected steps
pub fn show_plan(args: PlanArgs, env: &ScriptEnv) -> Result<(), DeployError> {
    let registry = env.load_registry()?;
    println!("{}", render_plan(&args.selection.plan(), &registry));
    Ok(())
}

/// Bind the recorded Comptroller to the recorded Unitroller
pub async fn bind_controller(env: &ScriptEnv) -> Result<(), DeployError> {
    let registry = env.load_registry()?;
    let deployer = env.connect().await?;
    controller::bind_controller(&deployer, &registry).await
}

/// Apply the configured risk parameters through the Unitroller
pub async fn configure_controller(env: &ScriptEnv) -> Result<(), DeployError> {
    let config = env.load_config()?;
    let registry = env.load_registry()?;
    let deployer = env.connect().await?;
    controller::configure_controller(&deployer, &registry, &config).await
}

/// Preflight a plan and print it, without connecting to the network
fn dry_run(plan: &MigrationPlan, env: &ScriptEnv) -> Result<(), DeployError> {
    env.load_config()?;
    let registry = env.load_registry()?;
    let prepared = plan.preflight(&registry, &env.artifact_source())?;

    println!("{}", render_plan(plan, &registry));
    info!("Dry run passed, {} steps would run", prepared.steps.len());
    Ok(())
}

/// Run a plan against the network, persisting the registry as it goes
async fn run_plan(plan: &MigrationPlan, env: &ScriptEnv) -> Result<MigrationReport, DeployError> {
    let config = env.load_config()?;
    let registry = env.load_registry()?;
    let artifacts = env.artifact_source();
    // Fail on a bad artifact or missing dependency before asking for a key
    let prepared = plan.preflight(&registry, &artifacts)?;

    let deployer = env.connect().await?;
    let mut migrator =
        Migrator::new(&config, &artifacts, &deployer, registry).persist_to(env.deployments_path());
    let report = migrator.execute(prepared).await?;

    for (contract, address) in &report.deployed {
        info!("{:<24} {address:#x}", contract.registry_key());
    }
    Ok(report)
}

/// Render one line per step: whether it runs, what it needs and what is recorded
pub fn render_plan(plan: &MigrationPlan, registry: &Registry) -> String {
    plan.steps()
        .iter()
        .enumerate()
        .map(|(i, planned)| {
            let marker = if planned.enabled { "x" } else { " " };
            let requires = planned.step.requires().iter().map(|c| c.registry_key()).join(", ");
            let recorded = match planned.step.produces() {
                Some(contract) => registry
                    .get(contract)
                    .map(|r: RecordedAddress| r.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                None => String::new(),
            };

            format!(
                "{}. [{}] {:<28} requires: [{}] {}",
                i + 1,
                marker,
                planned.step.to_string(),
                requires,
                recorded
            )
            .trim_end()
            .to_string()
        })
        .join("\n")
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::render_plan;
    use crate::{migration::MigrationPlan, registry::Registry, steps::Contract};

    #[test]
    fn test_render_default_plan() {
        let mut registry = Registry::default();
        registry.record(Contract::Comptroller, Address::with_last_byte(3));
        registry.mark_pending(Contract::MarketImmutable);

        let rendered = render_plan(&MigrationPlan::default(), &registry);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("1. [ ] deploy token"));
        assert!(lines[2].starts_with("3. [x] deploy comptroller"));
        assert!(lines[2].ends_with(&format!("{:#x}", Address::with_last_byte(3))));
        assert!(lines[6].contains("requires: [Unitroller, Comptroller]"));
        assert!(lines[8].ends_with("<pending>"));
    }
}
