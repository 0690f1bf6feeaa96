//! Implementations of the deploy script commands

use std::{path::Path, slice, time::Duration};

use tracing::{error, info, warn};

use crate::{
    cli::DeployArgs,
    deployer::AlloyDeployer,
    errors::DeployError,
    orchestrator::{dry_run, Orchestrator},
    plan::DeploymentPlan,
    registry::FsArtifactRegistry,
    types::DeployedInstance,
    utils::{setup_client, write_deployments},
};

/// Deploys every enabled step of the plan, recording each address in the
/// deployments file as soon as its deployment is confirmed
pub async fn deploy(
    args: DeployArgs,
    plan: &DeploymentPlan,
    registry: FsArtifactRegistry,
) -> Result<(), DeployError> {
    let provider = setup_client(&args.priv_key, &args.rpc_url).await?;
    let deployer = AlloyDeployer::new(
        provider,
        args.confirmations,
        Duration::from_secs(args.timeout_secs),
    );
    let orchestrator = Orchestrator::new(registry, deployer);

    let record = |instance: &DeployedInstance| {
        if let Some(path) = &args.deployments_path {
            record_deployment(path, instance);
        }
    };

    let (deployed, result) = match orchestrator.run_with(plan, record).await {
        Ok(deployed) => (deployed, Ok(())),
        Err(e) => {
            error!("{}", e);
            (e.deployed.clone(), Err(e.into()))
        }
    };

    report(&deployed);
    result
}

/// Appends a confirmed deployment to the deployments file. A failed write is
/// logged, not returned.
fn record_deployment(path: &Path, instance: &DeployedInstance) {
    match write_deployments(path, slice::from_ref(instance)) {
        Ok(()) => info!("{} recorded in {}", instance.alias, path.display()),
        Err(e) => warn!(
            "Failed to record {} at {:#x} in {}: {}",
            instance.alias,
            instance.address,
            path.display(),
            e
        ),
    }
}

/// Checks the plan against the artifacts without sending any transactions
pub fn check(plan: &DeploymentPlan, registry: &FsArtifactRegistry) -> Result<(), DeployError> {
    if let Err(e) = dry_run(plan, registry) {
        error!("{}", e);
        return Err(e.into());
    }
    info!(
        "Plan is valid: {} of {} step(s) enabled",
        plan.enabled_steps().count(),
        plan.steps.len()
    );
    Ok(())
}

/// Logs the deployed instances
fn report(deployed: &[DeployedInstance]) {
    if deployed.is_empty() {
        info!("No contracts deployed");
        return;
    }
    for instance in deployed {
        info!(
            "{} ({}) deployed at {:#x}",
            instance.alias, instance.contract, instance.address
        );
    }
}
