//! Sequential execution of a deployment plan.
//!
//! Steps run strictly in plan order, each awaiting confirmation before the
//! next begins, since later constructor arguments may carry the addresses of
//! earlier deployments. The first failure halts the plan; instances already
//! deployed are returned with the error, as ledger deployments cannot be
//! rolled back.

use alloy::primitives::Address;
use tracing::{error, info, warn};

use crate::{
    deployer::ContractDeployer,
    errors::{DeployError, RunError},
    plan::{Argument, DeploymentPlan, PlanStep},
    registry::ArtifactRegistry,
    solidity::encode_deploy_code,
    types::{ArgValue, DeployedInstance},
};

/// Executes deployment plans against a registry / deployer pair
pub struct Orchestrator<R, D> {
    /// Resolves contract names to artifacts
    registry: R,
    /// Submits and confirms deployments
    deployer: D,
}

impl<R: ArtifactRegistry, D: ContractDeployer> Orchestrator<R, D> {
    /// Creates an orchestrator over the given collaborators
    pub fn new(registry: R, deployer: D) -> Self {
        Orchestrator { registry, deployer }
    }

    /// Executes every enabled step of the plan, in order.
    ///
    /// The plan is validated up front, so a malformed plan fails before any
    /// transaction is submitted. On success, returns one instance per enabled
    /// step, in plan order.
    pub async fn run(&self, plan: &DeploymentPlan) -> Result<Vec<DeployedInstance>, RunError> {
        self.run_with(plan, |_| {}).await
    }

    /// Executes the plan as [`Orchestrator::run`] does, handing each
    /// instance to `on_deployed` as soon as it is confirmed
    pub async fn run_with(
        &self,
        plan: &DeploymentPlan,
        mut on_deployed: impl FnMut(&DeployedInstance),
    ) -> Result<Vec<DeployedInstance>, RunError> {
        plan.validate()?;

        let mut deployed: Vec<DeployedInstance> = Vec::new();
        for (index, step) in plan.steps.iter().enumerate() {
            if !step.enabled {
                warn!("Skipping disabled step {} ({})", index, step.alias());
                continue;
            }

            info!("Deploying step {} ({})", index, step.alias());
            match self.execute_step(step, &deployed).await {
                Ok(instance) => {
                    info!("{} deployed at {:#x}", instance.alias, instance.address);
                    on_deployed(&instance);
                    deployed.push(instance);
                }
                Err(e) => {
                    error!("Step {} ({}) failed: {}", index, step.alias(), e);
                    return Err(RunError {
                        index,
                        alias: step.alias().to_string(),
                        contract: step.contract.clone(),
                        error: e,
                        deployed,
                    });
                }
            }
        }

        Ok(deployed)
    }

    /// Resolves a step's arguments and artifact, then deploys it
    async fn execute_step(
        &self,
        step: &PlanStep,
        deployed: &[DeployedInstance],
    ) -> Result<DeployedInstance, DeployError> {
        let args = resolve_step_args(step, |alias| {
            deployed
                .iter()
                .find(|instance| instance.alias == alias)
                .map(|instance| instance.address)
        })?;
        let artifact = self.registry.resolve(&step.contract)?;
        let address = self.deployer.deploy(&artifact, &args).await?;

        Ok(DeployedInstance {
            alias: step.alias().to_string(),
            contract: step.contract.clone(),
            address,
        })
    }
}

/// Checks a plan without deploying anything: validates it, resolves every
/// enabled step's artifact, and encodes its constructor arguments.
///
/// References are substituted with placeholder addresses, so this catches
/// arity and type mismatches but says nothing about the deployed contracts.
pub fn dry_run(plan: &DeploymentPlan, registry: &impl ArtifactRegistry) -> Result<(), RunError> {
    plan.validate()?;

    for (index, step) in plan.enabled_steps() {
        let check = || {
            let args = resolve_step_args(step, |_| Some(Address::ZERO))?;
            let artifact = registry.resolve(&step.contract)?;
            encode_deploy_code(&artifact, &args).map(|code| code.len())
        };

        match check() {
            Ok(len) => info!(
                "Step {} ({}): {} bytes of creation code",
                index,
                step.alias(),
                len
            ),
            Err(e) => {
                return Err(RunError {
                    index,
                    alias: step.alias().to_string(),
                    contract: step.contract.clone(),
                    error: e,
                    deployed: Vec::new(),
                })
            }
        }
    }

    Ok(())
}

/// Substitutes each reference in the step's arguments with the address
/// returned by `lookup`; literals pass through unchanged
pub fn resolve_step_args(
    step: &PlanStep,
    lookup: impl Fn(&str) -> Option<Address>,
) -> Result<Vec<ArgValue>, DeployError> {
    step.args
        .iter()
        .map(|arg| resolve_arg(step, arg, &lookup))
        .collect()
}

/// Resolves a single, possibly nested, argument
fn resolve_arg(
    step: &PlanStep,
    arg: &Argument,
    lookup: &impl Fn(&str) -> Option<Address>,
) -> Result<ArgValue, DeployError> {
    match arg {
        Argument::Reference(r) => {
            lookup(&r.alias)
                .map(ArgValue::Address)
                .ok_or_else(|| DeployError::UnresolvedReference {
                    step: step.alias().to_string(),
                    reference: r.alias.clone(),
                })
        }
        Argument::List(items) => items
            .iter()
            .map(|item| resolve_arg(step, item, lookup))
            .collect::<Result<Vec<_>, _>>()
            .map(ArgValue::List),
        Argument::Literal(value) => Ok(ArgValue::Literal(value.clone())),
    }
}
