//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{check, deploy},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_PLAN_PATH, DEFAULT_RPC_URL, DEPLOY_TIMEOUT_SECS,
        NUM_DEPLOY_CONFIRMATIONS,
    },
    errors::DeployError,
    plan::DeploymentPlan,
    registry::FsArtifactRegistry,
};

/// Deploy a set of contracts in dependency order, threading the addresses
/// of earlier deployments into the constructors of later ones
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON deployment plan
    #[arg(short, long, env = "PLAN_PATH", default_value = DEFAULT_PLAN_PATH)]
    pub plan: PathBuf,

    /// Directory holding the compiled contract artifacts, one `<Name>.json` per contract
    #[arg(short, long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands supported by the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every enabled step of the plan
    Deploy(DeployArgs),
    /// Validate the plan and encode every enabled step without deploying
    Check,
}

/// Deploy the plan to a network
#[derive(Args)]
pub struct DeployArgs {
    /// Private key of the deployer
    #[arg(long, env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Number of confirmations to wait for on each deployment
    #[arg(short, long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Seconds to wait for each deployment to confirm
    #[arg(short, long, default_value_t = DEPLOY_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// File to record deployed addresses in, also written when the plan
    /// fails partway
    #[arg(short, long)]
    pub deployments_path: Option<PathBuf>,
}

impl Command {
    /// Runs the command against the given plan and artifacts
    pub async fn run(
        self,
        plan: &DeploymentPlan,
        registry: FsArtifactRegistry,
    ) -> Result<(), DeployError> {
        match self {
            Command::Deploy(args) => deploy(args, plan, registry).await,
            Command::Check => check(plan, &registry),
        }
    }
}
