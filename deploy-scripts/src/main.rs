use clap::Parser;
use deploy_scripts::{
    cli::Cli, errors::DeployError, plan::DeploymentPlan, registry::FsArtifactRegistry,
};

#[tokio::main]
async fn main() -> Result<(), DeployError> {
    let Cli {
        plan,
        artifacts_dir,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let plan = DeploymentPlan::from_file(&plan)?;
    let registry = FsArtifactRegistry::new(artifacts_dir);

    command.run(&plan, registry).await
}
