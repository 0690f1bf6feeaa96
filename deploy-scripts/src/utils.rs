//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use json::JsonValue;
use tracing::info;

use crate::{
    constants::{DEPLOYMENTS_FILE_INDENT, DEPLOYMENTS_KEY},
    errors::DeployError,
    types::DeployedInstance,
};

/// Sets up a signing provider for the given private key and RPC url,
/// checking that the node is reachable
pub async fn setup_client(priv_key: &str, rpc_url: &str) -> Result<DynProvider, DeployError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    let url = Url::parse(rpc_url).map_err(|e| DeployError::ClientInitialization(e.to_string()))?;

    let provider = DynProvider::new(ProviderBuilder::new().wallet(signer.clone()).connect_http(url));

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    info!(
        "Connected to chain {} at {} as {:#x}",
        chain_id,
        rpc_url,
        signer.address()
    );

    Ok(provider)
}

/// Reads and parses the JSON file at the given path
pub fn get_json_from_file(file_path: &Path) -> Result<JsonValue, DeployError> {
    let file_contents = fs::read_to_string(file_path)
        .map_err(|e| DeployError::ReadFile(format!("{}: {}", file_path.display(), e)))?;

    json::parse(&file_contents).map_err(|e| DeployError::ReadFile(e.to_string()))
}

/// Records the deployed instances in the deployments file, keyed by alias.
///
/// Entries already in the file are kept unless overwritten by an instance
/// with the same alias.
pub fn write_deployments(
    file_path: &Path,
    deployed: &[DeployedInstance],
) -> Result<(), DeployError> {
    let mut parsed_json = if file_path.exists() {
        get_json_from_file(file_path)?
    } else {
        JsonValue::new_object()
    };

    for instance in deployed {
        parsed_json[DEPLOYMENTS_KEY][instance.alias.as_str()] =
            JsonValue::String(format!("{:#x}", instance.address));
    }

    fs::write(
        file_path,
        json::stringify_pretty(parsed_json, DEPLOYMENTS_FILE_INDENT),
    )
    .map_err(|e| DeployError::WriteFile(e.to_string()))?;

    Ok(())
}
