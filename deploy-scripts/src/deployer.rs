//! Submission of deployment transactions and confirmation of their results

use std::{future::Future, time::Duration};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use tracing::{debug, info};

use crate::{
    constants::RECEIPT_POLL_INTERVAL_MS,
    errors::DeployError,
    solidity::encode_deploy_code,
    types::{ArgValue, Artifact},
};

/// A service that deploys contracts to a ledger
pub trait ContractDeployer {
    /// Deploys the artifact with the given constructor arguments, resolving
    /// to the new contract's address once the deployment is confirmed.
    ///
    /// Fails with [`DeployError::DeploymentFailure`] if the transaction
    /// cannot be submitted, reverts, or does not confirm in time.
    fn deploy(
        &self,
        artifact: &Artifact,
        args: &[ArgValue],
    ) -> impl Future<Output = Result<Address, DeployError>> + Send;
}

/// A deployer submitting creation transactions through an alloy provider.
///
/// Signing, nonce management and gas estimation are left to the provider's
/// wallet and fillers.
#[derive(Clone)]
pub struct AlloyDeployer {
    /// The signing provider
    provider: DynProvider,
    /// The number of confirmations to wait for
    confirmations: u64,
    /// How long to wait for confirmation
    timeout: Duration,
    /// How often to poll for the receipt
    poll_interval: Duration,
}

impl AlloyDeployer {
    /// Creates a deployer over the given provider
    pub fn new(provider: DynProvider, confirmations: u64, timeout: Duration) -> Self {
        AlloyDeployer {
            provider,
            confirmations,
            timeout,
            poll_interval: Duration::from_millis(RECEIPT_POLL_INTERVAL_MS),
        }
    }

    /// Sets how often the deployer polls for a receipt
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Polls until the transaction is mined and buried under the required
    /// number of confirmations
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, DeployError> {
        let rpc_err =
            |e: TransportError| DeployError::DeploymentFailure(format!("tx {:#x}: {}", tx_hash, e));

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(rpc_err)?;

            if let Some(receipt) = receipt {
                if self.confirmations <= 1 {
                    return Ok(receipt);
                }
                if let Some(mined) = receipt.block_number {
                    let head = self.provider.get_block_number().await.map_err(rpc_err)?;
                    let depth = (head + 1).saturating_sub(mined);
                    if depth >= self.confirmations {
                        return Ok(receipt);
                    }
                    debug!(
                        "tx {:#x} has {}/{} confirmations",
                        tx_hash, depth, self.confirmations
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Extracts the deployed address from a confirmed receipt
fn deployed_address(tx_hash: TxHash, receipt: &TransactionReceipt) -> Result<Address, DeployError> {
    if !receipt.status() {
        return Err(DeployError::DeploymentFailure(format!("tx {:#x} reverted", tx_hash)));
    }

    receipt.contract_address.ok_or_else(|| {
        DeployError::DeploymentFailure(format!(
            "receipt for tx {:#x} has no contract address",
            tx_hash
        ))
    })
}

impl ContractDeployer for AlloyDeployer {
    async fn deploy(&self, artifact: &Artifact, args: &[ArgValue]) -> Result<Address, DeployError> {
        let code = encode_deploy_code(artifact, args)?;
        let tx = TransactionRequest::default().with_deploy_code(code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployError::DeploymentFailure(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        info!("{} deployment submitted in tx {:#x}", artifact.name, tx_hash);

        let receipt = tokio::time::timeout(self.timeout, self.wait_for_receipt(tx_hash))
            .await
            .map_err(|_| {
                DeployError::DeploymentFailure(format!(
                    "tx {:#x} not confirmed within {}s",
                    tx_hash,
                    self.timeout.as_secs()
                ))
            })??;

        deployed_address(tx_hash, &receipt)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        json_abi::JsonAbi,
        primitives::{Bloom, Bytes, B256},
        providers::{mock::Asserter, ProviderBuilder},
    };
    use serde_json::{json, Value};

    use super::*;

    /// The hash the mocked node returns for every submission
    const TX_HASH: B256 = B256::repeat_byte(0xab);

    /// A deployer over a mocked node answering from the asserter's queue
    fn deployer(asserter: &Asserter, confirmations: u64, timeout: Duration) -> AlloyDeployer {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased();
        AlloyDeployer::new(provider, confirmations, timeout)
            .with_poll_interval(Duration::from_millis(1))
    }

    /// An artifact with no constructor
    fn artifact() -> Artifact {
        Artifact {
            name: "dUSDT".to_string(),
            abi: JsonAbi::default(),
            bytecode: Bytes::from(vec![0x60, 0x80]),
        }
    }

    /// A receipt for a creation transaction mined in block 0x10
    fn receipt(success: bool, contract_address: Option<Address>) -> Value {
        json!({
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x11),
            "blockNumber": "0x10",
            "from": Address::repeat_byte(0x22),
            "to": null,
            "contractAddress": contract_address,
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [],
            "logsBloom": Bloom::ZERO,
            "type": "0x2",
            "status": if success { "0x1" } else { "0x0" },
        })
    }

    #[tokio::test]
    async fn test_deploy_returns_contract_address() {
        let asserter = Asserter::new();
        let address = Address::repeat_byte(0x42);
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(true, Some(address)));

        let deployed = deployer(&asserter, 1, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap();
        assert_eq!(deployed, address);
    }

    #[tokio::test]
    async fn test_reverted_deployment_fails() {
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(false, Some(Address::repeat_byte(0x42))));

        let err = deployer(&asserter, 1, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap_err();
        match err {
            DeployError::DeploymentFailure(msg) => assert!(msg.contains("reverted")),
            other => panic!("expected a deployment failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receipt_without_contract_address_fails() {
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        asserter.push_success(&receipt(true, None));

        let err = deployer(&asserter, 1, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap_err();
        match err {
            DeployError::DeploymentFailure(msg) => assert!(msg.contains("no contract address")),
            other => panic!("expected a deployment failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_submission_fails() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("insufficient funds for gas");

        let err = deployer(&asserter, 1, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::DeploymentFailure(_)));
    }

    #[tokio::test]
    async fn test_waits_for_pending_receipt() {
        let asserter = Asserter::new();
        let address = Address::repeat_byte(0x42);
        asserter.push_success(&TX_HASH);
        asserter.push_success(&Value::Null);
        asserter.push_success(&Value::Null);
        asserter.push_success(&receipt(true, Some(address)));

        let deployed = deployer(&asserter, 1, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap();
        assert_eq!(deployed, address);
    }

    #[tokio::test]
    async fn test_waits_for_confirmations() {
        let asserter = Asserter::new();
        let address = Address::repeat_byte(0x42);
        asserter.push_success(&TX_HASH);
        // Mined in 0x10, head at 0x11: two of three confirmations
        asserter.push_success(&receipt(true, Some(address)));
        asserter.push_success(&"0x11");
        asserter.push_success(&receipt(true, Some(address)));
        asserter.push_success(&"0x12");

        let deployed = deployer(&asserter, 3, Duration::from_secs(5))
            .deploy(&artifact(), &[])
            .await
            .unwrap();
        assert_eq!(deployed, address);
    }

    #[tokio::test]
    async fn test_unconfirmed_deployment_times_out() {
        let asserter = Asserter::new();
        asserter.push_success(&TX_HASH);
        for _ in 0..10_000 {
            asserter.push_success(&Value::Null);
        }

        let err = deployer(&asserter, 1, Duration::from_millis(50))
            .deploy(&artifact(), &[])
            .await
            .unwrap_err();
        match err {
            DeployError::DeploymentFailure(msg) => assert!(msg.contains("not confirmed")),
            other => panic!("expected a deployment failure, got {:?}", other),
        }
    }
}
