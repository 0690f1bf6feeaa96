//! Constants used in the deploy scripts

/// The default path of the deployment plan
pub const DEFAULT_PLAN_PATH: &str = "plans/delnorte.json";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The default RPC URL, a local Anvil / Ganache node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The number of confirmations to wait for each contract deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The number of seconds to wait for a deployment to confirm before
/// considering it failed
pub const DEPLOY_TIMEOUT_SECS: u64 = 120;

/// The number of milliseconds between polls for a deployment receipt
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// The key under which deployed addresses are written in the deployments file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The key under which a reference argument names the step it points to
pub const REFERENCE_KEY: &str = "ref";

/// The substring marking an unlinked library placeholder in artifact bytecode
pub const LINK_PLACEHOLDER_MARKER: &str = "__";

/// The number of spaces to indent the deployments file with
pub const DEPLOYMENTS_FILE_INDENT: u16 = 4;
