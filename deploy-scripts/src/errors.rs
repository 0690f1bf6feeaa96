//! Definitions of errors that can occur during deployment of the contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::types::DeployedInstance;

/// Errors that can occur while loading, validating, or executing a deployment plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The registry has no artifact for the named contract
    RegistryLookup(String),
    /// A step references an address that has not been produced by an earlier,
    /// enabled step
    UnresolvedReference {
        /// The alias of the step holding the reference
        step: String,
        /// The alias being referenced
        reference: String,
    },
    /// The deployment transaction failed, reverted, or timed out
    DeploymentFailure(String),
    /// Error reading a file
    ReadFile(String),
    /// Error writing a file
    WriteFile(String),
    /// Error parsing the deployment plan
    PlanParsing(String),
    /// The plan is not well-formed, independent of references
    InvalidPlan(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error encoding constructor arguments against the artifact's ABI
    ArgumentEncoding(String),
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::RegistryLookup(s) => write!(f, "error resolving artifact: {}", s),
            DeployError::UnresolvedReference { step, reference } => write!(
                f,
                "unresolved reference: step `{}` references `{}`, which has not been deployed",
                step, reference
            ),
            DeployError::DeploymentFailure(s) => write!(f, "error deploying contract: {}", s),
            DeployError::ReadFile(s) => write!(f, "error reading file: {}", s),
            DeployError::WriteFile(s) => write!(f, "error writing file: {}", s),
            DeployError::PlanParsing(s) => write!(f, "error parsing plan: {}", s),
            DeployError::InvalidPlan(s) => write!(f, "invalid plan: {}", s),
            DeployError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            DeployError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            DeployError::ArgumentEncoding(s) => {
                write!(f, "error encoding constructor arguments: {}", s)
            }
        }
    }
}

impl Error for DeployError {}

/// A failed plan execution.
///
/// Identifies the step that triggered the failure and carries every instance
/// confirmed before it, since ledger deployments cannot be rolled back.
#[derive(Debug, Clone)]
pub struct RunError {
    /// Zero-based index of the failing step within the plan
    pub index: usize,
    /// Alias of the failing step
    pub alias: String,
    /// Contract name of the failing step
    pub contract: String,
    /// The underlying error
    pub error: DeployError,
    /// Instances deployed before the failure, in plan order
    pub deployed: Vec<DeployedInstance>,
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} (`{}`, contract {}) failed after {} deployment(s): {}",
            self.index,
            self.alias,
            self.contract,
            self.deployed.len(),
            self.error
        )
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl From<RunError> for DeployError {
    fn from(e: RunError) -> Self {
        e.error
    }
}
