//! Type definitions used throughout the deploy scripts

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, Bytes},
};
use serde_json::Value;

/// A compiled contract, as resolved from the artifact registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The name the artifact was resolved under
    pub name: String,
    /// The contract's ABI, used to encode constructor arguments
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

/// A constructor argument after references to earlier deployments
/// have been substituted with their addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// The address of a contract deployed earlier in the plan
    Address(Address),
    /// A literal, passed through as written in the plan
    Literal(Value),
    /// A list whose elements may themselves be addresses or literals
    List(Vec<ArgValue>),
}

/// A contract instance whose deployment has been confirmed on-chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedInstance {
    /// The alias of the plan step that produced this instance
    pub alias: String,
    /// The name of the deployed contract
    pub contract: String,
    /// The address at which the contract was deployed
    pub address: Address,
}
