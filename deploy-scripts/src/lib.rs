//! Scripts for deploying a set of smart contracts in dependency order.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
mod commands;
pub mod constants;
pub mod deployer;
pub mod errors;
pub mod orchestrator;
pub mod plan;
pub mod registry;
pub mod solidity;
pub mod types;
pub mod utils;
