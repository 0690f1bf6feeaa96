//! Resolution of contract names to compiled artifacts

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::hex};
use serde::Deserialize;

use crate::{
    constants::{ARTIFACT_EXTENSION, LINK_PLACEHOLDER_MARKER},
    errors::DeployError,
    types::Artifact,
};

/// A source of deployable contract artifacts, keyed by contract name
pub trait ArtifactRegistry {
    /// Resolves the named contract, failing with
    /// [`DeployError::RegistryLookup`] if it is unknown
    fn resolve(&self, name: &str) -> Result<Artifact, DeployError>;
}

/// A registry backed by a directory of compiler output, one
/// `<Name>.json` file per contract.
///
/// Both Truffle (`"bytecode": "0x.."`) and Forge
/// (`"bytecode": { "object": "0x.." }`) artifact layouts are understood.
#[derive(Debug, Clone)]
pub struct FsArtifactRegistry {
    /// The directory holding the artifacts
    dir: PathBuf,
}

impl FsArtifactRegistry {
    /// Creates a registry reading artifacts from the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsArtifactRegistry { dir: dir.into() }
    }

    /// The path at which the named contract's artifact is expected
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, ARTIFACT_EXTENSION))
    }
}

impl ArtifactRegistry for FsArtifactRegistry {
    fn resolve(&self, name: &str) -> Result<Artifact, DeployError> {
        let path = self.artifact_path(name);
        if !path.is_file() {
            return Err(DeployError::RegistryLookup(format!(
                "no artifact for {} at {}",
                name,
                path.display()
            )));
        }

        read_artifact(name, &path)
    }
}

/// The subset of a compilation artifact needed for deployment
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: RawBytecode,
}

/// Creation bytecode in either of the supported layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Truffle: a bare hex string
    Hex(String),
    /// Forge: an object holding the hex string
    Object {
        /// The hex-encoded bytecode
        object: String,
    },
}

/// Reads and parses the artifact at the given path
fn read_artifact(name: &str, path: &Path) -> Result<Artifact, DeployError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DeployError::ReadFile(format!("{}: {}", path.display(), e)))?;
    parse_artifact(name, &contents)
}

/// Parses an artifact from its JSON contents
pub fn parse_artifact(name: &str, contents: &str) -> Result<Artifact, DeployError> {
    let raw: RawArtifact = serde_json::from_str(contents)
        .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", name, e)))?;

    let hex_code = match raw.bytecode {
        RawBytecode::Hex(s) | RawBytecode::Object { object: s } => s,
    };
    if hex_code.contains(LINK_PLACEHOLDER_MARKER) {
        return Err(DeployError::ArtifactParsing(format!(
            "{} has unlinked library references",
            name
        )));
    }

    let bytecode = hex::decode(hex_code.trim())
        .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", name, e)))?;
    if bytecode.is_empty() {
        return Err(DeployError::ArtifactParsing(format!(
            "{} has no bytecode, it may be abstract or an interface",
            name
        )));
    }

    Ok(Artifact {
        name: name.to_string(),
        abi: raw.abi,
        bytecode: bytecode.into(),
    })
}
