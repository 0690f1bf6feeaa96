//! The deployment plan: an ordered list of contract deployments, some of which
//! may be staged off, whose constructor arguments may reference the addresses
//! of earlier deployments.

use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    constants::REFERENCE_KEY,
    errors::{DeployError, RunError},
};

/// An ordered sequence of deployment steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentPlan {
    /// A human-readable name for the plan
    #[serde(default)]
    pub name: Option<String>,
    /// The steps of the plan, executed in order
    pub steps: Vec<PlanStep>,
}

/// A single contract deployment within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanStep {
    /// The name of the contract, as resolvable by the artifact registry
    pub contract: String,
    /// The key by which later steps reference this step's address.
    /// Defaults to the contract name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Whether the step is deployed when the plan runs
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The constructor arguments, in order
    #[serde(default)]
    pub args: Vec<Argument>,
}

/// Steps are enabled unless explicitly staged off
fn default_enabled() -> bool {
    true
}

/// A constructor argument as written in the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// The address of an earlier step's deployment
    Reference(Reference),
    /// A list of arguments, which may contain references
    List(Vec<Argument>),
    /// Any other JSON value, passed through unchanged
    Literal(Value),
}

/// A reference to the deployed address of an earlier step, written
/// `{ "ref": "<alias>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// The alias of the referenced step
    #[serde(rename = "ref")]
    pub alias: String,
}

impl TryFrom<Value> for Argument {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Argument::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Argument::List),
            Value::Object(map) if map.len() == 1 && map.contains_key(REFERENCE_KEY) => {
                match &map[REFERENCE_KEY] {
                    Value::String(alias) => Ok(Argument::reference(alias.clone())),
                    other => Err(format!(
                        "`{}` must name a step alias as a string, got {}",
                        REFERENCE_KEY, other
                    )),
                }
            }
            // Integers beyond 64 bits only survive as f64, which loses precision
            Value::Number(n) if !n.is_u64() && !n.is_i64() => Err(format!(
                "numeric literal {} is not a 64-bit integer; write it as a decimal string",
                n
            )),
            other => Ok(Argument::Literal(other)),
        }
    }
}

// Arrays are always lists and a reference is exactly a single-key object, so
// the shape of the JSON decides the variant
impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Argument::try_from(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

impl Argument {
    /// Builds a reference argument to the step with the given alias
    pub fn reference(alias: impl Into<String>) -> Self {
        Argument::Reference(Reference {
            alias: alias.into(),
        })
    }

    /// Appends the aliases referenced by this argument, in order of appearance
    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Argument::Reference(r) => out.push(&r.alias),
            Argument::List(items) => items.iter().for_each(|i| i.collect_references(out)),
            Argument::Literal(_) => {}
        }
    }
}

impl PlanStep {
    /// Builds an enabled step with no alias
    pub fn new(contract: impl Into<String>, args: Vec<Argument>) -> Self {
        PlanStep {
            contract: contract.into(),
            alias: None,
            enabled: true,
            args,
        }
    }

    /// Stages the step off
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sets the alias later steps use to reference this step
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The key by which later steps reference this step
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.contract)
    }

    /// The aliases referenced by this step's arguments, in order of appearance
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.args.iter().for_each(|a| a.collect_references(&mut refs));
        refs
    }
}

impl DeploymentPlan {
    /// Builds an unnamed plan from the given steps
    pub fn new(steps: Vec<PlanStep>) -> Self {
        DeploymentPlan { name: None, steps }
    }

    /// Parses a plan from its JSON definition
    pub fn from_json(contents: &str) -> Result<Self, DeployError> {
        serde_json::from_str(contents).map_err(|e| DeployError::PlanParsing(e.to_string()))
    }

    /// Reads and parses a plan from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| DeployError::ReadFile(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// The enabled steps, paired with their index in the plan
    pub fn enabled_steps(&self) -> impl Iterator<Item = (usize, &PlanStep)> {
        self.steps.iter().enumerate().filter(|(_, step)| step.enabled)
    }

    /// Checks that the plan is well-formed before anything is deployed.
    ///
    /// Every alias must be unique and every contract named. Every reference in
    /// an enabled step must point strictly backward, to an enabled step.
    /// References held by disabled steps are not checked, as those steps
    /// never run.
    pub fn validate(&self) -> Result<(), RunError> {
        let mut seen = HashSet::new();
        let mut deployable = HashSet::new();

        for (index, step) in self.steps.iter().enumerate() {
            let fail = |error| RunError {
                index,
                alias: step.alias().to_string(),
                contract: step.contract.clone(),
                error,
                deployed: Vec::new(),
            };

            if step.contract.trim().is_empty() {
                return Err(fail(DeployError::InvalidPlan(format!(
                    "step {} names no contract",
                    index
                ))));
            }
            if !seen.insert(step.alias()) {
                return Err(fail(DeployError::InvalidPlan(format!(
                    "alias `{}` is used by more than one step",
                    step.alias()
                ))));
            }

            if !step.enabled {
                continue;
            }
            if let Some(missing) = step
                .references()
                .into_iter()
                .find(|r| !deployable.contains(r))
            {
                return Err(fail(DeployError::UnresolvedReference {
                    step: step.alias().to_string(),
                    reference: missing.to_string(),
                }));
            }
            deployable.insert(step.alias());
        }

        Ok(())
    }
}
