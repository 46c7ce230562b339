use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// The instruction-set architecture a function is built for.
///
/// Determines which build of an instrumentation layer applies. Functions without an explicit
/// architecture run on `x86_64`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Architecture {
    /// 64-bit x86 (the Lambda default).
    #[default]
    X86,
    /// 64-bit ARM (Graviton).
    Arm64,
}

impl Architecture {
    /// Returns the identifier used in the Lambda API and in layer names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ParseArchitectureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Architecture::X86),
            "arm64" => Ok(Architecture::Arm64),
            _ => Err(ParseArchitectureError),
        }
    }
}

/// An error returned when an architecture identifier cannot be parsed.
#[derive(Clone, Copy, Debug)]
pub struct ParseArchitectureError;

impl fmt::Display for ParseArchitectureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to parse architecture")
    }
}

impl std::error::Error for ParseArchitectureError {}

/// A snapshot of a function's deployed configuration.
///
/// Read from the control plane at the start of an operation and treated as immutable afterwards;
/// reconcilers compute a [`ConfigUpdate`] from it instead of mutating in place.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionConfig {
    /// The function's ARN.
    pub arn: String,
    /// The configured entry point.
    pub handler: String,
    /// The runtime identifier, for example `python3.12`.
    pub runtime: String,
    /// The architecture the function is built for.
    pub architecture: Architecture,
    /// The ARN of the function's execution role.
    pub role: String,
    /// Environment variables, keys unique.
    pub environment: BTreeMap<String, String>,
    /// Attached layer version ARNs, in order.
    pub layers: Vec<String>,
}

impl FunctionConfig {
    /// Returns the name of the execution role, parsed from the role ARN.
    pub fn role_name(&self) -> &str {
        self.role.rsplit('/').next().unwrap_or(&self.role)
    }
}

/// A complete replacement configuration computed by a reconciler.
///
/// Applied atomically with a single `UpdateFunctionConfiguration` call. A `None` handler means
/// the entry point is left untouched, used for runtimes that are instrumented through environment
/// variables only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigUpdate {
    /// The function to update, by ARN.
    pub function_name: String,
    /// The new entry point, if it changes.
    pub handler: Option<String>,
    /// The full replacement set of environment variables.
    pub environment: BTreeMap<String, String>,
    /// The full replacement list of layer version ARNs.
    pub layers: Vec<String>,
}

/// One layer returned by the hosted layer index.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LayerCandidate {
    /// The bare layer ARN, without a version suffix.
    pub layer_arn: String,
    /// The latest version compatible with the queried runtime.
    pub latest_matching_version: LayerVersion,
}

/// A concrete version of a published layer.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LayerVersion {
    /// The versioned layer ARN to attach.
    pub layer_version_arn: String,
}

/// Outputs of the license-key secret stack, if it has been provisioned.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LicenseKeyOutputs {
    /// ARN of the secret holding the license key.
    pub secret_arn: Option<String>,
    /// The New Relic account the secret was provisioned for.
    pub account_id: Option<String>,
    /// ARN of the managed policy granting read access to the secret.
    pub policy_arn: Option<String>,
}
