use std::collections::BTreeMap;
use std::error::Error;

use async_trait::async_trait;

use crate::{Architecture, ConfigUpdate, FunctionConfig, LayerCandidate, LicenseKeyOutputs};

/// A boxed error source from an SDK call.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// An error from a control-plane call.
///
/// Upstream failures are propagated verbatim to the operator; no partial state is ever written
/// when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    /// The hosted layer index could not be queried.
    #[error("failed to query the hosted layer index")]
    LayerIndex(#[source] reqwest::Error),

    /// An AWS SDK call failed.
    #[error("{operation} failed")]
    Sdk {
        /// The control-plane operation that failed.
        operation: &'static str,
        /// The underlying SDK error.
        #[source]
        source: BoxError,
    },
}

impl AwsError {
    /// Wraps an SDK error with the name of the failed operation.
    pub fn sdk(operation: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        AwsError::Sdk {
            operation,
            source: Box::new(source),
        }
    }
}

/// Read, update and tag function configurations.
#[async_trait]
pub trait FunctionApi: Send + Sync {
    /// Fetches a function's configuration by name or ARN.
    ///
    /// Returns `Ok(None)` if no such function exists.
    async fn function_config(&self, function: &str) -> Result<Option<FunctionConfig>, AwsError>;

    /// Applies a complete replacement configuration.
    async fn update_function_config(&self, update: &ConfigUpdate) -> Result<(), AwsError>;

    /// Merges the given tags into the resource's tag set.
    async fn tag_resource(
        &self,
        arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), AwsError>;
}

/// Attach and detach managed policies on execution roles.
///
/// Both calls are idempotent: attaching an already attached policy and detaching an already
/// detached one succeed.
#[async_trait]
pub trait RoleApi: Send + Sync {
    /// Ensures the policy is attached to the role.
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError>;

    /// Ensures the policy is detached from the role.
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError>;
}

/// Resolve the outputs of the license-key secret stack.
#[async_trait]
pub trait LicenseKeyApi: Send + Sync {
    /// Returns the stack outputs, or `None` if the stack has not been provisioned.
    async fn license_key_outputs(&self) -> Result<Option<LicenseKeyOutputs>, AwsError>;
}

/// List the published instrumentation layers for a runtime and architecture.
#[async_trait]
pub trait LayerIndex: Send + Sync {
    /// Queries all matching layers, paginating until exhausted.
    ///
    /// The result is fully materialized; callers filter it with random access.
    async fn list_layers(
        &self,
        runtime: &str,
        architecture: Architecture,
    ) -> Result<Vec<LayerCandidate>, AwsError>;
}
