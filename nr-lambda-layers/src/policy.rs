//! License-key policy binding.
//!
//! The license key lives in a managed secret; a function's execution role needs the view policy
//! attached to read it at invocation time. Both operations here ensure a state rather than
//! perform a transition: attaching an already attached policy and detaching an already detached
//! one succeed.

use nr_lambda_aws::RoleApi;

use crate::LayerError;

/// Ensures the license-key view policy is attached to the execution role.
pub async fn attach_license_key_policy(
    aws: &impl RoleApi,
    role_name: &str,
    policy_arn: &str,
) -> Result<bool, LayerError> {
    aws.attach_role_policy(role_name, policy_arn).await?;
    nr_lambda_log::debug!("attached policy {policy_arn} to role {role_name}");
    Ok(true)
}

/// Ensures the license-key view policy is detached from the execution role.
pub async fn detach_license_key_policy(
    aws: &impl RoleApi,
    role_name: &str,
    policy_arn: &str,
) -> Result<bool, LayerError> {
    aws.detach_role_policy(role_name, policy_arn).await?;
    nr_lambda_log::debug!("detached policy {policy_arn} from role {role_name}");
    Ok(true)
}
