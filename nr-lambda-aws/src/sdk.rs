use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_lambda::types::Environment;

use crate::{
    Architecture, AwsError, ConfigUpdate, FunctionApi, FunctionConfig, LicenseKeyApi,
    LicenseKeyOutputs, RoleApi,
};

/// Name of the CloudFormation stack provisioning the license-key secret.
const LICENSE_KEY_STACK: &str = "NewRelicLicenseKeySecret";

/// Stack output naming the secret's ARN.
const OUTPUT_SECRET_ARN: &str = "LicenseKeySecretARN";
/// Stack output naming the account the secret was provisioned for.
const OUTPUT_ACCOUNT_ID: &str = "NrAccountId";
/// Stack output naming the managed policy granting read access to the secret.
const OUTPUT_POLICY_ARN: &str = "ViewPolicyARN";

/// AWS SDK implementation of the control-plane traits.
///
/// Holds one client per service, all derived from the same resolved SDK configuration, so a
/// single instance serves an entire install or uninstall run.
#[derive(Clone, Debug)]
pub struct AwsControlPlane {
    lambda: aws_sdk_lambda::Client,
    iam: aws_sdk_iam::Client,
    cloudformation: aws_sdk_cloudformation::Client,
}

impl AwsControlPlane {
    /// Creates clients from a resolved SDK configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            lambda: aws_sdk_lambda::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionApi for AwsControlPlane {
    async fn function_config(&self, function: &str) -> Result<Option<FunctionConfig>, AwsError> {
        let output = match self
            .lambda
            .get_function()
            .function_name(function)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_resource_not_found_exception() {
                    return Ok(None);
                }
                return Err(AwsError::sdk("GetFunction", err));
            }
        };

        let Some(config) = output.configuration else {
            return Ok(None);
        };

        let architecture = config
            .architectures()
            .first()
            .and_then(|arch| arch.as_str().parse().ok())
            .unwrap_or(Architecture::X86);

        Ok(Some(FunctionConfig {
            arn: config.function_arn().unwrap_or_default().to_owned(),
            handler: config.handler().unwrap_or_default().to_owned(),
            runtime: config
                .runtime()
                .map(|runtime| runtime.as_str())
                .unwrap_or_default()
                .to_owned(),
            architecture,
            role: config.role().unwrap_or_default().to_owned(),
            environment: config
                .environment()
                .and_then(|environment| environment.variables())
                .map(|variables| {
                    variables
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            layers: config
                .layers()
                .iter()
                .filter_map(|layer| layer.arn().map(str::to_owned))
                .collect(),
        }))
    }

    async fn update_function_config(&self, update: &ConfigUpdate) -> Result<(), AwsError> {
        let variables: HashMap<String, String> = update
            .environment
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut request = self
            .lambda
            .update_function_configuration()
            .function_name(&update.function_name)
            .environment(Environment::builder().set_variables(Some(variables)).build())
            .set_layers(Some(update.layers.clone()));

        if let Some(handler) = &update.handler {
            request = request.handler(handler);
        }

        request
            .send()
            .await
            .map_err(|err| AwsError::sdk("UpdateFunctionConfiguration", err.into_service_error()))?;
        Ok(())
    }

    async fn tag_resource(
        &self,
        arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), AwsError> {
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.lambda
            .tag_resource()
            .resource(arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|err| AwsError::sdk("TagResource", err.into_service_error()))?;
        Ok(())
    }
}

#[async_trait]
impl RoleApi for AwsControlPlane {
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        self.iam
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|err| AwsError::sdk("AttachRolePolicy", err.into_service_error()))?;
        Ok(())
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        match self
            .iam
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                // Already detached counts as success.
                if err.is_no_such_entity_exception() {
                    return Ok(());
                }
                Err(AwsError::sdk("DetachRolePolicy", err))
            }
        }
    }
}

#[async_trait]
impl LicenseKeyApi for AwsControlPlane {
    async fn license_key_outputs(&self) -> Result<Option<LicenseKeyOutputs>, AwsError> {
        let output = match self
            .cloudformation
            .describe_stacks()
            .stack_name(LICENSE_KEY_STACK)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                // CloudFormation reports a missing stack as a validation error rather than a
                // dedicated error type.
                if err.message().is_some_and(|m| m.contains("does not exist")) {
                    return Ok(None);
                }
                return Err(AwsError::sdk("DescribeStacks", err));
            }
        };

        let Some(stack) = output.stacks().first() else {
            return Ok(None);
        };

        let mut outputs = LicenseKeyOutputs::default();
        for entry in stack.outputs() {
            let value = entry.output_value().map(str::to_owned);
            match entry.output_key() {
                Some(OUTPUT_SECRET_ARN) => outputs.secret_arn = value,
                Some(OUTPUT_ACCOUNT_ID) => outputs.account_id = value,
                Some(OUTPUT_POLICY_ARN) => outputs.policy_arn = value,
                _ => (),
            }
        }

        Ok(Some(outputs))
    }
}
