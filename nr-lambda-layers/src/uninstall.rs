//! Uninstall reconciliation and orchestration.

use nr_lambda_aws::{ConfigUpdate, FunctionApi, FunctionConfig, LicenseKeyApi, RoleApi};

use crate::select::layer_arn_prefix;
use crate::{detach_license_key_policy, vars, LayerError, RuntimeFamily};

/// Caller intent for an uninstall, immutable per invocation.
#[derive(Clone, Debug)]
pub struct UninstallOptions {
    /// The AWS region the function lives in.
    pub region: String,
}

impl UninstallOptions {
    /// Creates options for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

/// Result of uninstall reconciliation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UninstallOutcome {
    /// The complete replacement configuration to push.
    Update(ConfigUpdate),
    /// The runtime is unsupported, so this tool cannot have instrumented the function; removal
    /// succeeds as a no-op.
    NothingToDo,
}

/// Computes the configuration that removes instrumentation, the inverse of install.
///
/// The handler is only restored when its current value is recognizably our wrapper; anything
/// else means the function was never touched or the marker was corrupted, and the operation
/// fails rather than guessing what to restore. All instrumentation-owned variables and layers
/// are removed; user-owned ones survive byte-identical.
pub fn reconcile_uninstall(
    options: &UninstallOptions,
    config: &FunctionConfig,
) -> Result<UninstallOutcome, LayerError> {
    let Some(family) = RuntimeFamily::classify(&config.runtime) else {
        return Ok(UninstallOutcome::NothingToDo);
    };

    let handler = if family.rewrites_handler() {
        if !family.is_wrapper(&config.handler) {
            return Err(LayerError::NotInstalled {
                function: config.arn.clone(),
            });
        }

        match config.environment.get(vars::LAMBDA_HANDLER) {
            Some(original) => Some(original.clone()),
            None => {
                return Err(LayerError::CorruptedState {
                    function: config.arn.clone(),
                })
            }
        }
    } else {
        None
    };

    let environment = config
        .environment
        .iter()
        .filter(|(key, _)| !vars::is_instrumentation_var(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let prefix = layer_arn_prefix(&options.region);
    let layers = config
        .layers
        .iter()
        .filter(|arn| !arn.starts_with(&prefix))
        .cloned()
        .collect();

    Ok(UninstallOutcome::Update(ConfigUpdate {
        function_name: config.arn.clone(),
        handler,
        environment,
        layers,
    }))
}

/// Per-function outcome of an uninstall run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UninstallStatus {
    /// Instrumentation was removed and the original configuration restored.
    Uninstalled,
    /// The runtime is unsupported; there was nothing to remove.
    UnsupportedRuntime,
    /// No function with the given name exists.
    NotFound,
}

/// De-instruments a single function: read, reconcile, write, detach the secret policy.
pub async fn uninstall(
    aws: &(impl FunctionApi + RoleApi + LicenseKeyApi),
    options: &UninstallOptions,
    function: &str,
) -> Result<UninstallStatus, LayerError> {
    let Some(config) = aws.function_config(function).await? else {
        nr_lambda_log::warn!("function {function} not found");
        return Ok(UninstallStatus::NotFound);
    };

    let update = match reconcile_uninstall(options, &config)? {
        UninstallOutcome::Update(update) => update,
        UninstallOutcome::NothingToDo => {
            nr_lambda_log::info!(
                "function {function} has unsupported runtime {}, nothing to remove",
                config.runtime
            );
            return Ok(UninstallStatus::UnsupportedRuntime);
        }
    };

    aws.update_function_config(&update).await?;

    let outputs = aws.license_key_outputs().await?;
    if let Some(policy_arn) = outputs.as_ref().and_then(|outputs| outputs.policy_arn.as_deref()) {
        detach_license_key_policy(aws, config.role_name(), policy_arn).await?;
    }

    nr_lambda_log::info!("successfully removed instrumentation from function {function}");
    Ok(UninstallStatus::Uninstalled)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nr_lambda_aws::{Architecture, LayerCandidate, LayerVersion};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::runtime::{JAVA_STREAM_WRAPPER, PYTHON_WRAPPER};
    use crate::select::NoPrompt;
    use crate::{reconcile_install, InstallOptions, InstallOutcome, LogToggle};

    const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:5558675309:function:aws-python3-dev-hello";

    fn mock_config(runtime: &str) -> FunctionConfig {
        FunctionConfig {
            arn: FUNCTION_ARN.to_owned(),
            handler: "original_handler".to_owned(),
            runtime: runtime.to_owned(),
            architecture: Architecture::X86,
            role: "arn:aws:iam::5558675309:role/lambda-role".to_owned(),
            environment: BTreeMap::from([(
                "EXISTING_ENV_VAR".to_owned(),
                "Hello World".to_owned(),
            )]),
            layers: Vec::new(),
        }
    }

    fn options() -> UninstallOptions {
        UninstallOptions::new("us-east-1")
    }

    fn update_of(outcome: UninstallOutcome) -> ConfigUpdate {
        match outcome {
            UninstallOutcome::Update(update) => update,
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_uninstall_restores_handler_and_prunes_vars() {
        let mut config = mock_config("python3.12");
        config.handler = PYTHON_WRAPPER.to_owned();
        config
            .environment
            .insert(vars::LAMBDA_HANDLER.to_owned(), "original_handler".to_owned());
        config
            .environment
            .insert(vars::ACCOUNT_ID.to_owned(), "12345".to_owned());
        config
            .layers
            .push("arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312:12".to_owned());

        let update = update_of(reconcile_uninstall(&options(), &config).unwrap());

        assert_eq!(update.function_name, FUNCTION_ARN);
        assert_eq!(update.handler.as_deref(), Some("original_handler"));
        assert!(update
            .environment
            .keys()
            .all(|key| !key.starts_with(vars::NR_PREFIX)));
        assert_eq!(update.environment["EXISTING_ENV_VAR"], "Hello World");
        assert!(update.layers.is_empty());
    }

    #[test]
    fn test_unsupported_runtime_is_a_noop() {
        let config = mock_config("not.a.runtime");
        let outcome = reconcile_uninstall(&options(), &config).unwrap();
        assert_eq!(outcome, UninstallOutcome::NothingToDo);
    }

    #[test]
    fn test_untouched_function_is_not_restored() {
        // The handler was never wrapped by this tool; refusing beats guessing.
        let config = mock_config("python3.12");
        let err = reconcile_uninstall(&options(), &config).unwrap_err();
        assert!(matches!(err, LayerError::NotInstalled { .. }));

        let mut config = mock_config("python3.12");
        config.handler = "what is this?".to_owned();
        let err = reconcile_uninstall(&options(), &config).unwrap_err();
        assert!(matches!(err, LayerError::NotInstalled { .. }));
    }

    #[test]
    fn test_missing_marker_is_corrupted_state() {
        let mut config = mock_config("python3.12");
        config.handler = PYTHON_WRAPPER.to_owned();
        let err = reconcile_uninstall(&options(), &config).unwrap_err();
        assert!(matches!(err, LayerError::CorruptedState { .. }));
    }

    #[test]
    fn test_java_streaming_wrapper_is_recognized() {
        let mut config = mock_config("java11");
        config.handler = JAVA_STREAM_WRAPPER.to_owned();
        config
            .environment
            .insert(vars::LAMBDA_HANDLER.to_owned(), "original_handler".to_owned());

        let update = update_of(reconcile_uninstall(&options(), &config).unwrap());
        assert_eq!(update.handler.as_deref(), Some("original_handler"));
    }

    #[test]
    fn test_dotnet_uninstall_removes_profiler_vars() {
        let mut config = mock_config("dotnet8");
        for (key, value) in vars::DOTNET_VARS {
            config.environment.insert(key.to_owned(), value.to_owned());
        }
        config
            .environment
            .insert(vars::ACCOUNT_ID.to_owned(), "12345".to_owned());
        config
            .layers
            .push("arn:aws:lambda:us-east-1:451483290750:layer:NewRelicLambdaExtension:34".to_owned());

        let update = update_of(reconcile_uninstall(&options(), &config).unwrap());

        assert_eq!(update.handler, None);
        assert_eq!(
            update.environment,
            BTreeMap::from([("EXISTING_ENV_VAR".to_owned(), "Hello World".to_owned())])
        );
        assert!(update.layers.is_empty());
    }

    #[test]
    fn test_uninstall_inverts_install() {
        // Install then uninstall must restore the handler, environment and layers exactly.
        let mut original = mock_config("python3.12");
        original.handler = "app.lambda_handler".to_owned();
        original
            .layers
            .push("arn:aws:lambda:us-east-1:5558675309:layer:UserLayer:3".to_owned());

        let candidates = vec![LayerCandidate {
            layer_arn: "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312".to_owned(),
            latest_matching_version: LayerVersion {
                layer_version_arn:
                    "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312:12".to_owned(),
            },
        }];

        let install_options = InstallOptions {
            enable_extension: true,
            function_logs: LogToggle::Send,
            apm: true,
            ..InstallOptions::new(12345, "us-east-1")
        };

        let installed = match reconcile_install(
            &install_options,
            &original,
            &candidates,
            Some("foobarbaz"),
            &NoPrompt,
        )
        .unwrap()
        {
            InstallOutcome::Update(update) => {
                let mut config = original.clone();
                config.handler = update.handler.clone().unwrap();
                config.environment = update.environment.clone();
                config.layers = update.layers.clone();
                config
            }
            other => panic!("expected update, got {other:?}"),
        };

        let update = update_of(reconcile_uninstall(&options(), &installed).unwrap());

        assert_eq!(update.handler.as_deref(), Some("app.lambda_handler"));
        assert_eq!(update.environment, original.environment);
        assert_eq!(update.layers, original.layers);
    }
}
