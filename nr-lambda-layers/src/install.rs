//! Install reconciliation and orchestration.

use std::collections::BTreeMap;

use nr_lambda_aws::{
    ConfigUpdate, FunctionApi, FunctionConfig, LayerCandidate, LayerIndex, LicenseKeyApi, RoleApi,
};

use crate::select::{is_instrumented, layer_arn_prefix, layer_selection};
use crate::{attach_license_key_policy, vars, LayerError, Prompt, RuntimeFamily};

/// Tag recording that a function was instrumented in APM mode.
pub const APM_MODE_TAG: &str = "NR.Apm.Lambda.Mode";

/// A requested change to one of the extension's log-forwarding flags.
///
/// The two log concerns (function logs and extension logs) each carry one of these and never
/// influence one another. `Unspecified` means "no change requested": on upgrade the deployed
/// value survives untouched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogToggle {
    /// Leave the deployed value as it is.
    #[default]
    Unspecified,
    /// Turn forwarding on.
    Send,
    /// Turn forwarding off.
    Disable,
}

impl LogToggle {
    /// Builds a toggle from a mutually exclusive pair of CLI flags.
    pub fn from_flags(send: bool, disable: bool) -> Self {
        match (send, disable) {
            (_, true) => LogToggle::Disable,
            (true, false) => LogToggle::Send,
            (false, false) => LogToggle::Unspecified,
        }
    }

    /// Applies the toggle to the merged environment.
    ///
    /// Log forwarding is opt-in via an explicit upgrade only: a fresh install always writes
    /// `"false"`, regardless of what was requested or deployed before.
    fn apply(self, environment: &mut BTreeMap<String, String>, key: &str, upgrade: bool) {
        if !upgrade {
            environment.insert(key.to_owned(), "false".to_owned());
            return;
        }

        match self {
            LogToggle::Send => {
                environment.insert(key.to_owned(), "true".to_owned());
            }
            LogToggle::Disable => {
                environment.insert(key.to_owned(), "false".to_owned());
            }
            LogToggle::Unspecified => (),
        }
    }
}

/// Caller intent for an install or upgrade, immutable per invocation.
#[derive(Clone, Debug)]
pub struct InstallOptions {
    /// The New Relic account id to report to.
    pub account_id: u64,
    /// The AWS region the function lives in.
    pub region: String,
    /// New Relic environment selector; `"staging"` redirects telemetry to the staging collector.
    pub nr_region: Option<String>,
    /// License key to write into the environment; when absent, the agent resolves it from the
    /// managed secret at invocation time.
    pub license_key: Option<String>,
    /// Enables the telemetry extension.
    pub enable_extension: bool,
    /// Requested change to function-log forwarding.
    pub function_logs: LogToggle,
    /// Requested change to extension-log forwarding.
    pub extension_logs: LogToggle,
    /// Re-apply instrumentation even when already installed, picking up newer layers.
    pub upgrade: bool,
    /// Instrument in APM mode.
    pub apm: bool,
    /// Use the ECMAScript-module wrapper (Node.js only).
    pub esm: bool,
}

impl InstallOptions {
    /// Creates options with the required fields; everything else defaults to "no change".
    pub fn new(account_id: u64, region: impl Into<String>) -> Self {
        Self {
            account_id,
            region: region.into(),
            nr_region: None,
            license_key: None,
            enable_extension: false,
            function_logs: LogToggle::default(),
            extension_logs: LogToggle::default(),
            upgrade: false,
            apm: false,
            esm: false,
        }
    }
}

/// Result of install reconciliation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstallOutcome {
    /// The complete replacement configuration to push.
    Update(ConfigUpdate),
    /// Instrumentation is already present and no upgrade was requested; nothing to change.
    AlreadyInstalled,
    /// The runtime is not supported; the function must be skipped, not failed.
    UnsupportedRuntime,
}

/// Computes the configuration that instruments a function.
///
/// Pure except for the injected [`Prompt`]: the layer candidates are materialized by the caller
/// beforehand, and no control-plane call happens here. Repeated application is idempotent; with
/// `upgrade` unset, reconciling an already instrumented function yields
/// [`InstallOutcome::AlreadyInstalled`].
pub fn reconcile_install(
    options: &InstallOptions,
    config: &FunctionConfig,
    candidates: &[LayerCandidate],
    license_key: Option<&str>,
    prompt: &dyn Prompt,
) -> Result<InstallOutcome, LayerError> {
    let Some(family) = RuntimeFamily::classify(&config.runtime) else {
        return Ok(InstallOutcome::UnsupportedRuntime);
    };

    if is_instrumented(config, &options.region) && !options.upgrade {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let layer_arn = layer_selection(candidates, &config.runtime, config.architecture, prompt)?;

    let mut environment = config.environment.clone();
    environment.insert(vars::ACCOUNT_ID.to_owned(), options.account_id.to_string());
    environment.insert(
        vars::EXTENSION_ENABLED.to_owned(),
        options.enable_extension.to_string(),
    );

    if options.enable_extension {
        options
            .function_logs
            .apply(&mut environment, vars::SEND_FUNCTION_LOGS, options.upgrade);
        options
            .extension_logs
            .apply(&mut environment, vars::SEND_EXTENSION_LOGS, options.upgrade);
    }

    let handler = if family.rewrites_handler() {
        // Remember the pre-instrumentation entry point. On re-entry the handler already is our
        // wrapper, so the previously stored marker survives unchanged.
        let original = if family.is_wrapper(&config.handler) {
            environment.get(vars::LAMBDA_HANDLER).cloned()
        } else {
            Some(config.handler.clone())
        };
        if let Some(original) = original {
            environment.insert(vars::LAMBDA_HANDLER.to_owned(), original);
        }

        family.wrapper_handler(&config.handler, options.esm).map(str::to_owned)
    } else {
        None
    };

    if family == RuntimeFamily::DotNet {
        for (key, value) in vars::DOTNET_VARS {
            environment.insert(key.to_owned(), value.to_owned());
        }
    }

    if let Some(license_key) = license_key.filter(|key| !key.is_empty()) {
        environment.insert(vars::LICENSE_KEY.to_owned(), license_key.to_owned());
        if options.nr_region.as_deref() == Some("staging") {
            environment.insert(
                vars::TELEMETRY_ENDPOINT.to_owned(),
                vars::STAGING_TELEMETRY_ENDPOINT.to_owned(),
            );
        }
    }

    if options.apm {
        environment.insert(vars::APM_LAMBDA_MODE.to_owned(), "True".to_owned());
    }

    // Drop any previously attached instrumentation layer and append the resolved one, keeping
    // user-owned layers in their relative order.
    let prefix = layer_arn_prefix(&options.region);
    let mut layers: Vec<String> = config
        .layers
        .iter()
        .filter(|arn| !arn.starts_with(&prefix))
        .cloned()
        .collect();
    layers.push(layer_arn);

    Ok(InstallOutcome::Update(ConfigUpdate {
        function_name: config.arn.clone(),
        handler,
        environment,
        layers,
    }))
}

/// Per-function outcome of an install run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstallStatus {
    /// The configuration was updated.
    Installed,
    /// Instrumentation was already present; nothing was written.
    AlreadyInstalled,
    /// The runtime is unsupported; the function was skipped.
    UnsupportedRuntime,
    /// No function with the given name exists.
    NotFound,
}

/// Instruments a single function: read, reconcile, write, tag.
///
/// The configuration is read once and the reconciled replacement written in a single update; on
/// any upstream failure the operation aborts with no partial state. Batch callers treat each
/// function independently.
pub async fn install(
    aws: &(impl FunctionApi + RoleApi + LicenseKeyApi),
    index: &dyn LayerIndex,
    prompt: &dyn Prompt,
    options: &InstallOptions,
    function: &str,
) -> Result<InstallStatus, LayerError> {
    let outputs = aws.license_key_outputs().await?;

    if let Some(linked) = outputs.as_ref().and_then(|outputs| outputs.account_id.as_deref()) {
        if linked != options.account_id.to_string() {
            return Err(LayerError::AccountMismatch {
                supplied: options.account_id,
                linked: linked.to_owned(),
            });
        }
    }

    let Some(config) = aws.function_config(function).await? else {
        nr_lambda_log::warn!("function {function} not found");
        return Ok(InstallStatus::NotFound);
    };

    if RuntimeFamily::classify(&config.runtime).is_none() {
        nr_lambda_log::warn!(
            "skipping function {function}: unsupported runtime {}",
            config.runtime
        );
        return Ok(InstallStatus::UnsupportedRuntime);
    }

    if is_instrumented(&config, &options.region) && !options.upgrade {
        nr_lambda_log::info!(
            "function {function} already instrumented, pass --upgrade to update layers"
        );
        return Ok(InstallStatus::AlreadyInstalled);
    }

    let candidates = index.list_layers(&config.runtime, config.architecture).await?;

    let update = match reconcile_install(
        options,
        &config,
        &candidates,
        options.license_key.as_deref(),
        prompt,
    )? {
        InstallOutcome::Update(update) => update,
        InstallOutcome::AlreadyInstalled => return Ok(InstallStatus::AlreadyInstalled),
        InstallOutcome::UnsupportedRuntime => return Ok(InstallStatus::UnsupportedRuntime),
    };

    if let Some(policy_arn) = outputs.as_ref().and_then(|outputs| outputs.policy_arn.as_deref()) {
        attach_license_key_policy(aws, config.role_name(), policy_arn).await?;
    }

    aws.update_function_config(&update).await?;

    if options.apm {
        let tags = BTreeMap::from([(APM_MODE_TAG.to_owned(), "true".to_owned())]);
        aws.tag_resource(&config.arn, &tags).await?;
    }

    let prefix = layer_arn_prefix(&options.region);
    if let Some(layer) = update.layers.iter().find(|arn| arn.starts_with(&prefix)) {
        nr_lambda_log::info!("successfully installed layer {layer} on function {function}");
    }

    Ok(InstallStatus::Installed)
}
