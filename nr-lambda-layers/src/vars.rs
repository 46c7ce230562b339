//! Environment variable names owned by the instrumentation.
//!
//! These names are a stable contract: the monitoring agent and the extension read them at
//! invocation time, so they must never change. All keys carry the `NEW_RELIC_` namespace prefix,
//! with the exception of the CoreCLR profiler hooks required by the .NET agent.

/// Namespace prefix of all instrumentation-owned environment variables.
pub const NR_PREFIX: &str = "NEW_RELIC_";

/// The New Relic account id reported by the agent.
pub const ACCOUNT_ID: &str = "NEW_RELIC_ACCOUNT_ID";

/// Marker variable remembering the user's original handler.
///
/// The wrapper handler delegates to it at invocation time, and uninstall restores it.
pub const LAMBDA_HANDLER: &str = "NEW_RELIC_LAMBDA_HANDLER";

/// Whether the telemetry extension is enabled.
pub const EXTENSION_ENABLED: &str = "NEW_RELIC_LAMBDA_EXTENSION_ENABLED";

/// Whether the extension forwards function logs.
pub const SEND_FUNCTION_LOGS: &str = "NEW_RELIC_EXTENSION_SEND_FUNCTION_LOGS";

/// Whether the extension forwards its own logs.
pub const SEND_EXTENSION_LOGS: &str = "NEW_RELIC_EXTENSION_SEND_EXTENSION_LOGS";

/// The license key, when written directly instead of being resolved from the secret.
pub const LICENSE_KEY: &str = "NEW_RELIC_LICENSE_KEY";

/// Telemetry endpoint override, written for the staging environment.
pub const TELEMETRY_ENDPOINT: &str = "NEW_RELIC_TELEMETRY_ENDPOINT";

/// Marker enabling APM Lambda mode. The agent expects the literal `"True"`.
pub const APM_LAMBDA_MODE: &str = "NEW_RELIC_APM_LAMBDA_MODE";

/// The staging telemetry collector.
pub const STAGING_TELEMETRY_ENDPOINT: &str =
    "https://staging-cloud-collector.newrelic.com/aws/lambda/v1";

/// CoreCLR profiler hooks required by the .NET agent.
///
/// These do not carry the namespace prefix because the CLR, not the agent, reads them.
pub const DOTNET_VARS: [(&str, &str); 4] = [
    ("CORECLR_ENABLE_PROFILING", "1"),
    ("CORECLR_PROFILER", "{36032161-FFC0-4B61-B559-F6C5D41BAE5A}"),
    ("CORECLR_NEWRELIC_HOME", "/opt/lib/newrelic-dotnet-agent"),
    (
        "CORECLR_PROFILER_PATH",
        "/opt/lib/newrelic-dotnet-agent/libNewRelicProfiler.so",
    ),
];

/// Returns `true` if the key is owned by the instrumentation.
///
/// Uninstall removes exactly these keys; everything else passes through byte-identical.
pub fn is_instrumentation_var(key: &str) -> bool {
    key.starts_with(NR_PREFIX) || DOTNET_VARS.iter().any(|(name, _)| *name == key)
}
