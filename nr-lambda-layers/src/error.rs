use nr_lambda_aws::{Architecture, AwsError};

/// Errors aborting a single install or uninstall operation.
///
/// Unsupported runtimes and repeated installs are *not* errors; they are signalled through the
/// reconciler outcomes so callers can report them accurately. In batch runs, an error aborts only
/// the affected function's operation.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// The layer index has no layer for this runtime and architecture.
    #[error("no instrumentation layers published for runtime {runtime} on {architecture}")]
    NoMatchingLayers {
        /// The runtime identifier queried.
        runtime: String,
        /// The function's architecture.
        architecture: Architecture,
    },

    /// More than one equally valid layer candidate and no interactive terminal attached.
    #[error("multiple matching layers and no terminal to choose one: {}", candidates.join(", "))]
    AmbiguousSelection {
        /// The candidate layer version ARNs, in the order they were presented.
        candidates: Vec<String>,
    },

    /// Uninstall targeted a function this tool never instrumented.
    #[error("function {function} does not appear to be instrumented, not changing anything")]
    NotInstalled {
        /// The targeted function.
        function: String,
    },

    /// The marker variable holding the original handler is missing or the handler shape is
    /// unrecognizable; refusing to guess what to restore.
    #[error("function {function} has no recorded original handler, refusing to restore")]
    CorruptedState {
        /// The targeted function.
        function: String,
    },

    /// The requested account id does not match the account the license-key secret was
    /// provisioned for.
    #[error("account id {supplied} does not match the linked account {linked}")]
    AccountMismatch {
        /// The account id supplied by the caller.
        supplied: u64,
        /// The account id recorded in the license-key stack.
        linked: String,
    },

    /// A control-plane call failed; propagated verbatim.
    #[error(transparent)]
    Aws(#[from] AwsError),
}
