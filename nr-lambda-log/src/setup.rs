use std::env;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Controls the log format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    #[default]
    Auto,

    /// Pretty printing with colors.
    ///
    /// ```text
    ///  INFO nr_lambda::layers: installed layer
    /// ```
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2024-12-04T12:10:32Z INFO nr_lambda::layers: installed layer
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2024-12-04T12:11:08.729716Z","level":"INFO","fields":{"message":"installed layer"}}
    /// ```
    Json,
}

/// Controls the logging system.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enables debug-level messages for the CLI's own crates.
    pub verbose: bool,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,
}

impl LogConfig {
    fn default_directives(&self) -> &'static str {
        if self.verbose {
            "warn,nr_lambda=debug,nr_lambda_layers=debug,nr_lambda_aws=debug"
        } else {
            "warn,nr_lambda=info,nr_lambda_layers=info,nr_lambda_aws=info"
        }
    }
}

/// Initializes the global logger, ready to be used by the logging macros.
///
/// The log level can be overridden at runtime with the `RUST_LOG` environment variable, using
/// [`EnvFilter`] directive syntax.
pub fn init(config: &LogConfig) {
    let filter = env::var(EnvFilter::DEFAULT_ENV)
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let format = match config.format {
        LogFormat::Auto if console::user_attended() => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Simplified,
        other => other,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.with_ansi(true).without_time().init(),
        LogFormat::Simplified => builder.with_ansi(false).init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Auto => unreachable!(),
    }
}
