use clap::ArgMatches;
use nr_lambda_log::{LogConfig, LogFormat};

/// Initializes logging from the global command line switches.
pub fn init_logging(matches: &ArgMatches) {
    let format = match matches.get_one::<String>("log_format").map(String::as_str) {
        Some("pretty") => LogFormat::Pretty,
        Some("simplified") => LogFormat::Simplified,
        Some("json") => LogFormat::Json,
        _ => LogFormat::Auto,
    };

    nr_lambda_log::init(&LogConfig {
        verbose: matches.get_flag("verbose"),
        format,
    });
}
