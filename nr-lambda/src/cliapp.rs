//! This module implements the definition of the command line app.
//!
//! It must not have any other imports so that the completion generator can construct the full
//! command without pulling in the rest of the binary.

use clap::{value_parser, Arg, ArgAction, Command};
use clap_complete::Shell;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ABOUT: &str = "Instruments AWS Lambda functions with New Relic monitoring.";

pub fn make_app() -> Command {
    Command::new("nr-lambda")
        .disable_help_subcommand(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .max_term_width(79)
        .version(VERSION)
        .about(ABOUT)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug-level log output."),
        )
        .arg(
            Arg::new("log_format")
                .long("log-format")
                .value_name("FORMAT")
                .global(true)
                .value_parser(["auto", "pretty", "simplified", "json"])
                .help("The log output format. Defaults to auto-detection based on the terminal."),
        )
        .subcommand(
            Command::new("layers")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .about("Manage the instrumentation of Lambda functions")
                .subcommand(
                    Command::new("install")
                        .about("Install the monitoring layer on one or more functions")
                        .after_help(
                            "This rewrites each function's configuration to attach the \
                             instrumentation layer, wrap the handler and set the agent's \
                             environment variables.  Functions that are already instrumented \
                             are left untouched unless '--upgrade' is passed.",
                        )
                        .arg(function_arg())
                        .arg(
                            Arg::new("account_id")
                                .value_name("ID")
                                .long("nr-account-id")
                                .env("NEW_RELIC_ACCOUNT_ID")
                                .required(true)
                                .value_parser(value_parser!(u64))
                                .help("The New Relic account id to report to."),
                        )
                        .arg(aws_region_arg())
                        .arg(aws_profile_arg())
                        .arg(
                            Arg::new("nr_region")
                                .value_name("REGION")
                                .long("nr-region")
                                .help(
                                    "The New Relic environment to report to. Pass 'staging' to \
                                     redirect telemetry to the staging collector.",
                                ),
                        )
                        .arg(
                            Arg::new("license_key")
                                .value_name("KEY")
                                .long("license-key")
                                .help(
                                    "Write the license key into the function's environment \
                                     instead of resolving it from the managed secret.",
                                ),
                        )
                        .arg(
                            Arg::new("enable_extension")
                                .long("enable-extension")
                                .action(ArgAction::SetTrue)
                                .help("Enable the telemetry extension."),
                        )
                        .arg(
                            Arg::new("send_function_logs")
                                .long("send-function-logs")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("disable_function_logs")
                                .help("Have the extension forward function logs (upgrades only)."),
                        )
                        .arg(
                            Arg::new("disable_function_logs")
                                .long("disable-function-logs")
                                .action(ArgAction::SetTrue)
                                .help("Stop the extension from forwarding function logs."),
                        )
                        .arg(
                            Arg::new("send_extension_logs")
                                .long("send-extension-logs")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("disable_extension_logs")
                                .help("Have the extension forward its own logs (upgrades only)."),
                        )
                        .arg(
                            Arg::new("disable_extension_logs")
                                .long("disable-extension-logs")
                                .action(ArgAction::SetTrue)
                                .help("Stop the extension from forwarding its own logs."),
                        )
                        .arg(
                            Arg::new("upgrade")
                                .long("upgrade")
                                .action(ArgAction::SetTrue)
                                .help("Re-instrument already instrumented functions, picking up newer layers."),
                        )
                        .arg(
                            Arg::new("apm")
                                .long("apm")
                                .action(ArgAction::SetTrue)
                                .help("Instrument in APM mode."),
                        )
                        .arg(
                            Arg::new("esm")
                                .long("esm")
                                .action(ArgAction::SetTrue)
                                .help("Use the ECMAScript-module handler wrapper (Node.js only)."),
                        ),
                )
                .subcommand(
                    Command::new("uninstall")
                        .about("Remove the monitoring layer from one or more functions")
                        .after_help(
                            "This restores each function's original handler and removes the \
                             instrumentation layer and environment variables.  User-owned \
                             configuration is left untouched.",
                        )
                        .arg(function_arg())
                        .arg(aws_region_arg())
                        .arg(aws_profile_arg()),
                ),
        )
        .subcommand(
            Command::new("generate-completions")
                .about("Generate shell completion file")
                .after_help(
                    "This generates a completion script for the shell of choice and prints it \
                     to stdout.  When no shell is given, it is detected from the environment.",
                )
                .arg(
                    Arg::new("format")
                        .value_name("FORMAT")
                        .long("format")
                        .short('f')
                        .value_parser(value_parser!(Shell))
                        .help("Explicitly pick the shell to generate a completion file for."),
                ),
        )
}

fn function_arg() -> Arg {
    Arg::new("function")
        .value_name("FUNCTION")
        .long("function")
        .short('f')
        .action(ArgAction::Append)
        .required(true)
        .help("A Lambda function name or ARN. Repeat to address several functions.")
}

fn aws_region_arg() -> Arg {
    Arg::new("aws_region")
        .value_name("REGION")
        .long("aws-region")
        .help("The AWS region the functions live in. Defaults to the profile's region.")
}

fn aws_profile_arg() -> Arg {
    Arg::new("aws_profile")
        .value_name("PROFILE")
        .long("aws-profile")
        .help("The AWS credentials profile to use.")
}
