//! Command line interface for instrumenting AWS Lambda functions with New Relic.
//!
//! The binary wires the workspace crates together:
//!
//!  - `nr-lambda`: Main entry point and command line interface.
//!  - [`nr-lambda-aws`]: Control-plane clients for Lambda, IAM, CloudFormation and the hosted
//!    layer index.
//!  - [`nr-lambda-layers`]: The reconciliation engine computing install and uninstall updates.
//!  - [`nr-lambda-log`]: Logging facade for all crates.
//!
//! [`nr-lambda-aws`]: ../nr_lambda_aws/index.html
//! [`nr-lambda-layers`]: ../nr_lambda_layers/index.html
//! [`nr-lambda-log`]: ../nr_lambda_log/index.html

mod cli;
mod cliapp;
mod prompt;
mod setup;

use std::process;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            nr_lambda_log::error!("{err:#}");
            1
        }
    };

    process::exit(exit_code);
}
