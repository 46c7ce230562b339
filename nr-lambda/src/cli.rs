use std::io;

use anyhow::{bail, Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use clap::ArgMatches;
use clap_complete::Shell;
use nr_lambda_aws::{AwsControlPlane, HostedLayerIndex};
use nr_lambda_layers::{
    install, uninstall, InstallOptions, InstallStatus, LogToggle, UninstallOptions,
    UninstallStatus,
};

use crate::cliapp::make_app;
use crate::prompt::TerminalPrompt;
use crate::setup;

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let matches = make_app().get_matches();
    setup::init_logging(&matches);

    if let Some(matches) = matches.subcommand_matches("layers") {
        match matches.subcommand() {
            Some(("install", matches)) => install_command(matches),
            Some(("uninstall", matches)) => uninstall_command(matches),
            _ => unreachable!(),
        }
    } else if let Some(matches) = matches.subcommand_matches("generate-completions") {
        generate_completions(matches)
    } else {
        unreachable!()
    }
}

/// Resolves the AWS session from the profile chain and command line overrides.
async fn aws_session(matches: &ArgMatches) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = matches.get_one::<String>("aws_region") {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = matches.get_one::<String>("aws_profile") {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

fn session_region(session: &SdkConfig) -> Result<String> {
    session
        .region()
        .map(|region| region.to_string())
        .context("no AWS region configured, pass --aws-region or set AWS_REGION")
}

fn functions(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("function")
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn install_command(matches: &ArgMatches) -> Result<()> {
    let account_id = *matches
        .get_one::<u64>("account_id")
        .context("missing account id")?;

    runtime()?.block_on(async {
        let session = aws_session(matches).await;
        let region = session_region(&session)?;

        let options = InstallOptions {
            nr_region: matches.get_one::<String>("nr_region").cloned(),
            license_key: matches.get_one::<String>("license_key").cloned(),
            enable_extension: matches.get_flag("enable_extension"),
            function_logs: LogToggle::from_flags(
                matches.get_flag("send_function_logs"),
                matches.get_flag("disable_function_logs"),
            ),
            extension_logs: LogToggle::from_flags(
                matches.get_flag("send_extension_logs"),
                matches.get_flag("disable_extension_logs"),
            ),
            upgrade: matches.get_flag("upgrade"),
            apm: matches.get_flag("apm"),
            esm: matches.get_flag("esm"),
            ..InstallOptions::new(account_id, region.clone())
        };

        let aws = AwsControlPlane::new(&session);
        let index = HostedLayerIndex::new(&region);

        // Functions are independent; one failing must not keep the rest from being
        // instrumented.
        let mut failures = 0;
        for function in functions(matches) {
            match install(&aws, &index, &TerminalPrompt, &options, &function).await {
                Ok(InstallStatus::NotFound) => failures += 1,
                Ok(_) => (),
                Err(err) => {
                    nr_lambda_log::error!("failed to instrument function {function}: {err}");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            bail!("failed to instrument {failures} function(s)");
        }
        Ok(())
    })
}

fn uninstall_command(matches: &ArgMatches) -> Result<()> {
    runtime()?.block_on(async {
        let session = aws_session(matches).await;
        let options = UninstallOptions::new(session_region(&session)?);
        let aws = AwsControlPlane::new(&session);

        let mut failures = 0;
        for function in functions(matches) {
            match uninstall(&aws, &options, &function).await {
                Ok(UninstallStatus::NotFound) => failures += 1,
                Ok(_) => (),
                Err(err) => {
                    nr_lambda_log::error!(
                        "failed to remove instrumentation from function {function}: {err}"
                    );
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            bail!("failed to de-instrument {failures} function(s)");
        }
        Ok(())
    })
}

fn generate_completions(matches: &ArgMatches) -> Result<()> {
    let shell = match matches.get_one::<Shell>("format").copied() {
        Some(shell) => shell,
        None => Shell::from_env().context("cannot detect shell, pass --format explicitly")?,
    };

    clap_complete::generate(shell, &mut make_app(), "nr-lambda", &mut io::stdout());
    Ok(())
}
