//! Binary entry point for the snapwarden CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;

use snapwarden::config::ConfigError;
use snapwarden::logging::{self, LoggingError};
use snapwarden::{
    AwsCliClient, AwsCliError, EventError, HandlerError, SnapwardenConfig, SystemClock,
    TriggerEvent, handler,
};

mod cli;

use cli::{Cli, EventArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Handler(#[from] HandlerError<AwsCliError>),
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = SnapwardenConfig::load_without_cli_args()?;
    config.validate()?;
    logging::init(&config.log_filter, config.json_logs)?;
    let client = AwsCliClient::with_process_runner(config.aws_cli_config()?);

    match cli {
        Cli::Create(args) => {
            let event = load_event(&args)?;
            handler::make_snapshots(&event, client, SystemClock)?;
        }
        Cli::Prune(args) => {
            let event = load_event(&args)?;
            handler::delete_old_snapshots(
                &event,
                client,
                SystemClock,
                config.default_retention(),
            )?;
        }
    }
    Ok(())
}

fn load_event(args: &EventArgs) -> Result<TriggerEvent, EventError> {
    match (&args.event, &args.event_file) {
        (Some(payload), _) => TriggerEvent::from_json(payload),
        (None, Some(path)) => TriggerEvent::from_file(path),
        (None, None) => Ok(TriggerEvent::default()),
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
