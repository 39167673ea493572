use std::io;
use std::io::{IsTerminal, Write};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use color_eyre::eyre;
use lib::config::ReadError;
use lib::env::ConfigurationError;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_tree::HierarchicalLayer;

use crate::cli::{Context, OperationFailure};
use crate::ui::Ui;

mod cli;
mod command;
mod ui;

fn is_color(color: ColorChoice, is_stderr: bool) -> bool {
    match color {
        ColorChoice::Auto => {
            if is_stderr {
                io::stderr().is_terminal()
            } else {
                io::stdout().is_terminal()
            }
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

fn main() -> ExitCode {
    let args = cli::Args::parse();

    if args.global.output.verbose >= 1 {
        let level = match args.global.output.verbose {
            1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            _ => Level::TRACE,
        };

        tracing_subscriber::registry()
            .with(
                HierarchicalLayer::new(4)
                    .with_targets(true)
                    .with_ansi(is_color(args.global.output.color, true)),
            )
            .with(
                Targets::new()
                    .with_target(std::env!("CARGO_CRATE_NAME"), level)
                    .with_target("app_info_lib", level),
            )
            .init();
    }

    let cc = match args.global.output.color {
        ColorChoice::Auto => termcolor::ColorChoice::Auto,
        ColorChoice::Always => termcolor::ColorChoice::Always,
        ColorChoice::Never => termcolor::ColorChoice::Never,
    };

    let ui = Ui::new(cc, cc);
    let commands = cli::commands();
    let mut ctx = Context::new(&args, &ui, &commands);

    let exit_code = match ctx.run() {
        Ok(()) => cli::EXIT_OK,
        Err(err) => report_error(&ctx, err).unwrap_or(cli::EXIT_ERROR),
    };

    // the streams may already be closed, there is nowhere to report this
    let _ = ui.flush();

    tracing::trace!(exit_code, "exiting");
    ExitCode::from(exit_code)
}

/// Reports an error which was propagated out of a command and returns the
/// exit code for it.
fn report_error(ctx: &Context, err: eyre::Report) -> io::Result<u8> {
    if err.is::<OperationFailure>() {
        return Ok(cli::EXIT_OPERATION_FAILURE);
    }

    if let Some(err) = err.downcast_ref::<ConfigurationError>() {
        tracing::error!(fact = ?err.fact, "configuration error");
        ctx.error_configuration(err)?;
        return Ok(cli::EXIT_OPERATION_FAILURE);
    }

    if let Some(err) = err.downcast_ref::<ReadError>() {
        tracing::error!(?err, "config file error");
        ctx.error_config_file(err)?;
        return Ok(cli::EXIT_OPERATION_FAILURE);
    }

    // NOTE: we ignore broken pipes as these occur when programs close the pipe
    // before we're done writing
    if err
        .root_cause()
        .downcast_ref()
        .is_some_and(|err: &io::Error| err.kind() == io::ErrorKind::BrokenPipe)
    {
        return Ok(cli::EXIT_OK);
    }

    ctx.ui.error_with(|w| {
        writeln!(
            w,
            "app-info ran into an unexpected error, this is most likely a bug"
        )?;
        writeln!(w, "{err:?}")
    })?;

    Ok(cli::EXIT_ERROR)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use lib::fact::Fact;

    use super::*;

    fn exit_code(err: eyre::Report) -> u8 {
        let args = cli::Args::try_parse_from(["app-info", "--color=never"]).unwrap();
        let ui = Ui::new(termcolor::ColorChoice::Never, termcolor::ColorChoice::Never);
        let commands = cli::commands();
        let ctx = Context::new(&args, &ui, &commands);

        report_error(&ctx, err).unwrap()
    }

    #[test]
    fn test_report_error_exit_codes() {
        assert_eq!(
            exit_code(eyre::Report::new(OperationFailure)),
            cli::EXIT_OPERATION_FAILURE
        );
        assert_eq!(
            exit_code(eyre::Report::new(ConfigurationError::missing(Fact::AppPath))),
            cli::EXIT_OPERATION_FAILURE
        );
        assert_eq!(
            exit_code(eyre::Report::new(ReadError::Io {
                file: PathBuf::from("app-info.toml"),
                source: io::Error::other("permission denied"),
            })),
            cli::EXIT_OPERATION_FAILURE
        );
        assert_eq!(
            exit_code(eyre::Report::new(io::Error::from(io::ErrorKind::BrokenPipe))),
            cli::EXIT_OK
        );
        assert_eq!(exit_code(eyre::eyre!("something broke")), cli::EXIT_ERROR);
    }
}
