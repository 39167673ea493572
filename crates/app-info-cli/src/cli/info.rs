use color_eyre::eyre;
use lib::config::Config;
use lib::report::InfoReporter;
use termcolor::WriteColor;

use super::Context;
use crate::command::Command;

pub const COMMAND: Command = Command {
    name: "app:info",
    group: "app",
    description: "Displays basic application information.",
    run,
};

/// Resolves the environment completely before writing anything, so a missing
/// fact never produces partial output.
pub fn write_info<W: WriteColor + ?Sized>(w: &mut W, config: &Config) -> eyre::Result<()> {
    let info = config.resolve()?;
    tracing::debug!(?info, "resolved environment");

    InfoReporter::new(info).report(w)?;

    Ok(())
}

pub fn run(ctx: &mut Context, _params: &[String]) -> eyre::Result<()> {
    let config = ctx.config()?;
    write_info(&mut ctx.ui.stdout(), &config)
}
