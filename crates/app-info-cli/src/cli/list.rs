use std::io;
use std::io::Write;

use color_eyre::eyre;
use termcolor::{Color, WriteColor};

use super::Context;
use crate::command::{Command, Registry};
use crate::ui::{self, Indented};

pub const COMMAND: Command = Command {
    name: "list",
    group: "app-info",
    description: "Lists the available commands.",
    run,
};

/// Writes all commands of the registry below their group headings.
pub fn write_commands<W: WriteColor + ?Sized>(w: &mut W, registry: &Registry) -> io::Result<()> {
    let width = registry.iter().map(|c| c.name.len()).max().unwrap_or(0);

    for (idx, (group, commands)) in registry.groups().into_iter().enumerate() {
        if idx != 0 {
            writeln!(w)?;
        }

        ui::write_bold(w, |w| writeln!(w, "{group}"))?;

        let w = &mut Indented::new(&mut *w, 2);
        for command in commands {
            ui::write_colored(w, Color::Green, |w| {
                write!(w, "{:<width$}", command.name)
            })?;
            writeln!(w, "  {}", command.description)?;
        }
    }

    Ok(())
}

pub fn run(ctx: &mut Context, _params: &[String]) -> eyre::Result<()> {
    let mut w = ctx.ui.stdout();
    write_commands(&mut w, ctx.commands)?;
    w.flush()?;

    Ok(())
}
