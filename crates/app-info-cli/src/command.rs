//! The command table used by the dispatcher.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use color_eyre::eyre;
use thiserror::Error;

use crate::cli::Context;

/// A command which can be registered in a [`Registry`].
#[derive(Clone, Copy)]
pub struct Command {
    /// The name the command is invoked by, e.g. `app:info`.
    pub name: &'static str,

    /// The group this command is listed under.
    pub group: &'static str,

    /// A short single line description.
    pub description: &'static str,

    /// The function executing this command, it receives the remaining
    /// command line words as parameters.
    pub run: fn(&mut Context<'_>, &[String]) -> eyre::Result<()>,
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// A table of commands, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Command>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command to the table.
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.get(command.name).is_some() {
            return Err(RegistryError::Duplicate {
                name: command.name,
            });
        }

        tracing::trace!(name = command.name, "registered command");
        self.commands.push(command);
        Ok(())
    }

    /// Returns the command with exactly the given name.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.name == name)
    }

    /// Returns an iterator over all commands in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Command> {
        self.commands.iter()
    }

    /// Returns the commands by group, both groups and commands are sorted by
    /// name.
    pub fn groups(&self) -> BTreeMap<&'static str, Vec<&Command>> {
        let mut groups = BTreeMap::<_, Vec<_>>::new();
        for command in &self.commands {
            groups.entry(command.group).or_default().push(command);
        }

        for commands in groups.values_mut() {
            commands.sort_by_key(|command| command.name);
        }

        groups
    }

    /// Find command names similar to the given name.
    pub fn find_similar(&self, name: &str) -> Vec<&'static str> {
        self.commands
            .iter()
            .map(|command| command.name)
            .filter(|cand| strsim::jaro(name, cand) > 0.7)
            .collect()
    }
}

/// Returned by [`Registry::register`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A command with the same name was already registered.
    #[error("a command named {name:?} is already registered")]
    Duplicate {
        /// The name of the command.
        name: &'static str,
    },
}
