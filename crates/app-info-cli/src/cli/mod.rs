use std::io;
use std::io::Write;
use std::path::PathBuf;

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::ColorChoice;
use color_eyre::eyre;
use lib::config::{self, Config, ConfigLayer, ReadError};
use lib::env::ConfigurationError;
use lib::fact::Fact;
use termcolor::Color;
use thiserror::Error;

use crate::command::Registry;
use crate::ui::{self, Ui};

pub mod info;
pub mod list;

/// App-info exited successfully.
pub const EXIT_OK: u8 = 0;

/// The requested operation failed gracefully.
pub const EXIT_OPERATION_FAILURE: u8 = 2;

/// An unexpected error occurred.
pub const EXIT_ERROR: u8 = 3;

/// The command which is run if none is given.
pub const DEFAULT_COMMAND: &str = "list";

/// A graceful error, which was already reported.
#[derive(Debug, Error)]
#[error("an operation failed")]
pub struct OperationFailure;

/// Returns the command table with all built-in commands.
pub fn commands() -> Registry {
    let mut registry = Registry::new();
    for command in [info::COMMAND, list::COMMAND] {
        registry
            .register(command)
            .expect("built-in command names are unique");
    }

    registry
}

pub struct Context<'a> {
    /// The parsed top-level arguments.
    pub args: &'a Args,

    /// The terminal ui.
    pub ui: &'a Ui,

    /// The command table.
    pub commands: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(args: &'a Args, ui: &'a Ui, commands: &'a Registry) -> Self {
        tracing::debug!(args = ?args, "creating context");
        Self { args, ui, commands }
    }
}

impl Context<'_> {
    pub fn error_unknown_command(&self, name: &str) -> io::Result<()> {
        let similar = self.commands.find_similar(name);

        self.ui.error_hinted_with(
            |w| {
                write!(w, "Unknown command ")?;
                ui::write_colored(w, Color::Cyan, |w| write!(w, "{name}"))?;
                writeln!(w)
            },
            |w| {
                if similar.is_empty() {
                    write!(w, "Use ")?;
                    ui::write_colored(w, Color::Cyan, |w| write!(w, "{DEFAULT_COMMAND}"))?;
                    return writeln!(w, " to see the available commands");
                }

                write!(w, "Did you mean ")?;
                for (idx, cand) in similar.iter().enumerate() {
                    if idx != 0 {
                        write!(w, ", ")?;
                    }
                    ui::write_colored(w, Color::Cyan, |w| write!(w, "{cand}"))?;
                }
                writeln!(w, "?")
            },
        )
    }

    pub fn error_configuration(&self, error: &ConfigurationError) -> io::Result<()> {
        self.ui.error_hinted_with(
            |w| {
                write!(w, "Could not resolve ")?;
                ui::write_colored(w, Color::Cyan, |w| write!(w, "{}", error.fact))?;
                writeln!(w)?;
                if let Some(source) = &error.source {
                    writeln!(w, "{source}")?;
                }
                Ok(())
            },
            |w| match error.fact {
                Fact::RootPath => {
                    write!(w, "You can pass the project root using ")?;
                    ui::write_colored(w, Color::Cyan, |w| write!(w, "--root <path>"))?;
                    writeln!(w)
                }
                Fact::IncludedFiles => {
                    writeln!(w, "The running process could not be inspected")
                }
                fact => {
                    write!(w, "You can pass it using ")?;
                    ui::write_colored(w, Color::Cyan, |w| write!(w, "--{} <value>", fact.key()))?;
                    write!(w, " or set ")?;
                    ui::write_colored(w, Color::Cyan, |w| write!(w, "{}", fact.key()))?;
                    writeln!(w, " in {}", config::CONFIG_FILE)
                }
            },
        )
    }

    pub fn error_config_file(&self, error: &ReadError) -> io::Result<()> {
        self.ui.error_with(|w| {
            let (file, source) = match error {
                ReadError::Io { file, source } => (file, source as &dyn std::error::Error),
                ReadError::Parse { file, source } => (file, source as &dyn std::error::Error),
            };

            write!(w, "Could not read config file ")?;
            ui::write_colored(w, Color::Cyan, |w| write!(w, "{}", file.display()))?;
            writeln!(w)?;
            writeln!(w, "{source}")
        })
    }

    /// Looks up the requested command and runs it.
    pub fn run(&mut self) -> eyre::Result<()> {
        let name = self.args.command.as_deref().unwrap_or(DEFAULT_COMMAND);

        let Some(command) = self.commands.get(name).copied() else {
            tracing::error!(name, "unknown command");
            self.error_unknown_command(name)?;
            eyre::bail!(OperationFailure);
        };

        let args = self.args;
        tracing::debug!(name = command.name, params = ?args.params, "running command");
        (command.run)(self, &args.params)
    }
}

impl Context<'_> {
    /// Resolve the layered config from the arguments and the project config
    /// file.
    pub fn config(&self) -> eyre::Result<Config> {
        let root = Config::resolve_root(self.args.global.root.as_deref())?;

        let mut config = Config::new(root);
        config.overrides = self.args.global.facts.layer();
        config.project = ConfigLayer::collect_project(config.root())?;

        Ok(config)
    }
}

macro_rules! ansi {
    ($s:expr; b) => {
        concat!("\x1B[1m", $s, "\x1B[0m")
    };
    ($s:expr; u) => {
        concat!("\x1B[4m", $s, "\x1B[0m")
    };
    ($s:expr;) => {
        $s
    };
    ($s:expr; $first:ident $( + $rest:tt)*) => {
        ansi!(ansi!($s; $($rest)*); $first)
    };
}

// NOTE: we use clap style formatting here and keep it simple to avoid a proc
// macro dependency for a single use of static ansi formatting
#[rustfmt::skip]
static AFTER_LONG_ABOUT: &str = concat!(
    ansi!("Exit Codes:\n"; u + b),
    "  ", ansi!("0"; b), "  Success\n",
    "  ", ansi!("2"; b), "  The requested operation failed\n",
    "  ", ansi!("3"; b), "  An unexpected error occurred",
);

/// Parses a path without rejecting empty values, these are treated as unset
/// when the config is resolved.
fn path_parser() -> impl TypedValueParser<Value = PathBuf> {
    OsStringValueParser::new().map(PathBuf::from)
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// The project root directory, defaults to the current directory
    #[arg(long, short, env = "ROOTPATH", value_parser = path_parser(), global = true)]
    pub root: Option<PathBuf>,

    #[command(flatten, next_help_heading = "Environment Options")]
    pub facts: FactArgs,

    #[command(flatten, next_help_heading = "Output Options")]
    pub output: OutputArgs,
}

/// Explicit values for the environment facts, these take precedence over the
/// project config file and discovery.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FactArgs {
    /// The interpreter version, probed from the interpreter if not given
    #[arg(long, env = "PHP_VERSION", value_name = "VERSION", global = true)]
    pub runtime_version: Option<String>,

    /// The framework version, read from the framework sources if not given
    #[arg(long, env = "CI_VERSION", value_name = "VERSION", global = true)]
    pub framework_version: Option<String>,

    /// The application directory, defaults to `<root>/app`
    #[arg(
        long,
        env = "APPPATH",
        value_name = "DIR",
        value_parser = path_parser(),
        global = true
    )]
    pub app_path: Option<PathBuf>,

    /// The framework directory, defaults to `<root>/system`
    #[arg(
        long,
        env = "SYSTEMPATH",
        value_name = "DIR",
        value_parser = path_parser(),
        global = true
    )]
    pub system_path: Option<PathBuf>,

    /// The interpreter to probe for its version, defaults to `php`
    #[arg(
        long,
        env = "APP_INFO_INTERPRETER",
        value_name = "PATH",
        value_parser = path_parser(),
        global = true
    )]
    pub interpreter: Option<PathBuf>,
}

impl FactArgs {
    /// Returns the override config layer for these arguments.
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            runtime_version: self.runtime_version.clone(),
            framework_version: self.framework_version.clone(),
            app_path: self.app_path.clone(),
            system_path: self.system_path.clone(),
            interpreter: self.interpreter.clone(),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// When to use colorful output
    ///
    /// If set to auto, color will only be enabled if a capable terminal is
    /// detected.
    #[clap(
        long,
        value_name = "WHEN",
        require_equals = true,
        num_args = 0..=1,
        default_value = "auto",
        default_missing_value = "always",
        global = true,
    )]
    pub color: ColorChoice,

    /// Produce more logging output [-v ... -vvvvv]
    ///
    /// Logs are written to stderr, the increasing number of verbose flags
    /// corresponds to the log levels ERROR, WARN, INFO, DEBUG, TRACE.
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Display information about a web application environment
#[derive(clap::Parser, Debug, Clone)]
#[command(version, after_long_help = AFTER_LONG_ABOUT)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run, use `list` to see all commands
    pub command: Option<String>,

    /// Parameters passed on to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use lib::TOOL_NAME;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_builtin_commands() {
        let commands = commands();

        assert!(commands.get("app:info").is_some());
        assert!(commands.get("list").is_some());
        assert_eq!(commands.iter().len(), 2);
    }

    #[test]
    fn test_args_command_optional() {
        let args = Args::try_parse_from(["app-info"]).unwrap();
        assert_eq!(args.command, None);

        let args = Args::try_parse_from(["app-info", "app:info"]).unwrap();
        assert_eq!(args.command.as_deref(), Some("app:info"));
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "app-info",
            "app:info",
            "--runtime-version",
            "8.2.0",
            "--app-path",
            "/app",
            "--color=never",
            "-vv",
        ])
        .unwrap();

        let layer = args.global.facts.layer();
        assert_eq!(layer.runtime_version.as_deref(), Some("8.2.0"));
        assert_eq!(layer.app_path, Some(PathBuf::from("/app")));
        assert_eq!(args.global.output.color, ColorChoice::Never);
        assert_eq!(args.global.output.verbose, 2);
    }

    #[test]
    fn test_args_params_collected() {
        let args = Args::try_parse_from(["app-info", "app:info", "extra"]).unwrap();
        assert_eq!(args.command.as_deref(), Some("app:info"));
        assert_eq!(args.params, ["extra"]);

        let args =
            Args::try_parse_from(["app-info", "app:info", "extra", "--unknown", "-x"]).unwrap();
        assert_eq!(args.params, ["extra", "--unknown", "-x"]);

        let args = Args::try_parse_from(["app-info", "list"]).unwrap();
        assert!(args.params.is_empty());
    }

    #[test]
    fn test_args_empty_values_accepted() {
        let args = Args::try_parse_from([
            "app-info",
            "list",
            "--root=",
            "--app-path=",
            "--system-path=",
            "--interpreter=",
        ])
        .unwrap();
        assert_eq!(args.command.as_deref(), Some("list"));
        assert_eq!(args.global.root, Some(PathBuf::new()));

        let args = Args::try_parse_from(["app-info", "app:info", "--framework-version="]).unwrap();
        assert_eq!(args.global.facts.framework_version.as_deref(), Some(""));
    }

    #[test]
    fn test_context_config_layers_args_over_project() {
        let root = TempDir::new(TOOL_NAME).unwrap();
        fs::create_dir_all(root.path().join("app")).unwrap();
        fs::create_dir_all(root.path().join("system")).unwrap();
        fs::write(
            root.path().join(config::CONFIG_FILE),
            "runtime-version = '7.4.0'\nframework-version = '4.4.0'\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "app-info",
            "app:info",
            "--root",
            root.path().to_str().unwrap(),
            "--runtime-version=8.2.0",
            "--framework-version=",
        ])
        .unwrap();
        let ui = Ui::new(termcolor::ColorChoice::Never, termcolor::ColorChoice::Never);
        let commands = commands();
        let ctx = Context::new(&args, &ui, &commands);

        let config = ctx.config().unwrap();
        let root = root.path().canonicalize().unwrap();
        assert_eq!(config.root(), root);

        let info = config.resolve().unwrap();
        assert_eq!(info.runtime_version, "8.2.0");
        assert_eq!(info.framework_version, "4.4.0");
        assert_eq!(info.app_path, root.join("app"));
        assert_eq!(info.system_path, root.join("system"));
        assert_eq!(info.root_path, root);
    }

    #[test]
    fn test_context_config_malformed_project() {
        let root = TempDir::new(TOOL_NAME).unwrap();
        fs::write(root.path().join(config::CONFIG_FILE), "app_path = 'app'\n").unwrap();

        let args = Args::try_parse_from([
            "app-info",
            "app:info",
            "--root",
            root.path().to_str().unwrap(),
        ])
        .unwrap();
        let ui = Ui::new(termcolor::ColorChoice::Never, termcolor::ColorChoice::Never);
        let commands = commands();
        let ctx = Context::new(&args, &ui, &commands);

        let err = ctx.config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReadError>(),
            Some(ReadError::Parse { .. })
        ));
    }
}
