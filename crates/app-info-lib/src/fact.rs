//! The fixed set of facts reported about an application environment.

use std::fmt::{self, Display};

/// A single fact about the application environment.
///
/// The variants are declared in reporting order, see [`Fact::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fact {
    /// The version of the interpreter running the application.
    RuntimeVersion,

    /// The version of the framework hosting the application.
    FrameworkVersion,

    /// The root directory of the application specific code.
    AppPath,

    /// The root directory of the framework's own code.
    SystemPath,

    /// The top-level project directory.
    RootPath,

    /// The number of files loaded into the running process.
    IncludedFiles,
}

impl Fact {
    /// All facts in the order they are reported in.
    pub const ALL: [Fact; 6] = [
        Fact::RuntimeVersion,
        Fact::FrameworkVersion,
        Fact::AppPath,
        Fact::SystemPath,
        Fact::RootPath,
        Fact::IncludedFiles,
    ];

    /// The label this fact is reported with.
    pub const fn label(self) -> &'static str {
        match self {
            Fact::RuntimeVersion => "PHP Version",
            Fact::FrameworkVersion => "CI Version",
            Fact::AppPath => "APPPATH",
            Fact::SystemPath => "SYSTEMPATH",
            Fact::RootPath => "ROOTPATH",
            Fact::IncludedFiles => "Included files",
        }
    }

    /// The key used for this fact in config files.
    pub const fn key(self) -> &'static str {
        match self {
            Fact::RuntimeVersion => "runtime-version",
            Fact::FrameworkVersion => "framework-version",
            Fact::AppPath => "app-path",
            Fact::SystemPath => "system-path",
            Fact::RootPath => "root",
            Fact::IncludedFiles => "included-files",
        }
    }
}

impl Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
