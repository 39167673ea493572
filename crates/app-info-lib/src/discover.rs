//! Discovering environment facts from a project on disk and the running
//! process.
//!
//! These are used as the last fallback when no config layer defines a fact.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{fs, io};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// The interpreter used to probe the runtime version if none is configured.
pub const DEFAULT_INTERPRETER: &str = "php";

/// The directory of the application code relative to the project root.
pub const APP_DIR: &str = "app";

/// The candidate framework directories relative to the project root, in order
/// of preference.
pub const SYSTEM_DIRS: &[&str] = &["system", "vendor/codeigniter4/framework/system"];

/// The framework file containing the version constant relative to the system
/// directory.
pub const FRAMEWORK_FILE: &str = "CodeIgniter.php";

static FRAMEWORK_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"const\s+CI_VERSION\s*=\s*['"]([^'"]*)['"]\s*;"#)
        .expect("pattern is valid")
});

/// Returns the application directory of the project at `root` if it exists.
pub fn app_path(root: &Path) -> Option<PathBuf> {
    let path = root.join(APP_DIR);
    path.is_dir().then_some(path)
}

/// Returns the first existing framework directory of the project at `root`.
pub fn system_path(root: &Path) -> Option<PathBuf> {
    SYSTEM_DIRS
        .iter()
        .map(|dir| root.join(dir))
        .inspect(|path| tracing::trace!(?path, "checking system path candidate"))
        .find(|path| path.is_dir())
}

/// Reads the framework version from the framework file in `system`.
///
/// Returns `None` if the file doesn't exist or doesn't declare a version.
pub fn framework_version(system: &Path) -> io::Result<Option<String>> {
    let file = system.join(FRAMEWORK_FILE);

    tracing::debug!(?file, "reading framework version");
    match fs::read_to_string(&file) {
        Ok(source) => Ok(parse_framework_version(&source)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Extracts the value of the `CI_VERSION` constant from framework source code.
pub fn parse_framework_version(source: &str) -> Option<String> {
    FRAMEWORK_VERSION
        .captures(source)
        .map(|caps| caps[1].to_owned())
}

/// Asks the given interpreter for its version.
///
/// Returns `None` if the interpreter could not be found.
pub fn runtime_version(interpreter: &Path) -> Result<Option<String>, ProbeError> {
    tracing::debug!(?interpreter, "probing runtime version");

    let output = match Command::new(interpreter)
        .args(["-r", "echo PHP_VERSION;"])
        .output()
    {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ProbeError::Io(err)),
    };

    if !output.status.success() {
        return Err(ProbeError::Failed {
            interpreter: interpreter.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    tracing::trace!(?version, "probed runtime version");
    Ok(Some(version))
}

/// Returns the number of distinct files loaded into the running process.
#[cfg(target_os = "linux")]
pub fn included_files() -> io::Result<usize> {
    Ok(count_mapped_files(&fs::read_to_string("/proc/self/maps")?))
}

/// Returns the number of distinct files loaded into the running process.
///
/// Without a process map this only accounts for the running executable.
#[cfg(not(target_os = "linux"))]
pub fn included_files() -> io::Result<usize> {
    std::env::current_exe().map(|_| 1)
}

/// Counts the distinct file-backed mappings in a `/proc/<pid>/maps` listing.
///
/// Anonymous and pseudo mappings such as `[heap]` are ignored.
pub fn count_mapped_files(maps: &str) -> usize {
    maps.lines()
        .filter_map(|line| line.find('/').map(|idx| line[idx..].trim_end()))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Returned by [`runtime_version`].
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The interpreter exited unsuccessfully.
    #[error("interpreter {interpreter:?} failed: {stderr}")]
    Failed {
        /// The interpreter which was run.
        interpreter: PathBuf,

        /// The captured error output.
        stderr: String,
    },

    /// An io error occurred.
    #[error("an io error occurred")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use tempdir::TempDir;

    use super::*;
    use crate::TOOL_NAME;

    #[test]
    fn test_parse_framework_version() {
        let source = indoc! {r#"
            <?php

            namespace CodeIgniter;

            class CodeIgniter
            {
                /**
                 * The current version of CodeIgniter Framework
                 */
                public const CI_VERSION = '4.4.0';
            }
        "#};

        assert_eq!(parse_framework_version(source).as_deref(), Some("4.4.0"));
        assert_eq!(
            parse_framework_version("const CI_VERSION=\"4.5.1\";").as_deref(),
            Some("4.5.1")
        );
        assert_eq!(parse_framework_version("<?php echo 1;"), None);
    }

    #[test]
    fn test_count_mapped_files() {
        let maps = indoc! {"
            55d0c0a00000-55d0c0a02000 r--p 00000000 08:01 1234    /usr/bin/app-info
            55d0c0a02000-55d0c0a08000 r-xp 00002000 08:01 1234    /usr/bin/app-info
            55d0c1c8e000-55d0c1caf000 rw-p 00000000 00:00 0       [heap]
            7f2b1c000000-7f2b1c021000 rw-p 00000000 00:00 0
            7f2b1d200000-7f2b1d228000 r--p 00000000 08:01 5678    /usr/lib/libc.so.6
            7f2b1d228000-7f2b1d3bd000 r-xp 00028000 08:01 5678    /usr/lib/libc.so.6
            7ffd5e3f1000-7ffd5e412000 rw-p 00000000 00:00 0       [stack]
        "};

        assert_eq!(count_mapped_files(maps), 2);
        assert_eq!(count_mapped_files(""), 0);
    }

    #[test]
    fn test_included_files_counts_self() {
        assert!(included_files().unwrap() >= 1);
    }

    #[test]
    fn test_paths_prefer_first_candidate() {
        let root = TempDir::new(TOOL_NAME).unwrap();
        let root = root.path();

        assert_eq!(app_path(root), None);
        assert_eq!(system_path(root), None);

        fs::create_dir_all(root.join("vendor/codeigniter4/framework/system")).unwrap();
        assert_eq!(
            system_path(root),
            Some(root.join("vendor/codeigniter4/framework/system"))
        );

        fs::create_dir_all(root.join("system")).unwrap();
        fs::create_dir_all(root.join("app")).unwrap();
        assert_eq!(system_path(root), Some(root.join("system")));
        assert_eq!(app_path(root), Some(root.join("app")));
    }

    #[test]
    fn test_framework_version_missing_file() {
        let root = TempDir::new(TOOL_NAME).unwrap();
        assert_eq!(framework_version(root.path()).unwrap(), None);

        fs::write(
            root.path().join(FRAMEWORK_FILE),
            "<?php const CI_VERSION = '4.4.0';",
        )
        .unwrap();
        assert_eq!(
            framework_version(root.path()).unwrap().as_deref(),
            Some("4.4.0")
        );
    }

    #[test]
    fn test_runtime_version_missing_interpreter() {
        let interpreter = Path::new("app-info-interpreter-which-does-not-exist");
        assert_eq!(runtime_version(interpreter).unwrap(), None);
    }
}
