//! Reading and layering user configuration.
//!
//! Facts are looked up in the following order, the first layer defining a
//! fact wins:
//! 1. the override layer, usually filled from command line arguments and
//!    environment variables,
//! 2. the project layer, read from [`CONFIG_FILE`] in the project root,
//! 3. discovery, see [`discover`][crate::discover].
//!
//! Empty values count as unset in every layer.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs, io, iter};

use thiserror::Error;

use crate::discover;
use crate::env::{ConfigurationError, EnvironmentInfo};
use crate::fact::Fact;

/// The name of the project config file, relative to the _project root_.
pub const CONFIG_FILE: &str = "app-info.toml";

/// A single layer of configuration, every field is optional.
///
/// Relative paths read from a project config file are relative to the
/// _project root_.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigLayer {
    /// The interpreter version, skips probing the interpreter.
    pub runtime_version: Option<String>,

    /// The framework version, skips reading the framework sources.
    pub framework_version: Option<String>,

    /// The application directory.
    pub app_path: Option<PathBuf>,

    /// The framework directory.
    pub system_path: Option<PathBuf>,

    /// The interpreter to probe for its version.
    ///
    /// Defaults to [`DEFAULT_INTERPRETER`][discover::DEFAULT_INTERPRETER] looked
    /// up in `PATH`.
    pub interpreter: Option<PathBuf>,
}

impl ConfigLayer {
    /// Reads the project layer from the config file in the given root.
    ///
    /// Returns `None` if there is no config file.
    pub fn collect_project(root: &Path) -> Result<Option<Self>, ReadError> {
        let file = root.join(CONFIG_FILE);

        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(?file, "no project config");
                return Ok(None);
            }
            Err(source) => return Err(ReadError::Io { file, source }),
        };

        tracing::debug!(?file, "reading project config");
        let mut layer: Self = match toml::from_str(&content) {
            Ok(layer) => layer,
            Err(source) => return Err(ReadError::Parse { file, source }),
        };

        for path in [&mut layer.app_path, &mut layer.system_path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }

        Ok(Some(layer))
    }
}

/// Returned by [`ConfigLayer::collect_project`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// The config file exists but could not be read.
    #[error("could not read config file {file:?}")]
    Io {
        /// The config file.
        file: PathBuf,

        /// The underlying io error.
        #[source]
        source: io::Error,
    },

    /// The config file is not valid.
    #[error("could not parse config file {file:?}")]
    Parse {
        /// The config file.
        file: PathBuf,

        /// The underlying parsing error.
        #[source]
        source: toml::de::Error,
    },
}

/// The layered configuration for a single project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    root: PathBuf,

    /// The override layer, this takes precedence over all other layers.
    pub overrides: ConfigLayer,

    /// The project layer.
    pub project: Option<ConfigLayer>,
}

impl Config {
    /// Creates a new config for the given root with empty layers.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            overrides: ConfigLayer::default(),
            project: None,
        }
    }

    /// Resolves the project root, this is either the explicitly given root,
    /// which must exist, or the current working directory. The returned root
    /// is always canonical.
    pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf, ConfigurationError> {
        let root = match explicit.filter(|root| !root.as_os_str().is_empty()) {
            Some(root) => root.to_path_buf(),
            None => env::current_dir()
                .map_err(|err| ConfigurationError::with_source(Fact::RootPath, err))?,
        };

        match root.try_exists() {
            Ok(true) => root
                .canonicalize()
                .map_err(|err| ConfigurationError::with_source(Fact::RootPath, err)),
            Ok(false) => Err(ConfigurationError::with_source(
                Fact::RootPath,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("root {root:?} does not exist"),
                ),
            )),
            Err(err) => Err(ConfigurationError::with_source(Fact::RootPath, err)),
        }
    }

    /// Returns the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the layers in order of precedence.
    pub fn layers(&self) -> impl Iterator<Item = &ConfigLayer> {
        iter::once(&self.overrides).chain(self.project.as_ref())
    }

    fn lookup<'a, T: AsRef<OsStr> + ?Sized + 'a>(
        &'a self,
        f: impl FnMut(&'a ConfigLayer) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.layers()
            .filter_map(f)
            .find(|value| !AsRef::<OsStr>::as_ref(*value).is_empty())
    }

    /// Returns the interpreter to probe for the runtime version.
    pub fn interpreter(&self) -> &Path {
        self.lookup(|l| l.interpreter.as_deref())
            .unwrap_or(Path::new(discover::DEFAULT_INTERPRETER))
    }

    /// Resolves all facts, falling back to discovery for those which aren't
    /// configured.
    ///
    /// Paths are resolved first, as the framework version is read from the
    /// resolved system path.
    #[tracing::instrument(skip(self), fields(root = ?self.root))]
    pub fn resolve(&self) -> Result<EnvironmentInfo, ConfigurationError> {
        let app_path = match self.lookup(|l| l.app_path.as_deref()) {
            Some(path) => path.to_path_buf(),
            None => discover::app_path(&self.root)
                .ok_or_else(|| ConfigurationError::missing(Fact::AppPath))?,
        };
        tracing::trace!(?app_path, "resolved app path");

        let system_path = match self.lookup(|l| l.system_path.as_deref()) {
            Some(path) => path.to_path_buf(),
            None => discover::system_path(&self.root)
                .ok_or_else(|| ConfigurationError::missing(Fact::SystemPath))?,
        };
        tracing::trace!(?system_path, "resolved system path");

        let framework_version = match self.lookup(|l| l.framework_version.as_deref()) {
            Some(version) => version.to_owned(),
            None => discover::framework_version(&system_path)
                .map_err(|err| ConfigurationError::with_source(Fact::FrameworkVersion, err))?
                .ok_or_else(|| ConfigurationError::missing(Fact::FrameworkVersion))?,
        };
        tracing::trace!(?framework_version, "resolved framework version");

        let runtime_version = match self.lookup(|l| l.runtime_version.as_deref()) {
            Some(version) => version.to_owned(),
            None => discover::runtime_version(self.interpreter())
                .map_err(|err| ConfigurationError::with_source(Fact::RuntimeVersion, err))?
                .ok_or_else(|| ConfigurationError::missing(Fact::RuntimeVersion))?,
        };
        tracing::trace!(?runtime_version, "resolved runtime version");

        let included_files = discover::included_files()
            .map_err(|err| ConfigurationError::with_source(Fact::IncludedFiles, err))?;

        tracing::debug!("resolved environment");
        Ok(EnvironmentInfo {
            runtime_version,
            framework_version,
            app_path,
            system_path,
            root_path: self.root.clone(),
            included_files,
        })
    }
}
