//! Resolved application environments and the facts derived from them.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::fact::Fact;

/// A fully resolved application environment.
///
/// This is usually created by [`Config::resolve`][crate::config::Config::resolve],
/// but can be constructed directly when the values are already known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentInfo {
    /// The version of the interpreter running the application.
    pub runtime_version: String,

    /// The version of the framework hosting the application.
    pub framework_version: String,

    /// The root directory of the application specific code.
    pub app_path: PathBuf,

    /// The root directory of the framework's own code.
    pub system_path: PathBuf,

    /// The top-level project directory.
    pub root_path: PathBuf,

    /// The number of files loaded into the running process.
    pub included_files: usize,
}

impl EnvironmentInfo {
    /// Returns the rendered value of a single fact.
    pub fn value(&self, fact: Fact) -> String {
        match fact {
            Fact::RuntimeVersion => self.runtime_version.clone(),
            Fact::FrameworkVersion => self.framework_version.clone(),
            Fact::AppPath => self.app_path.display().to_string(),
            Fact::SystemPath => self.system_path.display().to_string(),
            Fact::RootPath => self.root_path.display().to_string(),
            Fact::IncludedFiles => self.included_files.to_string(),
        }
    }

    /// Returns the ordered facts of this environment.
    pub fn facts(&self) -> EnvironmentFacts {
        EnvironmentFacts {
            values: Fact::ALL.map(|fact| (fact, self.value(fact))),
        }
    }
}

/// The ordered `(label, value)` pairs of an [`EnvironmentInfo`].
///
/// There is always exactly one entry per [`Fact`] in the order of
/// [`Fact::ALL`], empty values are kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentFacts {
    values: [(Fact, String); 6],
}

impl EnvironmentFacts {
    /// Returns an iterator over the labels and values.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&'static str, &str)> + '_ {
        self.values
            .iter()
            .map(|(fact, value)| (fact.label(), value.as_str()))
    }

    /// Returns the value for the given fact.
    pub fn get(&self, fact: Fact) -> &str {
        // the array is built from Fact::ALL, so the index matches the variant
        &self.values[fact as usize].1
    }

    /// Returns the number of facts, this is always `6`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Returned when a fact of the environment could not be resolved.
#[derive(Debug, Error)]
#[error("could not resolve {fact}")]
pub struct ConfigurationError {
    /// The fact which could not be resolved.
    pub fact: Fact,

    /// The underlying error, if any.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ConfigurationError {
    /// Creates an error for a fact which was not found in any layer.
    pub fn missing(fact: Fact) -> Self {
        Self { fact, source: None }
    }

    /// Creates an error for a fact whose discovery failed.
    pub fn with_source<E>(fact: Fact, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            fact,
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
pub(crate) fn example() -> EnvironmentInfo {
    EnvironmentInfo {
        runtime_version: "8.2.0".into(),
        framework_version: "4.4.0".into(),
        app_path: "/app".into(),
        system_path: "/system".into(),
        root_path: "/root".into(),
        included_files: 150,
    }
}
