//! Rendering environment facts for humans.

use std::io;
use std::io::Write;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::env::EnvironmentInfo;

/// The color values are highlighted with.
pub const HIGHLIGHT: Color = Color::Yellow;

/// Writes the facts of an [`EnvironmentInfo`] as labeled lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoReporter {
    info: EnvironmentInfo,
}

impl InfoReporter {
    /// Creates a new reporter for the given environment.
    pub fn new(info: EnvironmentInfo) -> Self {
        Self { info }
    }

    /// Returns the environment this reporter writes.
    pub fn info(&self) -> &EnvironmentInfo {
        &self.info
    }

    /// Writes one `<label>: <value>` line per fact and flushes the writer.
    ///
    /// Values are written in [`HIGHLIGHT`] if the writer supports color.
    pub fn report<W: WriteColor + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        for (label, value) in self.info.facts().iter() {
            write!(w, "{label}: ")?;
            w.set_color(ColorSpec::new().set_fg(Some(HIGHLIGHT)))?;
            write!(w, "{value}")?;
            w.reset()?;
            writeln!(w)?;
        }

        w.flush()
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use regex::Regex;
    use termcolor::{Ansi, NoColor};

    use super::*;
    use crate::env;

    fn render_plain(reporter: &InfoReporter) -> String {
        let mut w = NoColor::new(vec![]);
        reporter.report(&mut w).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    fn render_ansi(reporter: &InfoReporter) -> String {
        let mut w = Ansi::new(vec![]);
        reporter.report(&mut w).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn test_report_plain() {
        let reporter = InfoReporter::new(env::example());

        assert_snapshot!(render_plain(&reporter), @r"
        PHP Version: 8.2.0
        CI Version: 4.4.0
        APPPATH: /app
        SYSTEMPATH: /system
        ROOTPATH: /root
        Included files: 150
        ");
    }

    #[test]
    fn test_report_line_shape() {
        let reporter = InfoReporter::new(env::example());
        let out = render_plain(&reporter);

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(out.ends_with('\n'));

        let labels: Vec<_> = lines
            .iter()
            .map(|line| line.split_once(": ").unwrap().0)
            .collect();
        assert_eq!(
            labels,
            [
                "PHP Version",
                "CI Version",
                "APPPATH",
                "SYSTEMPATH",
                "ROOTPATH",
                "Included files"
            ]
        );

        let count = lines[5].strip_prefix("Included files: ").unwrap();
        assert!(count.parse::<u64>().is_ok());
    }

    #[test]
    fn test_report_colored_strips_to_plain() {
        let reporter = InfoReporter::new(env::example());
        let colored = render_ansi(&reporter);

        assert!(colored.contains("\x1B[33m8.2.0"));

        let escapes = Regex::new("\x1B\\[[0-9;]*m").unwrap();
        assert_eq!(escapes.replace_all(&colored, ""), render_plain(&reporter));
    }

    #[test]
    fn test_report_idempotent() {
        let reporter = InfoReporter::new(env::example());
        assert_eq!(render_ansi(&reporter), render_ansi(&reporter));
        assert_eq!(render_plain(&reporter), render_plain(&reporter));
    }

    #[test]
    fn test_report_empty_value() {
        let mut info = env::example();
        info.runtime_version.clear();

        let out = render_plain(&InfoReporter::new(info));
        assert_eq!(out.lines().count(), 6);
        assert_eq!(out.lines().next(), Some("PHP Version: "));
    }
}
