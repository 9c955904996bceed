//! Rendering of command results.
//!
//! Every command builds one [`Output`] from the global flags and hands it
//! serializable summaries. Table mode goes through `tabled`, the structured
//! formats through serde, plain mode prints one line per record.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub struct Output {
    format: OutputFormat,
    quiet: bool,
    color: bool,
}

impl Output {
    pub fn new(global: &GlobalOpts) -> Self {
        let color = match global.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        };
        Self {
            format: global.output.clone(),
            quiet: global.quiet,
            color,
        }
    }

    /// Whether one JSON document per line is expected instead of text.
    pub fn is_structured(&self) -> bool {
        matches!(
            self.format,
            OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml
        )
    }

    /// Bold the text when color is enabled.
    pub fn emphasis(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }

    /// `on` in green when `value` holds, `off` dimmed otherwise.
    pub fn flag(&self, value: bool, on: &str, off: &str) -> String {
        match (value, self.color) {
            (true, true) => on.green().to_string(),
            (false, true) => off.dimmed().to_string(),
            (true, false) => on.to_owned(),
            (false, false) => off.to_owned(),
        }
    }

    // ── Printing ─────────────────────────────────────────────────────

    pub fn list<T, R>(
        &self,
        records: &[T],
        row: impl Fn(&T) -> R,
        plain: impl Fn(&T) -> String,
    ) -> Result<(), CliError>
    where
        T: Serialize,
        R: Tabled,
    {
        let text = match self.format {
            OutputFormat::Table => {
                let rows: Vec<R> = records.iter().map(row).collect();
                Table::new(rows).with(Style::rounded()).to_string()
            }
            OutputFormat::Plain => records.iter().map(plain).collect::<Vec<_>>().join("\n"),
            _ => self.serialize(records)?,
        };
        self.line(&text)
    }

    /// Table mode prints `detail` since a single record has no columns.
    pub fn single<T: Serialize>(
        &self,
        record: &T,
        detail: impl Fn(&T) -> String,
        plain: impl Fn(&T) -> String,
    ) -> Result<(), CliError> {
        let text = match self.format {
            OutputFormat::Table => detail(record),
            OutputFormat::Plain => plain(record),
            _ => self.serialize(record)?,
        };
        self.line(&text)
    }

    /// Print one line unless quiet. Empty text prints nothing.
    pub fn line(&self, text: &str) -> Result<(), CliError> {
        if self.quiet || text.is_empty() {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "{text}")?;
        Ok(())
    }

    fn serialize<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, CliError> {
        let text = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(data).map_err(io::Error::other)?,
            OutputFormat::JsonCompact => serde_json::to_string(data).map_err(io::Error::other)?,
            _ => serde_json::to_string_pretty(data).map_err(io::Error::other)?,
        };
        Ok(text)
    }
}
