//! Diagnostics: severities, localized rendering and the reporting sink.
//!
//! A [`Diagnostic`] only records a message key and its arguments. Text is
//! produced when the [`DiagnosticReporter`] emits it, in the reporter's
//! locale.

mod catalog;
mod version;

pub use catalog::{format_message, CatalogError, Locale, MessageCatalog};
pub use version::{release, version};

use std::io::Write;

use crate::error::TaskError;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn prefix_key(self) -> &'static str {
        match self {
            Severity::Error => "err.prefix",
            Severity::Warning => "warn.prefix",
            Severity::Note => "note.prefix",
        }
    }
}

/// A message key plus positional arguments at a severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub key: String,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, key: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            severity,
            key: key.into(),
            args,
        }
    }

    pub fn error(key: &str, args: &[&str]) -> Self {
        Self::new(Severity::Error, key, to_owned(args))
    }

    pub fn warning(key: &str, args: &[&str]) -> Self {
        Self::new(Severity::Warning, key, to_owned(args))
    }

    pub fn note(key: &str, args: &[&str]) -> Self {
        Self::new(Severity::Note, key, to_owned(args))
    }

    /// Render the message body (without the severity prefix).
    pub fn render(&self, catalog: &MessageCatalog, locale: &Locale) -> Result<String, TaskError> {
        catalog.lookup(locale, &self.key, &self.args)
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Writes localized diagnostics to a sink.
pub struct DiagnosticReporter<'a> {
    sink: &'a mut dyn Write,
    catalog: &'a MessageCatalog,
    locale: Locale,
    errors: usize,
    warnings: usize,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(sink: &'a mut dyn Write, catalog: &'a MessageCatalog, locale: Locale) -> Self {
        Self {
            sink,
            catalog,
            locale,
            errors: 0,
            warnings: 0,
        }
    }

    /// Emit `prefix message` on one line.
    ///
    /// Fails only when a message key is missing from the catalog.
    pub fn report(&mut self, diagnostic: &Diagnostic) -> Result<(), TaskError> {
        let prefix = self
            .catalog
            .lookup(&self.locale, diagnostic.severity.prefix_key(), &[])?;
        let message = diagnostic.render(self.catalog, &self.locale)?;

        tracing::debug!(
            key = %diagnostic.key,
            severity = ?diagnostic.severity,
            "Reporting diagnostic"
        );

        self.write_line(&format!("{} {}", prefix, message));
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        Ok(())
    }

    pub fn error(&mut self, key: &str, args: &[&str]) -> Result<(), TaskError> {
        self.report(&Diagnostic::error(key, args))
    }

    pub fn warning(&mut self, key: &str, args: &[&str]) -> Result<(), TaskError> {
        self.report(&Diagnostic::warning(key, args))
    }

    pub fn note(&mut self, key: &str, args: &[&str]) -> Result<(), TaskError> {
        self.report(&Diagnostic::note(key, args))
    }

    /// Render a message in the reporter's locale without emitting it.
    pub fn message(&self, key: &str, args: &[String]) -> Result<String, TaskError> {
        self.catalog.lookup(&self.locale, key, args)
    }

    /// Emit a localized message without a severity prefix.
    pub fn println(&mut self, key: &str, args: &[String]) -> Result<(), TaskError> {
        let message = self.message(key, args)?;
        self.write_line(&message);
        Ok(())
    }

    /// Last resort when the catalog itself cannot render: the key and its
    /// arguments, unlocalized.
    pub fn report_raw(&mut self, key: &str, args: &[String]) {
        self.write_line(&format!("{} {}", key, args.join(" ")));
        self.errors += 1;
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!(error = %e, "Failed to flush diagnostics");
        }
    }

    /// The sink is the last place to report to, so a failed write is only logged.
    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.sink, "{}", line) {
            tracing::warn!(error = %e, "Failed to write diagnostic");
        }
    }
}
