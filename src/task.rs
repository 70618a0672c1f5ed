//! One disassembly run, from raw arguments to exit status.

use std::io::{self, Write};
use std::time::Duration;

use crate::classfile::{Disassembler, EngineError};
use crate::diagnostics::{release, version, Diagnostic, DiagnosticReporter, Locale, MessageCatalog, Severity};
use crate::error::{ExitStatus, TaskError};
use crate::options::{help_key_for, option_registry, parse_args, OptionDef, TaskConfig};
use crate::resolver::{ClassResolver, DEFAULT_URL_TIMEOUT};
use crate::search::{ModuleLocator, SearchPathProvider, PROVIDER_OPTIONS};

/// How standard output is named in I/O diagnostics.
const STDOUT_NAME: &str = "<stdout>";

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    ParsingOptions,
    HelpRequested,
    VersionRequested,
    Ready,
    ProcessingClasses,
    Terminated,
}

/// A failure that abandons the remaining classes.
enum Fatal {
    Internal(TaskError),
    Crash(anyhow::Error),
}

impl From<TaskError> for Fatal {
    fn from(e: TaskError) -> Self {
        Fatal::Internal(e)
    }
}

pub struct TaskDriver<'a> {
    provider: Box<dyn SearchPathProvider>,
    engine: Box<dyn Disassembler>,
    registry: Vec<OptionDef>,
    catalog: &'a MessageCatalog,
    locale: Locale,
    url_timeout: Duration,
    program: String,
    state: TaskState,
}

impl<'a> TaskDriver<'a> {
    pub fn new(
        provider: Box<dyn SearchPathProvider>,
        engine: Box<dyn Disassembler>,
        catalog: &'a MessageCatalog,
    ) -> Self {
        Self {
            provider,
            engine,
            registry: option_registry(),
            catalog,
            locale: Locale::root(),
            url_timeout: DEFAULT_URL_TIMEOUT,
            program: env!("CARGO_PKG_NAME").to_string(),
            state: TaskState::Idle,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_url_timeout(mut self, timeout: Duration) -> Self {
        self.url_timeout = timeout;
        self
    }

    pub fn with_registry(mut self, registry: Vec<OptionDef>) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn advance(&mut self, next: TaskState) {
        tracing::debug!(from = ?self.state, to = ?next, "Task state");
        self.state = next;
    }

    /// Run once. Output goes to `out`, diagnostics to `err`.
    ///
    /// The search path is closed and both sinks flushed on every path.
    pub fn run(&mut self, args: &[String], out: &mut dyn Write, err: &mut dyn Write) -> ExitStatus {
        let mut out = scopeguard::guard(out, |out| {
            if let Err(e) = out.flush() {
                tracing::warn!(error = %e, "Failed to flush output");
            }
        });
        let mut reporter = DiagnosticReporter::new(err, self.catalog, self.locale.clone());

        let mut status = self.execute(args, &mut **out, &mut reporter);

        if let Err(e) = self.provider.close() {
            tracing::warn!(error = %e, "Failed to close search path");
            let error = TaskError::internal("err.provider.close", vec![e.to_string()]);
            status = report_internal(&mut reporter, &error);
        }
        self.advance(TaskState::Terminated);
        reporter.flush();

        tracing::debug!(status = ?status, errors = reporter.error_count(), "Run finished");
        status
    }

    fn execute(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
        reporter: &mut DiagnosticReporter<'_>,
    ) -> ExitStatus {
        self.advance(TaskState::ParsingOptions);
        let config = match parse_args(args, &self.registry, self.provider.as_mut()) {
            Ok(config) => config,
            Err(e) => return self.report_task_error(reporter, &e),
        };

        if config.wants_help_or_version() {
            let mut text = String::new();
            if config.help {
                self.advance(TaskState::HelpRequested);
                match self.help_text(reporter) {
                    Ok(help) => text.push_str(&help),
                    Err(e) => return report_internal(reporter, &e),
                }
            }
            if config.version || config.full_version {
                self.advance(TaskState::VersionRequested);
                match version_text(reporter, &config) {
                    Ok(version) => text.push_str(&version),
                    Err(e) => return report_internal(reporter, &e),
                }
            }
            if let Err(e) = out.write_all(text.as_bytes()) {
                tracing::warn!(error = %e, "Failed to write help or version output");
                return match reporter.error("err.ioerror", &[STDOUT_NAME, &e.to_string()]) {
                    Ok(()) => ExitStatus::Error,
                    Err(e) => report_internal(reporter, &e),
                };
            }
            return ExitStatus::Ok;
        }

        self.advance(TaskState::Ready);
        let module = match &config.module_name {
            Some(name) => match self.locate_module(name, reporter) {
                Ok(Some(location)) => Some(location),
                Ok(None) => return ExitStatus::Error,
                Err(e) => return report_internal(reporter, &e),
            },
            None => None,
        };

        self.advance(TaskState::ProcessingClasses);
        let resolver = ClassResolver::new(self.provider.as_ref())
            .in_module(module.as_ref())
            .with_url_timeout(self.url_timeout);

        let mut status = ExitStatus::Ok;
        for class in &config.classes {
            status = match self.process_class(&resolver, class, &config, out, reporter) {
                Ok(status) => status,
                Err(Fatal::Internal(e)) => return report_internal(reporter, &e),
                Err(Fatal::Crash(e)) => return report_crash(reporter, &e),
            };
            tracing::debug!(class = %class, status = ?status, "Processed class");
        }
        status
    }

    /// `Ok(None)` when the module was not found and the error is reported.
    fn locate_module(
        &self,
        name: &str,
        reporter: &mut DiagnosticReporter<'_>,
    ) -> Result<Option<crate::search::Location>, TaskError> {
        match ModuleLocator::new(self.provider.as_ref()).locate(name) {
            Ok(Some(location)) => Ok(Some(location)),
            Ok(None) => {
                reporter.error("err.cant.find.module", &[name])?;
                Ok(None)
            }
            Err(e) => {
                reporter.error("err.cant.find.module.ex", &[name, &e.to_string()])?;
                Ok(None)
            }
        }
    }

    fn process_class(
        &self,
        resolver: &ClassResolver<'_>,
        name: &str,
        config: &TaskConfig,
        out: &mut dyn Write,
        reporter: &mut DiagnosticReporter<'_>,
    ) -> Result<ExitStatus, Fatal> {
        let resource = match resolver.resolve(name) {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                reporter.error("err.class.not.found", &[name])?;
                return Ok(ExitStatus::Error);
            }
            Err(e) => return engine_failure(reporter, name, e.into()),
        };
        let resource_name = resource.name();

        let text = self.engine.read(&resource).and_then(|info| {
            if !name.ends_with(".class")
                && !info.is_module_info()
                && info.dotted_name() != name.replace(['/', '$'], ".")
            {
                reporter.warning("warn.unexpected.class", &[&resource_name, name])?;
            }
            self.engine.write(&info, config)
        });

        match text {
            Ok(text) => match out.write_all(text.as_bytes()) {
                Ok(()) => Ok(ExitStatus::Ok),
                Err(e) => engine_failure(reporter, &resource_name, e.into()),
            },
            Err(e) => engine_failure(reporter, &resource_name, e),
        }
    }

    fn report_task_error(&self, reporter: &mut DiagnosticReporter<'_>, error: &TaskError) -> ExitStatus {
        match error {
            TaskError::BadArgs {
                key,
                args,
                show_usage,
            } => {
                let reported = reporter
                    .report(&Diagnostic::new(Severity::Error, *key, args.clone()))
                    .and_then(|()| {
                        if *show_usage {
                            reporter.println("main.usage.summary", &[self.program.clone()])
                        } else {
                            Ok(())
                        }
                    });
                match reported {
                    Ok(()) => error.exit_status(),
                    Err(e) => report_internal(reporter, &e),
                }
            }
            TaskError::Internal { .. } => report_internal(reporter, error),
        }
    }

    fn help_text(&self, reporter: &DiagnosticReporter<'_>) -> Result<String, TaskError> {
        let mut lines = vec![reporter.message("main.usage", &[self.program.clone()])?];
        for option in self.registry.iter().filter(|o| !o.hidden) {
            lines.push(reporter.message(&option.help_key(), &[])?);
        }
        for name in PROVIDER_OPTIONS
            .iter()
            .filter(|name| self.provider.is_supported_option(name))
        {
            lines.push(reporter.message(&help_key_for(name), &[])?);
        }
        lines.push(reporter.message("main.usage.foot", &[])?);

        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }
}

fn version_text(reporter: &DiagnosticReporter<'_>, config: &TaskConfig) -> Result<String, TaskError> {
    let mut text = String::new();
    if config.version {
        text.push_str(release());
        text.push('\n');
    }
    if config.full_version {
        match version("full") {
            Some(full) => text.push_str(full),
            None => text.push_str(&reporter.message("version.unknown", &[release().to_string()])?),
        }
        text.push('\n');
    }
    Ok(text)
}

/// Report a per-class engine error. Internal and unclassified errors end
/// the run and are handed back.
fn engine_failure(
    reporter: &mut DiagnosticReporter<'_>,
    name: &str,
    error: EngineError,
) -> Result<ExitStatus, Fatal> {
    match error {
        EngineError::Io(e) => {
            match e.kind() {
                io::ErrorKind::UnexpectedEof => reporter.error("err.end.of.file", &[name])?,
                io::ErrorKind::NotFound => reporter.error("err.file.not.found", &[name])?,
                _ => reporter.error("err.ioerror", &[name, &e.to_string()])?,
            }
            Ok(ExitStatus::Error)
        }
        EngineError::Format(e) => {
            let key = e.message_key();
            if key == "err.end.of.file" {
                reporter.error(key, &[name])?;
            } else {
                reporter.error(key, &[name, &e.to_string()])?;
            }
            Ok(ExitStatus::Error)
        }
        EngineError::OutOfMemory => {
            reporter.error("err.nomem", &[])?;
            Ok(ExitStatus::Error)
        }
        EngineError::Internal { key, args } => Err(Fatal::Internal(TaskError::internal(key, args))),
        EngineError::Other(e) => Err(Fatal::Crash(e)),
    }
}

fn report_internal(reporter: &mut DiagnosticReporter<'_>, error: &TaskError) -> ExitStatus {
    let (key, args) = match error {
        TaskError::Internal { key, args } => (key.as_str(), args.clone()),
        TaskError::BadArgs { key, args, .. } => (*key, args.clone()),
    };
    tracing::error!(key = %key, args = ?args, "Internal error");

    let detail = reporter
        .message(key, &args)
        .unwrap_or_else(|_| format!("{} {}", key, args.join(" ")).trim_end().to_string());
    let diagnostic = Diagnostic::new(Severity::Error, "err.internal.error", vec![detail.clone()]);
    if reporter.report(&diagnostic).is_err() {
        reporter.report_raw("err.internal.error", &[detail]);
    }
    ExitStatus::Abnormal
}

fn report_crash(reporter: &mut DiagnosticReporter<'_>, error: &anyhow::Error) -> ExitStatus {
    tracing::error!(error = ?error, "Unclassified failure");
    let args = vec![error.to_string(), format!("{:?}", error)];
    if reporter
        .report(&Diagnostic::new(Severity::Error, "err.crash", args.clone()))
        .is_err()
    {
        reporter.report_raw("err.crash", &args);
    }
    ExitStatus::Abnormal
}
