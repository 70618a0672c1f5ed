use std::io::{self, BufWriter};
use std::process::ExitCode;

use jadis::classfile::ClassFileDisassembler;
use jadis::config::{Config, ConfigError};
use jadis::diagnostics::{Locale, MessageCatalog};
use jadis::error::ExitStatus;
use jadis::logging::init_tracing;
use jadis::search::FileSystemSearchPath;
use jadis::task::TaskDriver;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            eprintln!("{}: {:#}", env!("CARGO_PKG_NAME"), e);
            let status = if e.downcast_ref::<ConfigError>().is_some() {
                ExitStatus::CmdErr
            } else {
                ExitStatus::Abnormal
            };
            ExitCode::from(status.code())
        }
    }
}

fn run() -> anyhow::Result<ExitStatus> {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let config = Config::load()?;
    let catalog = MessageCatalog::builtin().map_err(|e| anyhow::anyhow!("{}", e))?;
    let locale = config
        .defaults
        .locale
        .as_deref()
        .map(Locale::new)
        .unwrap_or_else(Locale::from_env);
    tracing::debug!(%locale, args = ?args, "Starting");

    let provider = FileSystemSearchPath::from_config(&config.search);
    let mut driver = TaskDriver::new(
        Box::new(provider),
        Box::new(ClassFileDisassembler::new()),
        catalog,
    )
    .with_locale(locale)
    .with_url_timeout(config.url_timeout());

    let mut out = BufWriter::new(io::stdout().lock());
    let mut err = io::stderr().lock();
    Ok(driver.run(&args, &mut out, &mut err))
}
