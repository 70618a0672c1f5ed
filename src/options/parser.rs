//! Argument scanner: raw args to a validated [`TaskConfig`].

use std::slice::Iter;

use crate::error::TaskError;
use crate::options::config::TaskConfig;
use crate::options::registry::OptionDef;
use crate::search::SearchPathProvider;

/// Scan `args` against the registry, then validate the combination.
///
/// Tokens the registry does not know are offered to the search-path
/// provider. The first token not starting with `-` and everything after it
/// are class names. An empty argument list is an implicit help request.
pub fn parse_args(
    args: &[String],
    registry: &[OptionDef],
    provider: &mut dyn SearchPathProvider,
) -> Result<TaskConfig, TaskError> {
    let mut config = TaskConfig::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg.starts_with('-') {
            let halt = handle_option(arg, &mut iter, registry, provider, &mut config)?;
            if halt {
                tracing::debug!(option = %arg, "Ignoring remaining arguments");
                break;
            }
        } else {
            config.classes.push(arg.clone());
            config.classes.extend(iter.by_ref().cloned());
        }
    }

    let access = config.access_tokens();
    if access.len() > 1 {
        return Err(TaskError::bad_args(
            "err.incompatible.options",
            vec![access.join(" ")],
        ));
    }

    if args.is_empty() {
        config.help = true;
    } else if config.classes.is_empty() && !config.wants_help_or_version() {
        return Err(TaskError::bad_args("err.no.classes.specified", vec![]));
    }

    Ok(config)
}

/// Handle one option token. Returns whether parsing should stop.
fn handle_option(
    name: &str,
    rest: &mut Iter<'_, String>,
    registry: &[OptionDef],
    provider: &mut dyn SearchPathProvider,
    config: &mut TaskConfig,
) -> Result<bool, TaskError> {
    if let Some(option) = registry.iter().find(|o| o.matches(name)) {
        let argument = if option.takes_argument {
            let value = rest.next().ok_or_else(|| {
                TaskError::bad_args("err.missing.arg", vec![name.to_string()]).with_usage()
            })?;
            Some(value.as_str())
        } else {
            None
        };
        option.apply(config, name, argument)?;
        tracing::trace!(option = %name, argument = ?argument, "Applied option");
        return Ok(option.halts_further_parsing);
    }

    match provider.handle_option(name, rest) {
        Ok(true) => Ok(false),
        Ok(false) => {
            Err(TaskError::bad_args("err.unknown.option", vec![name.to_string()]).with_usage())
        }
        Err(e) => {
            tracing::debug!(option = %name, error = %e, "Search path rejected option");
            Err(TaskError::bad_args("err.invalid.use.of.option", vec![name.to_string()])
                .with_usage())
        }
    }
}
