use backtrace::Backtrace;
use log::{Level, LevelFilter};

use crate::paths::log_file_path;

/// The environment variable which turns on logging. Its value is the level.
pub const LOG_ENV: &str = "COMPLINE_LOG";

fn parse_level(value: &str) -> LevelFilter {
    match value.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the file logger if `$COMPLINE_LOG` is set. stdout belongs to
/// the shell, so nothing is logged otherwise.
pub fn install_logger_from_env(name: &str) -> Result<bool, failure::Error> {
    match std::env::var(LOG_ENV) {
        Ok(value) => {
            install_logger(name, parse_level(&value))?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Logs into `~/.compline/log/<name>.log`.
pub fn install_logger(name: &str, level: LevelFilter) -> Result<(), failure::Error> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}] {}{}\x1b[0m",
                match record.level() {
                    Level::Error => "\x1b[1;31m",
                    Level::Warn => "\x1b[1;33m",
                    _ => "\x1b[34m",
                },
                record.file().unwrap_or_else(|| record.target()),
                record.line().unwrap_or(0),
                match record.level() {
                    Level::Error => "\x1b[1;31m",
                    Level::Warn => "\x1b[1;33m",
                    _ => "\x1b[0m",
                },
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(log_file_path(name)?)?)
        .apply()?;

    std::panic::set_hook(Box::new(|info| {
        error!("{}", info);
        prettify_backtrace(Backtrace::new());
    }));

    Ok(())
}

/// Keeps panics off the terminal when no log file is configured.
pub fn install_quiet_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        debug!("{}", info);
    }));
}

pub fn prettify_backtrace(backtrace: Backtrace) {
    for (i, frame) in backtrace.frames().iter().enumerate() {
        for symbol in frame.symbols() {
            if let Some(path) = symbol.filename() {
                let filename = path.to_str().unwrap_or("(non-utf8 path)");
                if filename.contains("/.rustup/")
                    || filename.contains("/.cargo/")
                    || filename.starts_with("/rustc/")
                {
                    continue;
                }

                error!(
                    "    #{} {}:{}, col {}",
                    i,
                    filename,
                    symbol.lineno().unwrap_or(0),
                    symbol.colno().unwrap_or(0),
                );
            }
        }
    }
}
