//! Logging setup: env_logger, bridged through indicatif on a TTY

use indicatif::MultiProgress;

/// Padded label and ANSI color for a log level
fn level_style(level: log::Level) -> (&'static str, &'static str) {
    match level {
        log::Level::Error => ("ERROR", "\x1b[31m"),
        log::Level::Warn => ("WARN ", "\x1b[33m"),
        log::Level::Info => ("INFO ", "\x1b[32m"),
        log::Level::Debug => ("DEBUG", "\x1b[36m"),
        log::Level::Trace => ("TRACE", "\x1b[35m"),
    }
}

/// Default filter when `RUST_LOG` is unset.
///
/// HTTP internals stay at `warn` even in debug mode; the fetcher logs its own GETs.
pub fn default_filter(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug,hyper=warn,hyper_util=warn,reqwest=warn"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Logger that prints above the progress spinner instead of through it
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.matches(record) {
            return;
        }
        let (label, ansi) = level_style(record.level());
        let line = format!("[{ansi}{label}\x1b[0m] {}", record.args());
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging.
///
/// With `multi` (TTY), records go through [`IndicatifLogger`]; otherwise plain
/// `[LEVEL] message` lines without color, suitable for log capture.
pub fn init_logging(
    quiet: bool,
    debug: bool,
    multi: Option<&MultiProgress>,
) -> Result<(), log::SetLoggerError> {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(default_filter(quiet, debug));

    match multi {
        Some(multi) => {
            let logger = env_logger::Builder::from_env(env).build();
            let max_level = logger.filter();
            log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone())))?;
            log::set_max_level(max_level);
            Ok(())
        }
        None => env_logger::Builder::from_env(env)
            .format(|buf, record| {
                let (label, _) = level_style(record.level());
                writeln!(buf, "[{label}] {}", record.args())
            })
            .try_init(),
    }
}
