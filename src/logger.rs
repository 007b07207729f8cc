//! Methods specific to the asmstitch logger
//!

use camino::Utf8Path;

use crate::globals::PROGRAM_NAME;

/// Setup the default logger to write to stderr, and optionally to a log file
///
/// Log output is never written to stdout, which may be carrying the consensus sequence.
///
/// # Arguments
/// * `log_file` - If given, log messages are also appended to this file
/// * `debug` - If true use debug log level, and info level otherwise
///
pub fn setup_logger(log_file: Option<&Utf8Path>, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    let logger = if let Some(log_file) = log_file {
        logger.chain(fern::log_file(log_file)?)
    } else {
        logger
    };

    logger.apply()?;
    Ok(())
}
