//! Console logging shared by the generator drivers.

use log::{LevelFilter, SetLoggerError};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

/// Environment variable selecting the log level (`error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_LEVEL_ENV: &str = "ONNX_CODEGEN_LOG";

const APPENDER: &str = "stderr";

/// Route the `log` records of the generators to stderr, so build scripts keep stdout for cargo
/// directives. Panics are logged before the previous hook runs.
///
/// Fails when a logger is already installed; drivers ignore that case.
pub fn init_log() -> Result<(), SetLoggerError> {
    let level = parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{h({l})} {M}] {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build(APPENDER, Box::new(stderr)))
        .build(Root::builder().appender(APPENDER).build(level))
        .unwrap_or_else(|err| panic!("Invalid logger configuration: {err}"));

    log4rs::init_config(config)?;
    log_panics();

    Ok(())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn log_panics() {
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {info}");
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_from_the_environment_value() {
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("loud")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }
}
