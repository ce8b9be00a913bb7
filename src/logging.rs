use env_logger::{Builder, Env};
use log::LevelFilter;

/// Environment variable that, if set, overrides the verbosity given via command line.
const LOG_ENV_VAR: &str = "KLAG_LOG";

/// Initializes logging, at the level that corresponds to the given `verbosity_level`.
///
/// * `<= -2` = 'OFF'
/// * `-1`    = 'ERROR'
/// * `0`     = 'WARN'
/// * `1`     = 'INFO'
/// * `2`     = 'DEBUG'
/// * `>= 3`  = 'TRACE'
pub fn init(verbosity_level: i8) {
    Builder::new()
        .filter_level(verbosity_to_level_filter(verbosity_level))
        .parse_env(Env::new().filter(LOG_ENV_VAR))
        .init();
}

fn verbosity_to_level_filter(verbosity_level: i8) -> LevelFilter {
    match verbosity_level {
        i8::MIN..=-2 => LevelFilter::Off,
        -1 => LevelFilter::Error,
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        3..=i8::MAX => LevelFilter::Trace,
    }
}
