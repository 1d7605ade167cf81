//! Shared pieces of the floodwatch command-line tools.
use anyhow::Result;
use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// `--log-level` values. Anything else is rejected by clap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays JSON.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Args {
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
        log_level: LogLevel,
    }

    #[test]
    fn parses_known_levels_case_insensitively() {
        let args = Args::try_parse_from(["tool", "--log-level", "debug"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Debug);
        let args = Args::try_parse_from(["tool", "-l", "WARN"]).unwrap();
        assert_eq!(Level::from(args.log_level), Level::WARN);
        let args = Args::try_parse_from(["tool"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Info);
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(Args::try_parse_from(["tool", "--log-level", "verbose"]).is_err());
        assert!(Args::try_parse_from(["tool", "--log-level", "inf"]).is_err());
    }
}
