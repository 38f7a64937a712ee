use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_TARGET: &str = "ufto_discovery";

/// Console verbosity selected by `-q` / `-v` flags. Variants are ordered from
/// least to most output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn to_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    fn filter_directive(self) -> String {
        format!("{LOG_TARGET}={}", self.to_level())
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbosity`.
/// Logs go to stderr so stdout stays reserved for the JSON result.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= Verbosity::Trace)
        .with_file(verbosity >= Verbosity::Debug)
        .with_line_number(verbosity >= Verbosity::Debug)
        .compact();

    match verbosity {
        Verbosity::Quiet => subscriber.with_writer(std::io::sink).init(),
        Verbosity::Normal => subscriber.without_time().init(),
        _ => subscriber.init(),
    }
}
