//! Logging configuration.

use clap::{ArgAction, Args};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Filter derived from the command line. `RUST_LOG` wins over `-v` unless `--quiet` is set.
pub fn env_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }
    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level))
}

/// Install the global subscriber. Logs go to stderr so JSON on stdout stays clean.
pub fn init_logging(args: &LogArgs) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(args))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
