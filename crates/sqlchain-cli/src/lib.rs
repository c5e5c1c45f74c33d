mod cli;
mod exec;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    match cli::parse_args(&args)? {
        cli::Command::Help => {
            cli::print_help();
            Ok(())
        }
        cli::Command::Run(args) => exec::run(args),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
