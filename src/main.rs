use clap::Parser;
use walter::cli::{run_cli, Cli};
use walter::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = &cli.log_level {
        log_config.log_level = level.clone();
    }
    init_logging_with_config(&log_config)?;

    let stdout = std::io::stdout();
    run_cli(cli, &mut stdout.lock())
}
