use clap::Parser;
use routetrie::cli::{run_cli, Cli, Outcome};
use routetrie::logging::{init_logging_with_config, LogConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    log_config.log_level.clone_from(&cli.log_level);
    // Short-lived process: write synchronously so nothing is lost on exit.
    log_config.async_logging = false;
    if let Err(e) = init_logging_with_config(&log_config) {
        eprintln!("warning: {e:#}");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run_cli(cli, &mut out) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::NoMatch) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
