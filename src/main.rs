use clap::Parser;
use inspect_debugger::cli::Cli;
use inspect_debugger::repl::Inspector;
use inspect_debugger::DebuggerConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if cli.version {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::from(3);
    }

    let mut config = DebuggerConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    let target = match cli.into_target() {
        Ok(target) => target,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    match Inspector::new(config, target).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_startup() => {
            eprintln!("{}", err);
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!(
                "There was an internal error in inspect-debugger. Please report this bug."
            );
            eprintln!("{}", err);
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
