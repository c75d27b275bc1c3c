mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use carrot_interpreter::PrintHandler;
use clap::Parser;

use runner::Action;

#[derive(Parser)]
#[command(author, version, about = "Runs a carrot script")]
struct Cli {
    /// Script to run.
    path: PathBuf,
    /// Print the token stream and exit.
    #[arg(long, conflicts_with = "dump_ast")]
    dump_tokens: bool,
    /// Print the parsed tree and exit.
    #[arg(long)]
    dump_ast: bool,
    /// Log filter, e.g. `debug` or `carrot_interpreter=trace`. Overrides RUST_LOG.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        None => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let action = if cli.dump_tokens {
        Action::DumpTokens
    } else if cli.dump_ast {
        Action::DumpAst
    } else {
        Action::Run
    };

    let result = runner::read_source(&cli.path)
        .and_then(|source| runner::execute(&source, action, PrintHandler::stdout()));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "run failed");
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}
