use clap::Parser;
use nsgate_cli::Commands;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nsgate")]
#[command(about = "Evaluate namespaced authorization decisions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = nsgate_utils::init_with_default(&cli.log) {
        eprintln!("nsgate: unable to initialize logging: {e}");
    }

    match cli.command.execute().await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("nsgate: {e:#}");
            ExitCode::from(2)
        }
    }
}
