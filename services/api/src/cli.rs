use crate::regions::{run_regions, RegionsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use client_map::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Client Map",
    about = "Serve the client map or inspect the configured client list",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Fetch the client list and print how many clients each region holds
    Regions(RegionsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Regions(args) => run_regions(args).await,
    }
}
