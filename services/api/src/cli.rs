use crate::commands::{run_portals, run_resolve, run_transform, ResolveArgs, TransformArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fieldmap::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Portal Field Mapper",
    about = "Resolve and apply admission-portal field mappings from the command line",
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
    /// List the portals covered by the builtin registry
    Portals,
    /// Resolve one domain through registry, cache and model, printing the mapping as JSON
    Resolve(ResolveArgs),
    /// Apply a named transform to a single value
    Transform(TransformArgs),
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
        Command::Portals => run_portals(),
        Command::Resolve(args) => run_resolve(args).await,
        Command::Transform(args) => run_transform(args),
    }
}
