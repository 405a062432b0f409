use crate::commands::{
    run_catalog, run_dashboard, run_escalas, run_login, run_logout, run_sync, run_vagas,
    CatalogCommand, DashboardArgs, EscalasCommand, LoginArgs, SyncArgs, VagasArgs,
};
use crate::server;
use agenda_sisreg::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Agenda SISREG",
    about = "Record unit schedules, sync them with the SISREG spreadsheet and inspect offer dashboards",
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
    /// Count the slots a weekly schedule offers over its validity window
    Vagas(VagasArgs),
    /// Log in to a unit using its CNES as password
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Manage locally saved schedule drafts
    Escalas {
        #[command(subcommand)]
        command: EscalasCommand,
    },
    /// Refresh the local cache from the spreadsheet
    Sync(SyncArgs),
    /// Summarize cached schedules as KPIs, series and insights
    Dashboard(DashboardArgs),
    /// Search the unit, professional and procedure reference data
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
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
        Command::Vagas(args) => run_vagas(args),
        Command::Login(args) => run_login(args),
        Command::Logout => run_logout(),
        Command::Escalas { command } => run_escalas(command).await,
        Command::Sync(args) => run_sync(args).await,
        Command::Dashboard(args) => run_dashboard(args),
        Command::Catalog { command } => run_catalog(command),
    }
}
