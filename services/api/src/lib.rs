mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use agenda_sisreg::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
