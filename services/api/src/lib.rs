mod cli;
mod infra;
mod regions;
mod routes;
mod server;

use client_map::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
