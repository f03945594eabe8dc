mod cli;
mod infra;
mod report;
mod routes;
mod server;

use pps_analytics::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
