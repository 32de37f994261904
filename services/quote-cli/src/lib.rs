mod cli;
mod demo;
mod infra;
mod report;

use lease_quote::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
