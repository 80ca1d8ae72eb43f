// rkjm - robotkernel jitter measurement packaging and measurement tool
// Main CLI entry point

use clap::Parser;
use rkjm::cli::{Cli, CliDispatcher};
use rkjm::utils::error::UserError;
use rkjm::utils::logging;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match CliDispatcher::execute(cli.command).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(err) => {
            let user_error = UserError::from_rkjm_error(&err);
            user_error.print();
            process::exit(user_error.exit_code);
        }
    }
}
