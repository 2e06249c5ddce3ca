use clap::Parser;

mod app;
mod commands;
mod error;
mod logging;

use commands::cli;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    let exit = match app::run_app(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("dbbackup: {e}");
            e.exit_code()
        }
    };
    std::process::exit(exit);
}
