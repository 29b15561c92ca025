mod allocation;
mod classrooms;
mod config;
mod data;
mod error;
mod gateway;
mod grid;
mod render;
mod server;
mod solver;
mod store;
mod timing;

use clap::Parser;
use config::{Cli, Command};
use data::TimetableRequest;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Command::Serve(args) => server::run_server(&args).await,
        Command::Render(args) => {
            let raw = std::fs::read_to_string(&args.input)?;
            let request: TimetableRequest = serde_json::from_str(&raw)?;
            let output = solver::solve(&request, None);
            print!("{}", render::render_text(&output));
            Ok(())
        }
    }
}
