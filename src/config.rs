use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Weekly class timetable builder with a demo REST server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Build a timetable from a JSON request file and print it as text.
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Remote generation service consulted for an alternate subject list.
    #[arg(long)]
    pub gateway_url: Option<String>,

    #[arg(long, default_value_t = 5000)]
    pub gateway_timeout_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Path to a generation request in JSON.
    pub input: PathBuf,
}
