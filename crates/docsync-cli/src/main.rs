//! docsync CLI
//!
//! Command-line interface for the document sync and coordination engine

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "docsync")]
#[command(about = "Document synchronization and cross-document coordination", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed a demo workspace (documents plus a coordination rule)
    Seed(commands::seed::SeedArgs),
    /// Version history and diffs
    History(commands::history::HistoryArgs),
    /// Artifact sync status overview
    Status(commands::status::StatusArgs),
    /// Coordination rules: list, execute, preview
    Cascade(commands::cascade::CascadeArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    docsync_core::logging::init(docsync_core::logging::Profile::Development);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Seed(args) => commands::seed::execute(args),
        Commands::History(args) => commands::history::execute(args),
        Commands::Status(args) => commands::status::execute(args),
        Commands::Cascade(args) => commands::cascade::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
