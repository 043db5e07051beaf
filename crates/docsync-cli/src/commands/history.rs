//! Version history and diff inspection.

use clap::{Args, Subcommand};
use docsync_engine::commands::version::{version_diff, version_history};
use docsync_engine::EngineConfig;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List a document's versions, newest first
    List(ListArgs),
    /// Show a structured diff between two version ids
    Diff(DiffArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    pub document_id: String,

    #[arg(long)]
    pub company: String,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub version_a: String,
    pub version_b: String,

    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

pub fn execute(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        HistoryCommand::List(list_args) => execute_list(list_args),
        HistoryCommand::Diff(diff_args) => execute_diff(diff_args),
    }
}

fn execute_list(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let limit = args
        .limit
        .unwrap_or(EngineConfig::from_env().history_limit);

    let versions = version_history(&conn, &args.document_id, &args.company, limit)?;
    if versions.is_empty() {
        println!("No versions for {}", args.document_id);
        return Ok(());
    }

    for version in versions {
        let summary = match &version.diff_summary {
            Some(s) => format!("+{} -{} ~{}", s.additions, s.deletions, s.modifications),
            None => "initial".to_string(),
        };
        println!(
            "v{:<4} {}  [{}]  {}  {}",
            version.version_number,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.source,
            summary,
            version.id,
        );
    }
    Ok(())
}

fn execute_diff(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let diff = version_diff(&conn, &args.version_a, &args.version_b, &args.company)?;

    for block in &diff.additions {
        println!("+ {}: {}", block.path, block.content);
    }
    for block in &diff.deletions {
        println!("- {}: {}", block.path, block.content);
    }
    for block in &diff.modifications {
        match (block.line_start, block.line_end) {
            (Some(start), Some(end)) => {
                println!("~ {} (lines {}-{}): {}", block.path, start, end, block.content)
            }
            _ => println!("~ {}: {}", block.path, block.content),
        }
    }
    println!("{} unchanged", diff.unchanged);
    Ok(())
}
