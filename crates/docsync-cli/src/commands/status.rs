//! Artifact sync status overview.

use clap::Args;
use docsync_engine::commands::sync::artifact_statuses;

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

pub fn execute(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let statuses = artifact_statuses(&conn, &args.company)?;

    if statuses.is_empty() {
        println!("No documents for company '{}'", args.company);
        return Ok(());
    }

    for status in statuses {
        let version = status
            .latest_version_number
            .map(|n| format!("v{}", n))
            .unwrap_or_else(|| "-".to_string());
        let editor = status.last_edited_by.as_deref().unwrap_or("-");
        let source = status
            .edit_source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<18} {:<9} {:<5} {:>7} words  last edit: {} via {}",
            status.document_id,
            status.volume_name,
            status.sync_status,
            version,
            status.word_count,
            editor,
            source,
        );
    }
    Ok(())
}
