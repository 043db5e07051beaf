//! Coordination rule operations: list, execute, preview.

use clap::{Args, Subcommand};
use docsync_core::value::FieldValue;
use docsync_core_types::RequestContext;
use docsync_engine::audit::TracingAuditSink;
use docsync_engine::commands::coordination::{
    active_rules, execute_coordination, log_for_rule, preview_cascade,
};
use docsync_engine::EngineConfig;

#[derive(Debug, Args)]
pub struct CascadeArgs {
    #[command(subcommand)]
    pub command: CascadeCommand,
}

#[derive(Debug, Subcommand)]
pub enum CascadeCommand {
    /// List active rules for a tenant, newest first
    Rules(RulesArgs),
    /// Execute a rule against its current targets
    Execute(ExecuteArgs),
    /// Preview what a rule would change for a hypothetical value
    Preview(PreviewArgs),
    /// Show the execution log for a rule
    Log(LogArgs),
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    pub rule_id: String,
    pub trigger_document_id: String,

    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = "cli-user")]
    pub user: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    pub rule_id: String,
    /// Hypothetical source value, parsed as JSON (bare text falls back to a
    /// string value)
    pub value: String,

    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    pub rule_id: String,

    #[arg(long)]
    pub company: String,

    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,
}

pub fn execute(args: CascadeArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        CascadeCommand::Rules(rules_args) => execute_rules(rules_args),
        CascadeCommand::Execute(execute_args) => execute_execute(execute_args),
        CascadeCommand::Preview(preview_args) => execute_preview(preview_args),
        CascadeCommand::Log(log_args) => execute_log(log_args),
    }
}

fn execute_rules(args: RulesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let rules = active_rules(&conn, &args.company)?;

    if rules.is_empty() {
        println!("No active rules for company '{}'", args.company);
        return Ok(());
    }
    for rule in rules {
        println!(
            "{}  {} {}.{} -> {}.{}  {}",
            rule.id,
            rule.transform_type,
            rule.source_doc_type,
            rule.source_field_path,
            rule.target_doc_type,
            rule.target_field_path,
            rule.description.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

fn execute_execute(args: ExecuteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let ctx = RequestContext::new(args.user, args.company.clone());

    let outcome = execute_coordination(
        &conn,
        &args.rule_id,
        &args.trigger_document_id,
        &args.company,
        &ctx,
        &TracingAuditSink,
        &EngineConfig::from_env(),
    )?;

    println!(
        "{}: {} document(s) affected (log {})",
        outcome.status.as_str(),
        outcome.affected_documents.len(),
        outcome.log_id,
    );
    for change in &outcome.changes_applied {
        let old = change
            .old_value
            .as_ref()
            .map(FieldValue::render)
            .unwrap_or_else(|| "undefined".to_string());
        println!(
            "  {} {}: {} -> {}",
            change.document_id,
            change.field_path,
            old,
            change.new_value.render(),
        );
    }
    Ok(())
}

fn execute_preview(args: PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;

    let value = serde_json::from_str::<serde_json::Value>(&args.value)
        .map(|v| FieldValue::from_json(&v))
        .unwrap_or_else(|_| FieldValue::Text(args.value.clone()));

    let items = preview_cascade(&conn, &args.rule_id, &args.company, &value)?;
    if items.is_empty() {
        println!("No documents would change");
        return Ok(());
    }
    for item in items {
        let current = item
            .current_value
            .as_ref()
            .map(FieldValue::render)
            .unwrap_or_else(|| "undefined".to_string());
        println!(
            "{} ({}) {}: {} -> {}",
            item.document_id,
            item.document_title,
            item.target_field_path,
            current,
            item.new_value.render(),
        );
    }
    Ok(())
}

fn execute_log(args: LogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let entries = log_for_rule(&conn, &args.rule_id, &args.company)?;

    if entries.is_empty() {
        println!("No executions recorded for rule {}", args.rule_id);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{} {:<7} trigger={} affected={} {}",
            entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
            entry.status.as_str(),
            entry.trigger_document_id,
            entry.affected_documents.len(),
            entry.error_message.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}
