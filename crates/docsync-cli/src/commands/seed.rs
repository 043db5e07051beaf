//! Seed a demo workspace: two documents and one format rule wired between
//! them, ready for `cascade execute`.

use chrono::Utc;
use clap::Args;
use docsync_core::model::{CoordinationRule, Document, DocumentSource};
use docsync_core::transform::TransformKind;
use docsync_core::value::Snapshot;
use docsync_core_types::RequestContext;
use docsync_engine::audit::TracingAuditSink;
use docsync_engine::commands::rules::create_rule;
use docsync_engine::commands::version::append_version;
use docsync_store::documents;

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[arg(long, default_value = ".docsync/store.db")]
    pub db: String,

    /// Tenant to seed into
    #[arg(long, default_value = "demo-co")]
    pub company: String,
}

pub fn execute(args: SeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let conn = super::open_store(&args.db)?;
    let ctx = RequestContext::new("demo-user", args.company.clone());

    let cover = Document {
        id: "doc-cover-letter".to_string(),
        company_id: args.company.clone(),
        doc_type: "cover_letter".to_string(),
        title: "Cover Letter".to_string(),
        created_at: Utc::now(),
    };
    let summary = Document {
        id: "doc-cost-summary".to_string(),
        company_id: args.company.clone(),
        doc_type: "cost_summary".to_string(),
        title: "Cost Summary".to_string(),
        created_at: Utc::now(),
    };
    documents::insert_document(&conn, &cover)?;
    documents::insert_document(&conn, &summary)?;

    append_version(
        &conn,
        &cover.id,
        &args.company,
        DocumentSource::Native,
        Snapshot::from_json_str(
            r#"{"doc_type": "cover_letter", "title": "Cover Letter",
                "contract": {"value": 500000},
                "body": "We are pleased to submit our proposal."}"#,
        )?,
        &ctx,
    )?;
    append_version(
        &conn,
        &summary.id,
        &args.company,
        DocumentSource::Native,
        Snapshot::from_json_str(
            r#"{"doc_type": "cost_summary", "title": "Cost Summary",
                "summary": {"total": "$0"}}"#,
        )?,
        &ctx,
    )?;

    let rule = CoordinationRule {
        id: uuid::Uuid::now_v7().to_string(),
        company_id: args.company.clone(),
        source_doc_type: "cover_letter".to_string(),
        source_field_path: "contract.value".to_string(),
        target_doc_type: "cost_summary".to_string(),
        target_field_path: "summary.total".to_string(),
        transform_type: TransformKind::Format,
        description: Some("Contract value drives the cost summary total".to_string()),
        is_active: true,
        created_at: Utc::now(),
    };
    create_rule(&conn, &rule, &ctx, &TracingAuditSink)?;

    println!("Seeded company '{}':", args.company);
    println!("  {} (cover_letter, contract.value = 500000)", cover.id);
    println!("  {} (cost_summary, summary.total = \"$0\")", summary.id);
    println!("  rule {} (format contract.value -> summary.total)", rule.id);

    Ok(())
}
