//! Import job commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::importer::{ImportDriver, ImportEngine};
use crate::models::SourceFormat;

use super::helpers::truncate;

/// Import users from a roster file, driving batches until the job completes.
pub async fn cmd_import_run(
    settings: &Settings,
    file: &Path,
    format: Option<SourceFormat>,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let engine = ImportEngine::new(ctx)
        .with_batch_size(batch_size.unwrap_or(settings.batch_size))
        .with_record_delay(settings.record_delay());

    ImportDriver::new(&engine).run(file, format).await?;

    Ok(())
}

/// Show progress for a single import job.
pub async fn cmd_import_status(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let engine = ImportEngine::new(settings.create_db_context());
    let job = engine.job(id).await?;

    println!("\n{}", style(format!("Import #{}", job.id)).bold());
    println!("{}", "-".repeat(40));
    println!("  File:      {}", job.file_name);
    println!("  Format:    {}", job.format.as_str());
    println!(
        "  Progress:  {}/{} rows ({}%)",
        job.processed_rows,
        job.total_rows,
        job.percentage()
    );
    if job.skipped_rows > 0 {
        println!("  Skipped:   {}", style(job.skipped_rows).yellow());
    }
    println!("  Status:    {}", style(job.status.as_str()).cyan());
    println!("  Started:   {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}

/// List recent import jobs, newest first.
pub async fn cmd_import_history(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let jobs = ctx.jobs().history(limit).await?;

    if jobs.is_empty() {
        println!("{} No imports recorded yet.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Import History").bold());
    println!("{}", "-".repeat(76));
    println!(
        "{:<5} {:<28} {:<7} {:>11} {:>8} {:<10}",
        "ID", "File", "Format", "Processed", "Skipped", "Status"
    );
    println!("{}", "-".repeat(76));

    for job in jobs {
        println!(
            "{:<5} {:<28} {:<7} {:>11} {:>8} {:<10}",
            job.id,
            truncate(&job.file_name, 27),
            job.format.as_str(),
            format!("{}/{}", job.processed_rows, job.total_rows),
            job.skipped_rows,
            job.status.as_str()
        );
    }

    Ok(())
}
