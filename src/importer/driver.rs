//! In-process import driver with progress display.

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{JobStatus, SourceFormat};

use super::{BatchOutcome, ImportEngine};

/// Drives an import from registration to completion, batch by batch,
/// the same way a remote client polling the API would.
pub struct ImportDriver<'a> {
    engine: &'a ImportEngine,
}

impl<'a> ImportDriver<'a> {
    pub fn new(engine: &'a ImportEngine) -> Self {
        Self { engine }
    }

    pub async fn run(
        &self,
        path: &Path,
        format: Option<SourceFormat>,
    ) -> anyhow::Result<BatchOutcome> {
        println!(
            "\n{} Importing from {}",
            style("→").cyan(),
            path.display()
        );

        let receipt = self.engine.start_import_as(path, None, format).await?;
        println!(
            "  {} Job #{} registered: {} ({} rows)",
            style("→").cyan(),
            receipt.import_id,
            receipt.file_name,
            receipt.total_rows
        );

        let pb = self.create_progress_bar(receipt.total_rows);

        let mut offset = 0;
        let outcome = loop {
            let outcome = self
                .engine
                .process_batch(receipt.import_id, offset)
                .await?;

            pb.set_position(outcome.processed.max(0) as u64);
            pb.set_message(format!("{}%", outcome.percentage));

            if outcome.status == JobStatus::Completed {
                break outcome;
            }
            if outcome.processed <= offset {
                // The file stopped yielding rows short of the recorded
                // total, likely truncated since the job was created.
                pb.finish_and_clear();
                anyhow::bail!(
                    "import #{} stalled at row {} of {}",
                    receipt.import_id,
                    outcome.processed,
                    outcome.total_rows
                );
            }
            offset = outcome.processed;
        };

        pb.finish_and_clear();
        self.print_summary(receipt.import_id).await?;

        Ok(outcome)
    }

    fn create_progress_bar(&self, total_rows: i32) -> ProgressBar {
        let pb = if total_rows > 0 {
            ProgressBar::new(total_rows as u64)
        } else {
            ProgressBar::new_spinner()
        };

        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("█▓░"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    async fn print_summary(&self, import_id: i32) -> anyhow::Result<()> {
        let job = self.engine.job(import_id).await?;

        println!("\n{} Import complete:", style("✓").green());
        println!("  Rows processed: {}", style(job.processed_rows).green());
        if job.skipped_rows > 0 {
            println!("  Rows skipped:   {}", style(job.skipped_rows).yellow());
        }
        println!("  Total rows:     {}", style(job.total_rows).dim());
        println!("  Status:         {}", style(job.status.as_str()).cyan());

        Ok(())
    }
}
