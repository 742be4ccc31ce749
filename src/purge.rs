//! Bulk deletion of recently uploaded images
//!
//! A one-shot batch job: list every image on the account, keep the ones
//! uploaded inside the recent window, wait for the operator to confirm,
//! then delete them one by one. A failed delete is counted and the job moves
//! on to the next image; nothing is retried or rolled back. Re-running the
//! job starts over from a fresh listing.

use crate::images::ImageHostService;
use crate::models::RemoteAsset;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use std::io::{BufRead, Write};
use tracing::{error, info};

/// Images uploaded within this many days are selected for deletion.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Listing filtered down to the images that will be deleted.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    pub cutoff: DateTime<Utc>,
    pub total_listed: usize,
    pub targets: Vec<RemoteAsset>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub total_listed: usize,
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Assets uploaded strictly after `cutoff`, in listing order. Assets with no
/// usable upload time are never selected.
pub fn select_recent(assets: Vec<RemoteAsset>, cutoff: DateTime<Utc>) -> Vec<RemoteAsset> {
    assets
        .into_iter()
        .filter(|asset| asset.uploaded.is_some_and(|uploaded| uploaded > cutoff))
        .collect()
}

/// Block until one line (possibly empty) or EOF arrives on `input`.
///
/// There is no "no" answer: interrupting the process is the only way out.
pub fn wait_for_confirmation<R: BufRead>(input: &mut R) -> Result<()> {
    // Raw bytes: the answer is never parsed, so it need not be UTF-8.
    input.read_until(b'\n', &mut Vec::new())?;
    Ok(())
}

pub struct BulkDeleter<'a> {
    service: &'a dyn ImageHostService,
    window: Duration,
}

impl<'a> BulkDeleter<'a> {
    pub fn new(service: &'a dyn ImageHostService) -> Self {
        Self {
            service,
            window: Duration::days(RECENT_WINDOW_DAYS),
        }
    }

    /// List the account and keep images newer than `now - window`.
    /// A listing failure is returned as-is; nothing has been deleted yet.
    pub async fn plan(&self, now: DateTime<Utc>) -> Result<DeletionPlan> {
        let cutoff = now - self.window;
        let assets = self.service.list_images().await?;
        let total_listed = assets.len();
        let targets = select_recent(assets, cutoff);

        info!(
            "{} of {} image(s) uploaded after {}",
            targets.len(),
            total_listed,
            cutoff.to_rfc3339()
        );

        Ok(DeletionPlan {
            cutoff,
            total_listed,
            targets,
        })
    }

    /// Delete every target sequentially, counting failures instead of
    /// stopping on them.
    pub async fn execute<W: Write>(
        &self,
        plan: &DeletionPlan,
        out: &mut W,
    ) -> Result<DeleteSummary> {
        let mut summary = DeleteSummary {
            total_listed: plan.total_listed,
            matched: plan.targets.len(),
            ..DeleteSummary::default()
        };

        for asset in &plan.targets {
            match self.service.delete_image(&asset.id).await {
                Ok(()) => {
                    summary.deleted += 1;
                    writeln!(
                        out,
                        "Deleted: {} ({})",
                        asset.id,
                        asset.filename.as_deref().unwrap_or("N/A")
                    )?;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Failed to delete {}: {}", asset.id, e);
                    writeln!(out, "Failed: {} - {}", asset.id, e)?;
                }
            }
        }

        Ok(summary)
    }

    /// Full job: plan, show the targets, wait for confirmation on `input`,
    /// delete, and print the summary to `out`.
    pub async fn run<R: BufRead, W: Write>(
        &self,
        now: DateTime<Utc>,
        input: &mut R,
        out: &mut W,
    ) -> Result<DeleteSummary> {
        let plan = self.plan(now).await?;

        writeln!(out, "Cutoff date: {}", plan.cutoff.to_rfc3339())?;
        writeln!(out, "Total images in account: {}", plan.total_listed)?;

        if plan.targets.is_empty() {
            writeln!(
                out,
                "No images found from the last {} days",
                self.window.num_days()
            )?;
            return Ok(DeleteSummary {
                total_listed: plan.total_listed,
                ..DeleteSummary::default()
            });
        }

        for line in format_plan_lines(&plan) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "WARNING: This action cannot be undone!")?;
        writeln!(out, "Press Ctrl+C to cancel, or press Enter to continue...")?;
        out.flush()?;

        wait_for_confirmation(input)?;

        let summary = self.execute(&plan, out).await?;
        for line in format_summary_lines(&summary) {
            writeln!(out, "{}", line)?;
        }
        Ok(summary)
    }
}

pub fn format_plan_lines(plan: &DeletionPlan) -> Vec<String> {
    let mut lines = vec![format!("Found {} image(s) to delete:", plan.targets.len())];

    for (index, asset) in plan.targets.iter().enumerate() {
        lines.push(format!("{}. ID: {}", index + 1, asset.id));
        lines.push(format!(
            "   Uploaded: {}",
            asset
                .uploaded
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "N/A".to_string())
        ));
        lines.push(format!(
            "   Filename: {}",
            asset.filename.as_deref().unwrap_or("N/A")
        ));
        if let Some(original) = asset.original_name() {
            lines.push(format!("   Original: {}", original));
        }
    }

    lines
}

pub fn format_summary_lines(summary: &DeleteSummary) -> Vec<String> {
    vec![
        "Summary:".to_string(),
        format!("   Total listed: {}", summary.total_listed),
        format!("   Matched cutoff: {}", summary.matched),
        format!("   Successfully deleted: {}", summary.deleted),
        format!("   Failed: {}", summary.failed),
    ]
}
