use crate::domain::model::{ImportReport, ImportSource};
use crate::domain::ports::ImportPipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives one import run: fetch, parse, commit.
pub struct ImportEngine<P: ImportPipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: ImportPipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self, source: &ImportSource) -> Result<ImportReport> {
        tracing::info!("Importing cards from {source}");

        let raw = self.pipeline.fetch(source).await?;
        tracing::info!("Fetched {} bytes", raw.len());
        self.monitor.log_stats("fetch");

        let batch = self.pipeline.parse(raw).await?;
        tracing::info!(
            "Parsed {} cards ({} row errors)",
            batch.records.len(),
            batch.errors.len()
        );
        self.monitor.log_stats("parse");

        let report = self.pipeline.commit(batch).await?;
        tracing::info!(
            "Catalog updated: {} created, {} updated, {} skipped",
            report.created,
            report.updated,
            report.skipped
        );
        self.monitor.log_stats("commit");
        self.monitor.log_final_stats();

        Ok(report)
    }
}
